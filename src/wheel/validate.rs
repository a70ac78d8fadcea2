//! Segment list validation and normalization.
//!
//! Shape problems (bad count, unknown mode) reject the request with the
//! full error list; per-field problems (empty text, bad color) never do.
//! A field defect is corrected in place (placeholder text, palette
//! color), so a valid wheel always comes out of valid shape input.

use std::sync::Arc;

use super::sanitize;
use crate::incidents::{IncidentKind, IncidentRecorder};
use crate::types::{CanonicalWheel, RawSegment, Segment, WheelMode, DEFAULT_PALETTE};

/// Bounds applied by the validator.
#[derive(Debug, Clone, Copy)]
pub struct WheelLimits {
    pub min_segments: usize,
    pub max_segments: usize,
    pub max_text_length: usize,
}

impl Default for WheelLimits {
    fn default() -> Self {
        Self {
            min_segments: 2,
            max_segments: 20,
            max_text_length: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("number of segments must be between {min} and {max}")]
    InvalidCount { min: usize, max: usize },
    #[error("invalid wheel mode '{0}'")]
    InvalidMode(String),
    #[error("no segments could be processed")]
    EmptyList,
    #[error("segment {0} text cannot be empty")]
    TextRequired(usize),
    #[error("segment {0} color is required")]
    ColorRequired(usize),
}

/// `#RRGGBB`, hex digits case-insensitive.
pub fn is_valid_hex_color(color: &str) -> bool {
    let Some(rest) = color.strip_prefix('#') else {
        return false;
    };
    rest.len() == 6 && rest.chars().all(|c| c.is_ascii_hexdigit())
}

fn placeholder_text(position: usize) -> String {
    format!("Option {}", position + 1)
}

fn palette_color(position: usize) -> String {
    DEFAULT_PALETTE[position % DEFAULT_PALETTE.len()].to_string()
}

pub struct SegmentValidator {
    limits: WheelLimits,
    incidents: Arc<IncidentRecorder>,
}

impl SegmentValidator {
    pub fn new(limits: WheelLimits, incidents: Arc<IncidentRecorder>) -> Self {
        Self { limits, incidents }
    }

    pub fn limits(&self) -> WheelLimits {
        self.limits
    }

    /// Validate raw client input into a canonical wheel.
    ///
    /// `raw_count` must parse to an integer within the configured bounds.
    /// `raw_mode` defaults to `normal` when absent. Entries beyond
    /// `raw_count` are ignored; missing entries are treated as empty and
    /// filled with placeholders.
    pub fn validate(
        &self,
        raw_count: Option<&str>,
        raw_mode: Option<&str>,
        entries: &[RawSegment],
    ) -> Result<CanonicalWheel, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let count = raw_count
            .and_then(|c| c.trim().parse::<i64>().ok())
            .filter(|&c| {
                c >= self.limits.min_segments as i64 && c <= self.limits.max_segments as i64
            })
            .map(|c| c as usize);
        if count.is_none() {
            errors.push(ValidationError::InvalidCount {
                min: self.limits.min_segments,
                max: self.limits.max_segments,
            });
        }

        let mode = match raw_mode.map(str::trim).filter(|m| !m.is_empty()) {
            None => Some(WheelMode::Normal),
            Some(raw) => match raw.parse::<WheelMode>() {
                Ok(mode) => Some(mode),
                Err(()) => {
                    errors.push(ValidationError::InvalidMode(raw.to_string()));
                    None
                }
            },
        };

        let (Some(count), Some(mode)) = (count, mode) else {
            return Err(errors);
        };

        let mut segments: Vec<Segment> = (0..count)
            .map(|i| self.build_segment(i, entries.get(i)))
            .collect();

        // Length invariant: exactly `count` segments, padded with
        // placeholders if the entry loop ever comes up short.
        while segments.len() < count {
            let i = segments.len();
            segments.push(Segment {
                id: i,
                text: placeholder_text(i),
                color: palette_color(i),
                active: true,
            });
        }
        segments.truncate(count);

        if segments.is_empty() {
            errors.push(ValidationError::EmptyList);
        }
        for segment in &segments {
            if segment.text.is_empty() {
                errors.push(ValidationError::TextRequired(segment.id + 1));
            }
            if segment.color.is_empty() {
                errors.push(ValidationError::ColorRequired(segment.id + 1));
            }
        }
        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(CanonicalWheel { mode, segments })
    }

    fn build_segment(&self, position: usize, raw: Option<&RawSegment>) -> Segment {
        let raw_text = raw.map(|r| r.text.trim()).unwrap_or("");
        let text = if raw_text.is_empty() {
            placeholder_text(position)
        } else {
            let mut clean = sanitize::sanitize_text(raw_text, &self.incidents);
            if clean.chars().count() > self.limits.max_text_length {
                clean = clean.chars().take(self.limits.max_text_length).collect();
            }
            if clean.is_empty() {
                placeholder_text(position)
            } else {
                clean
            }
        };

        let raw_color = raw.map(|r| r.color.trim()).unwrap_or("");
        let color = if is_valid_hex_color(raw_color) {
            raw_color.to_string()
        } else {
            if !raw_color.is_empty() {
                let shown: String = raw_color.chars().take(32).collect();
                self.incidents.record(IncidentKind::InvalidColor, shown);
            }
            palette_color(position)
        };

        Segment {
            id: position,
            text,
            color,
            active: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> SegmentValidator {
        SegmentValidator::new(WheelLimits::default(), Arc::new(IncidentRecorder::default()))
    }

    fn validator_with_log() -> (SegmentValidator, Arc<IncidentRecorder>) {
        let incidents = Arc::new(IncidentRecorder::default());
        let validator = SegmentValidator::new(WheelLimits::default(), incidents.clone());
        (validator, incidents)
    }

    fn raw(text: &str, color: &str) -> RawSegment {
        RawSegment {
            text: text.to_string(),
            color: color.to_string(),
        }
    }

    #[test]
    fn test_count_invariant_over_full_range() {
        let validator = validator();
        for count in 2..=20usize {
            let wheel = validator
                .validate(Some(&count.to_string()), Some("normal"), &[])
                .unwrap();
            assert_eq!(wheel.segments.len(), count);
        }
    }

    #[test]
    fn test_rejects_count_out_of_bounds() {
        let validator = validator();
        for bad in ["1", "21", "0", "-3"] {
            let errors = validator.validate(Some(bad), Some("normal"), &[]).unwrap_err();
            assert_eq!(
                errors,
                vec![ValidationError::InvalidCount { min: 2, max: 20 }]
            );
        }
    }

    #[test]
    fn test_rejects_unparseable_count() {
        let validator = validator();
        for bad in [None, Some("abc"), Some("2.5"), Some("")] {
            let errors = validator.validate(bad, Some("normal"), &[]).unwrap_err();
            assert_eq!(
                errors,
                vec![ValidationError::InvalidCount { min: 2, max: 20 }]
            );
        }
    }

    #[test]
    fn test_rejects_unknown_mode() {
        let validator = validator();
        let errors = validator
            .validate(Some("4"), Some("battle-royale"), &[])
            .unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::InvalidMode("battle-royale".to_string())]
        );
    }

    #[test]
    fn test_collects_count_and_mode_errors_in_order() {
        let validator = validator();
        let errors = validator.validate(Some("99"), Some("chaos"), &[]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::InvalidCount { .. }));
        assert!(matches!(errors[1], ValidationError::InvalidMode(_)));
    }

    #[test]
    fn test_mode_defaults_to_normal_when_absent() {
        let validator = validator();
        assert_eq!(
            validator.validate(Some("2"), None, &[]).unwrap().mode,
            WheelMode::Normal
        );
        assert_eq!(
            validator.validate(Some("2"), Some("  "), &[]).unwrap().mode,
            WheelMode::Normal
        );
        assert_eq!(
            validator
                .validate(Some("2"), Some("elimination"), &[])
                .unwrap()
                .mode,
            WheelMode::Elimination
        );
    }

    #[test]
    fn test_placeholder_substitution_and_palette_fallback() {
        let validator = validator();
        let entries = [raw("", "#FF0000"), raw("  ", "#00FF00"), raw("Go", "")];
        let wheel = validator
            .validate(Some("3"), Some("normal"), &entries)
            .unwrap();

        let texts: Vec<_> = wheel.segments.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, vec!["Option 1", "Option 2", "Go"]);

        assert_eq!(wheel.segments[0].color, "#FF0000");
        assert_eq!(wheel.segments[1].color, "#00FF00");
        assert_eq!(wheel.segments[2].color, DEFAULT_PALETTE[2]);
    }

    #[test]
    fn test_pads_missing_entries_with_placeholders() {
        let validator = validator();
        let wheel = validator
            .validate(Some("5"), Some("normal"), &[raw("Coffee", "#FF6B6B")])
            .unwrap();

        assert_eq!(wheel.segments.len(), 5);
        assert_eq!(wheel.segments[0].text, "Coffee");
        for (i, segment) in wheel.segments.iter().enumerate().skip(1) {
            assert_eq!(segment.text, format!("Option {}", i + 1));
            assert_eq!(segment.color, DEFAULT_PALETTE[i]);
        }
    }

    #[test]
    fn test_ignores_entries_beyond_count() {
        let validator = validator();
        let entries = [
            raw("a", "#111111"),
            raw("b", "#222222"),
            raw("c", "#333333"),
        ];
        let wheel = validator
            .validate(Some("2"), Some("normal"), &entries)
            .unwrap();
        assert_eq!(wheel.segments.len(), 2);
    }

    #[test]
    fn test_every_output_color_is_valid_hex() {
        let validator = validator();
        let entries = [
            raw("a", "red"),
            raw("b", "#12345"),
            raw("c", "#1234567"),
            raw("d", "#GGGGGG"),
            raw("e", "#abcdef"),
            raw("f", "#ABCDEF"),
        ];
        let wheel = validator
            .validate(Some("8"), Some("normal"), &entries)
            .unwrap();
        for segment in &wheel.segments {
            assert!(
                is_valid_hex_color(&segment.color),
                "bad color {:?}",
                segment.color
            );
        }
        assert_eq!(wheel.segments[4].color, "#abcdef");
        assert_eq!(wheel.segments[5].color, "#ABCDEF");
    }

    #[test]
    fn test_invalid_color_records_incident_absent_does_not() {
        let (validator, incidents) = validator_with_log();
        validator
            .validate(Some("2"), Some("normal"), &[raw("a", "mauve"), raw("b", "")])
            .unwrap();

        let entries = incidents.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, IncidentKind::InvalidColor);
        assert_eq!(entries[0].detail, "mauve");
    }

    #[test]
    fn test_truncates_text_to_limit() {
        let validator = validator();
        let long = "x".repeat(80);
        let wheel = validator
            .validate(Some("2"), Some("normal"), &[raw(&long, "#FF6B6B")])
            .unwrap();
        assert_eq!(wheel.segments[0].text.chars().count(), 50);
    }

    #[test]
    fn test_sanitizes_injection_and_records_incident() {
        let (validator, incidents) = validator_with_log();
        let entries = [raw("<script>alert(1)</script>Hi", "#FFFFFF"), raw("B", "")];
        let wheel = validator
            .validate(Some("2"), Some("normal"), &entries)
            .unwrap();

        assert!(!wheel.segments[0].text.to_lowercase().contains("<script"));
        assert_eq!(wheel.segments[0].text, "Hi");
        assert_eq!(incidents.total(), 1);
        assert_eq!(incidents.snapshot()[0].kind, IncidentKind::XssAttempt);
        assert_eq!(incidents.snapshot()[0].detail, "script_tag");
    }

    #[test]
    fn test_text_that_sanitizes_to_nothing_gets_placeholder() {
        let validator = validator();
        let wheel = validator
            .validate(
                Some("2"),
                Some("normal"),
                &[raw("<script>alert(1)</script>", "#FF6B6B")],
            )
            .unwrap();
        assert_eq!(wheel.segments[0].text, "Option 1");
    }

    #[test]
    fn test_ids_match_positions_and_segments_start_active() {
        let validator = validator();
        let wheel = validator.validate(Some("4"), Some("elimination"), &[]).unwrap();
        for (i, segment) in wheel.segments.iter().enumerate() {
            assert_eq!(segment.id, i);
            assert!(segment.active);
        }
    }

    #[test]
    fn test_custom_limits_are_honored() {
        let limits = WheelLimits {
            min_segments: 3,
            max_segments: 5,
            max_text_length: 4,
        };
        let validator = SegmentValidator::new(limits, Arc::new(IncidentRecorder::default()));

        assert!(validator.validate(Some("2"), Some("normal"), &[]).is_err());
        let wheel = validator
            .validate(Some("3"), Some("normal"), &[raw("abcdefgh", "#FF6B6B")])
            .unwrap();
        assert_eq!(wheel.segments[0].text, "abcd");
    }

    #[test]
    fn test_is_valid_hex_color() {
        assert!(is_valid_hex_color("#FF6B6B"));
        assert!(is_valid_hex_color("#abcdef"));
        assert!(is_valid_hex_color("#AbCd09"));
        assert!(!is_valid_hex_color("FF6B6B"));
        assert!(!is_valid_hex_color("#FF6B6"));
        assert!(!is_valid_hex_color("#FF6B6B7"));
        assert!(!is_valid_hex_color("#GG6B6B"));
        assert!(!is_valid_hex_color(""));
        assert!(!is_valid_hex_color("#"));
    }
}
