use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fallback colors assigned to segments whose submitted color fails
/// validation. Indexed by segment position modulo the palette length.
pub const DEFAULT_PALETTE: [&str; 20] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8", "#F7DC6F",
    "#BB8FCE", "#85C1E9", "#F8C471", "#82E0AA", "#F1948A", "#D7BDE2", "#A3E4D7", "#F9E79F",
    "#D5A6BD", "#AED6F1", "#A9DFBF", "#FAD5A5",
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WheelMode {
    Normal,
    /// Segments are meant to be retired after winning. Only the `active`
    /// flag exists for this today; no segment is ever deactivated yet.
    Elimination,
}

impl FromStr for WheelMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(WheelMode::Normal),
            "elimination" => Ok(WheelMode::Elimination),
            _ => Err(()),
        }
    }
}

impl fmt::Display for WheelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WheelMode::Normal => write!(f, "normal"),
            WheelMode::Elimination => write!(f, "elimination"),
        }
    }
}

/// One labeled, colored slice of the wheel, as produced by the validator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Segment {
    /// Position index at creation time, stable for the list's lifetime.
    pub id: usize,
    pub text: String,
    /// `#RRGGBB`, always valid after validation.
    pub color: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// A segment as submitted by the client, before any validation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSegment {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub color: String,
}

/// A validated wheel: mode plus the canonical segment list.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CanonicalWheel {
    pub mode: WheelMode,
    pub segments: Vec<Segment>,
}
