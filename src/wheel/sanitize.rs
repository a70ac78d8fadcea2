//! Best-effort markup/script sanitization for segment labels.
//!
//! Three passes in a fixed order: denylisted patterns are stripped until
//! none remain, characters outside the allowlist are dropped, and any
//! angle brackets that survive are entity-escaped last. The output is
//! stable under re-sanitization.
//!
//! This is a filter for display text, not a parser; anything that needs
//! real HTML handling must not come through here.

use crate::incidents::{IncidentKind, IncidentRecorder};

/// Inputs longer than this are flagged by the threat scanner.
const MAX_SCAN_LENGTH: usize = 10_000;

/// SQL phrases flagged by [`detect_threats`]. Matching is done on
/// whitespace-normalized lowercase text.
const SQL_PATTERNS: &[(&str, &str)] = &[
    ("union select", "sql_union_select"),
    ("drop table", "sql_drop_table"),
    ("insert into", "sql_insert_into"),
    ("delete from", "sql_delete_from"),
    ("update set", "sql_update_set"),
];

/// Case-insensitive ASCII substring search starting at `from`.
///
/// A match of a pure-ASCII needle always begins and ends on UTF-8 char
/// boundaries, so the returned index is safe for `replace_range`.
fn find_ascii_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < from + n.len() {
        return None;
    }
    (from..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}

/// Remove `<script …>…</script>` blocks. An unterminated block is removed
/// through the end of the input.
fn strip_script_blocks(text: &mut String) -> bool {
    let mut stripped = false;
    while let Some(start) = find_ascii_ci(text, "<script", 0) {
        let end = match find_ascii_ci(text, "</script", start) {
            Some(close) => match text[close..].find('>') {
                Some(gt) => close + gt + 1,
                None => text.len(),
            },
            None => text.len(),
        };
        text.replace_range(start..end, "");
        stripped = true;
    }
    stripped
}

/// Locate an inline event-handler attribute: `on` + word chars + optional
/// whitespace + `=`. Returns the byte span including the `=`.
fn find_event_handler(text: &str, mut from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    while let Some(start) = find_ascii_ci(text, "on", from) {
        let mut i = start + 2;
        let name_start = i;
        while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
            i += 1;
        }
        if i > name_start {
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j < bytes.len() && bytes[j] == b'=' {
                return Some((start, j + 1));
            }
        }
        from = start + 1;
    }
    None
}

fn strip_event_handlers(text: &mut String) -> bool {
    let mut stripped = false;
    while let Some((start, end)) = find_event_handler(text, 0) {
        text.replace_range(start..end, "");
        stripped = true;
    }
    stripped
}

/// Locate `expression` + optional whitespace + `(` (CSS expression).
fn find_css_expression(text: &str, mut from: usize) -> Option<(usize, usize)> {
    let bytes = text.as_bytes();
    while let Some(start) = find_ascii_ci(text, "expression", from) {
        let mut i = start + "expression".len();
        while i < bytes.len() && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i < bytes.len() && bytes[i] == b'(' {
            return Some((start, i + 1));
        }
        from = start + 1;
    }
    None
}

fn strip_css_expressions(text: &mut String) -> bool {
    let mut stripped = false;
    while let Some((start, end)) = find_css_expression(text, 0) {
        text.replace_range(start..end, "");
        stripped = true;
    }
    stripped
}

fn strip_literal(text: &mut String, needle: &str) -> bool {
    let mut stripped = false;
    while let Some(start) = find_ascii_ci(text, needle, 0) {
        text.replace_range(start..start + needle.len(), "");
        stripped = true;
    }
    stripped
}

fn note(labels: &mut Vec<&'static str>, label: &'static str) {
    if !labels.contains(&label) {
        labels.push(label);
    }
}

/// Strip all denylisted patterns until a full pass removes nothing.
/// Stripping can splice two halves of a pattern back together, so a
/// single pass is not enough.
fn strip_denylist(text: &mut String) -> Vec<&'static str> {
    let mut matched = Vec::new();
    loop {
        let mut changed = false;
        if strip_script_blocks(text) {
            changed = true;
            note(&mut matched, "script_tag");
        }
        if strip_event_handlers(text) {
            changed = true;
            note(&mut matched, "event_handler");
        }
        if strip_literal(text, "javascript:") {
            changed = true;
            note(&mut matched, "javascript_uri");
        }
        if strip_literal(text, "vbscript:") {
            changed = true;
            note(&mut matched, "vbscript_uri");
        }
        if strip_literal(text, "data:text/html") {
            changed = true;
            note(&mut matched, "data_html_uri");
        }
        if strip_css_expressions(text) {
            changed = true;
            note(&mut matched, "css_expression");
        }
        if !changed {
            break;
        }
    }
    matched
}

/// Characters that may appear in a segment label. Angle brackets pass
/// through so the escape pass sees them; `&` and `;` keep previously
/// escaped entities intact across repeated sanitization.
fn is_allowed(c: char) -> bool {
    c.is_alphanumeric()
        || c.is_whitespace()
        || matches!(c, '-' | '_' | '.' | ',' | '!' | '?' | '<' | '>' | '&' | ';')
}

/// Sanitize without recording incidents. Returns the cleaned text plus
/// the labels of the denylist pattern classes that were stripped.
pub fn scrub(input: &str) -> (String, Vec<&'static str>) {
    let mut text = input.to_string();
    let matched = strip_denylist(&mut text);
    let filtered: String = text.chars().filter(|c| is_allowed(*c)).collect();
    let escaped = filtered.replace('<', "&lt;").replace('>', "&gt;");
    (escaped.trim().to_string(), matched)
}

/// Sanitize a segment label, recording one incident per denylist pattern
/// class that was actually stripped.
pub fn sanitize_text(input: &str, incidents: &IncidentRecorder) -> String {
    let (clean, matched) = scrub(input);
    for label in matched {
        incidents.record(IncidentKind::XssAttempt, label);
    }
    clean
}

/// Detection-only scan for request payloads that are never rendered but
/// should not carry attack patterns. Returns the matched labels without
/// modifying anything.
pub fn detect_threats(input: &str) -> Vec<&'static str> {
    let mut probe = input.to_string();
    let mut labels = strip_denylist(&mut probe);

    let normalized = input
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    for (needle, label) in SQL_PATTERNS {
        if normalized.contains(needle) {
            note(&mut labels, label);
        }
    }
    let squashed: String = normalized.chars().filter(|c| !c.is_whitespace()).collect();
    if squashed.contains("exec(") {
        note(&mut labels, "sql_exec");
    }

    if input.len() > MAX_SCAN_LENGTH {
        note(&mut labels, "oversized_input");
    }
    labels
}
