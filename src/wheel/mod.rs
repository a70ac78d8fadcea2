//! The wheel core: segment validation, sanitization, and fair winner
//! selection. Everything here is pure and synchronous; the only side
//! effect is recording incidents through the injected recorder.

mod sanitize;
mod spin;
mod validate;

pub use sanitize::{detect_threats, sanitize_text, scrub};
pub use spin::{spin, SpinError, SpinOutcome};
pub use validate::{is_valid_hex_color, SegmentValidator, ValidationError, WheelLimits};
