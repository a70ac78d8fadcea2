//! Uniform winner selection over a canonical segment list.

use rand::Rng;
use serde::Serialize;

use crate::types::Segment;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpinError {
    #[error("no segments to spin")]
    EmptySegments,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SpinOutcome {
    pub winner_index: usize,
    pub winner: Segment,
}

/// Draw a winning segment uniformly at random.
///
/// The index comes from the thread-local CSPRNG, so outcomes are
/// unpredictable without access to the process's entropy; a statistical
/// generator is not acceptable here. Each spin is independent and
/// stateless. Indexes are clamped into range as a last resort.
pub fn spin(segments: &[Segment]) -> Result<SpinOutcome, SpinError> {
    if segments.is_empty() {
        return Err(SpinError::EmptySegments);
    }

    let mut rng = rand::rng();
    let winner_index = rng.random_range(0..segments.len()).min(segments.len() - 1);

    Ok(SpinOutcome {
        winner_index,
        winner: segments[winner_index].clone(),
    })
}
