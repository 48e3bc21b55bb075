//! Synthetic upload progress.
//!
//! The media store reports nothing until the transfer is done, so the upload
//! controller fakes a ramp: random steps that never pass [`PROGRESS_CEILING`]
//! while the call is outstanding. None of these numbers measure bytes. If a
//! store ever exposes real transfer progress, feed that in instead and drop
//! this module.

use rand::Rng;

/// Highest value the estimate reaches before the upload resolves.
pub const PROGRESS_CEILING: u8 = 90;

/// Bounds of a single synthetic step, in percent.
pub const STEP_RANGE: std::ops::RangeInclusive<u8> = 5..=15;

/// Next synthetic progress value after a step of `step` percent.
pub fn estimate_progress(current: u8, step: u8) -> u8 {
    current.saturating_add(step).min(PROGRESS_CEILING)
}

/// A random step within [`STEP_RANGE`].
pub fn random_step() -> u8 {
    rand::rng().random_range(STEP_RANGE)
}
