//! Matching-subsystem error type.

use mm_core::{CandidatePoint, CoreError};
use mm_network::NetworkError;
use thiserror::Error;

/// Errors that abort matching of the current trajectory.
///
/// `NoPath`, missing candidates, and HMM breaks are *not* errors — they are
/// recovered inside the matcher and surface only as `None` states or extra
/// emitted paths.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Input invariants (empty trajectory, non-monotonic timestamps).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Every candidate of a time step must carry an emission probability.
    #[error("no emission probability for candidate {0}")]
    MissingEmission(CandidatePoint),

    #[error("initial probabilities have already been set")]
    DecoderAlreadyInitialized,

    #[error("start_with_initial_observation must be called first")]
    DecoderNotInitialized,

    #[error("decoder must not be stepped after an HMM break")]
    DecoderBroken,

    /// Network lookups that cannot be recovered (unknown edge ids, missing
    /// inner-path edges).
    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Shorthand result type for `mm-match`.
pub type MatchResult<T> = Result<T, MatchError>;
