//! `mm-match` — Hidden-Markov-Model map matching.
//!
//! Takes a raw GPS [`Trajectory`](mm_core::Trajectory) and a read-only
//! [`RoadNetwork`](mm_network::RoadNetwork), and produces the most likely
//! sequence of traversed edges (Newson & Krumm 2009), plus timed edge paths.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                 |
//! |----------------|----------------------------------------------------------|
//! | [`candidates`] | Per-observation candidate generation                     |
//! | [`hmm`]        | Emission/transition densities, time-inhomogeneous Viterbi |
//! | [`matcher`]    | `MapMatcher` trait, `TiHmmMatcher`, `MatcherConfig`      |
//! | [`route`]      | `construct_path` — timed edge paths from a matched trace |
//! | [`batch`]      | Batch matching over many trajectories                    |
//! | [`error`]      | `MatchError`, `MatchResult<T>`                           |
//!
//! # Recovery model
//!
//! Three conditions are recovered *inside* the matcher and are visible to
//! callers only in the output: an observation without candidates becomes a
//! gap (`None` state) and restarts the decoder; an unreachable transition is
//! dropped; a time step where every hypothesis dies (HMM break) closes the
//! current sequence and restarts at that step.  Everything else aborts the
//! current trajectory.
//!
//! # Feature flags
//!
//! | Flag       | Effect                                                    |
//! |------------|-----------------------------------------------------------|
//! | `parallel` | Rayon-parallel [`batch::match_batch`].                    |
//! | `serde`    | Derives `Serialize`/`Deserialize` on config/value types.  |

pub mod batch;
pub mod candidates;
pub mod error;
pub mod hmm;
pub mod matcher;
pub mod route;

#[cfg(test)]
mod tests;

pub use batch::match_batch;
pub use candidates::get_candidates;
pub use error::{MatchError, MatchResult};
pub use hmm::probabilities::HmmProbabilities;
pub use hmm::viterbi::{RoadPath, SequenceState, ViterbiDecoder};
pub use matcher::{MapMatcher, MatcherConfig, TiHmmMatcher, TimeStep};
pub use route::construct_path;
