//! Hidden-Markov-Model machinery: probability densities and the
//! time-inhomogeneous Viterbi decoder.

pub mod probabilities;
pub mod viterbi;
