//! Viterbi decoder for time-inhomogeneous Markov processes — the state sets
//! and transition probabilities may differ at every time step.
//!
//! For long observation sequences the back pointers usually converge to a
//! single path after a bounded number of steps: the last GPS positions of a
//! trace stop affecting the first road matches.  The decoder exploits that
//! by holding states in reference-counted chains — once the frontier of a
//! step is replaced, everything no longer reachable from it is freed, so
//! memory stays O(candidates · convergence depth) instead of O(trace).
//!
//! Determinism: ties in the maximum are won by the *first-seen* candidate,
//! so iteration always follows the caller-supplied candidate vectors
//! (insertion order), never map order.

use std::rc::Rc;

use mm_core::{CandidatePoint, STPoint};
use mm_network::VertexKey;
use rustc_hash::FxHashMap;

use crate::error::{MatchError, MatchResult};

/// The vertex sequence of the road path realizing a transition.
pub type RoadPath = Vec<VertexKey>;

// ── States ────────────────────────────────────────────────────────────────────

/// Back pointer to the previous state candidate in the most likely sequence.
///
/// Chains form trees (parents outlive children); sharing is what lets pruned
/// histories collapse as soon as the frontier drops them.
#[derive(Debug)]
struct ExtendedState {
    state: CandidatePoint,
    back_pointer: Option<Rc<ExtendedState>>,
    observation: STPoint,
    transition_descriptor: Option<Rc<RoadPath>>,
}

/// One step of the decoded output sequence.
#[derive(Clone, Debug)]
pub struct SequenceState {
    /// The chosen candidate, or `None` for an observation the matcher could
    /// not place (gap).
    pub state: Option<CandidatePoint>,
    pub observation: STPoint,
    /// The road path taken into this state, when the transition had one.
    pub transition_descriptor: Option<Rc<RoadPath>>,
}

/// Result of one forward step: the new message plus new back pointers.
struct ForwardStepResult {
    new_message: FxHashMap<CandidatePoint, f64>,
    new_extended_states: FxHashMap<CandidatePoint, Rc<ExtendedState>>,
}

// ── Decoder ───────────────────────────────────────────────────────────────────

/// Time-inhomogeneous Viterbi over per-step candidate sets.
///
/// Lifecycle: [`start_with_initial_observation`](Self::start_with_initial_observation)
/// once, then [`next_step`](Self::next_step) per observation until either the
/// trace ends or [`is_broken`](Self::is_broken) turns true;
/// [`compute_most_likely_sequence`](Self::compute_most_likely_sequence)
/// yields everything up to the last healthy step.
pub struct ViterbiDecoder {
    /// `message[s]` = max log p(s_1..s_t, o_1..o_t) over sequences ending in
    /// state `s` at the current step; `None` until initialized.  Working
    /// with the joint probability is sufficient for the argmax and cheaper
    /// than conditioning on the observations.
    message: Option<FxHashMap<CandidatePoint, f64>>,
    last_extended_states: FxHashMap<CandidatePoint, Rc<ExtendedState>>,
    /// Candidate set of the last committed step, in insertion order — the
    /// iteration order for maxima and tie-breaking.
    prev_candidates: Vec<CandidatePoint>,
    is_broken: bool,
    message_history: Option<Vec<FxHashMap<CandidatePoint, f64>>>,
}

impl Default for ViterbiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ViterbiDecoder {
    pub fn new() -> Self {
        Self {
            message: None,
            last_extended_states: FxHashMap::default(),
            prev_candidates: Vec::new(),
            is_broken: false,
            message_history: None,
        }
    }

    /// A decoder that records every committed message (debugging aid).
    pub fn with_message_history() -> Self {
        Self {
            message_history: Some(Vec::new()),
            ..Self::new()
        }
    }

    /// True once a step had no hypothesis with non-zero probability.  The
    /// decoder must then be replaced; the sequence up to the step before is
    /// still retrievable.
    #[inline]
    pub fn is_broken(&self) -> bool {
        self.is_broken
    }

    /// Committed messages so far, when history keeping is on.
    pub fn message_history(&self) -> Option<&[FxHashMap<CandidatePoint, f64>]> {
        self.message_history.as_deref()
    }

    /// Start the HMM at the first observation, using `initial_log_p`
    /// (normally the emission probabilities) as initial state probabilities.
    pub fn start_with_initial_observation(
        &mut self,
        observation: &STPoint,
        candidates: &[CandidatePoint],
        initial_log_p: &FxHashMap<CandidatePoint, f64>,
    ) -> MatchResult<()> {
        if self.message.is_some() {
            return Err(MatchError::DecoderAlreadyInitialized);
        }
        // Rebuild the map from the candidate vector so nothing depends on
        // the iteration order of the caller's map.
        let mut initial_message = FxHashMap::default();
        for candidate in candidates {
            let log_p = *initial_log_p
                .get(candidate)
                .ok_or(MatchError::MissingEmission(*candidate))?;
            initial_message.insert(*candidate, log_p);
        }
        self.is_broken = hmm_break(&initial_message);
        if self.is_broken {
            return Ok(());
        }
        if let Some(history) = &mut self.message_history {
            history.push(initial_message.clone());
        }
        self.message = Some(initial_message);
        self.last_extended_states = candidates
            .iter()
            .map(|&candidate| {
                (
                    candidate,
                    Rc::new(ExtendedState {
                        state: candidate,
                        back_pointer: None,
                        observation: observation.clone(),
                        transition_descriptor: None,
                    }),
                )
            })
            .collect();
        self.prev_candidates = candidates.to_vec();
        Ok(())
    }

    /// Advance by one observation.
    ///
    /// Transitions absent from `transition_log_p` contribute log probability
    /// −∞; a candidate without an entry in `emission_log_p` is an invariant
    /// violation.  If every new hypothesis is −∞ the decoder flags a break
    /// and keeps the previous message untouched.
    pub fn next_step(
        &mut self,
        observation: &STPoint,
        candidates: &[CandidatePoint],
        emission_log_p: &FxHashMap<CandidatePoint, f64>,
        transition_log_p: &FxHashMap<(CandidatePoint, CandidatePoint), f64>,
        transition_descriptors: &FxHashMap<(CandidatePoint, CandidatePoint), Rc<RoadPath>>,
    ) -> MatchResult<()> {
        let message = self.message.as_ref().ok_or(MatchError::DecoderNotInitialized)?;
        if self.is_broken {
            return Err(MatchError::DecoderBroken);
        }
        let result = self.forward_step(
            observation,
            candidates,
            message,
            emission_log_p,
            transition_log_p,
            transition_descriptors,
        )?;
        self.is_broken = hmm_break(&result.new_message);
        if self.is_broken {
            return Ok(());
        }
        if let Some(history) = &mut self.message_history {
            history.push(result.new_message.clone());
        }
        self.message = Some(result.new_message);
        self.last_extended_states = result.new_extended_states;
        self.prev_candidates = candidates.to_vec();
        Ok(())
    }

    fn forward_step(
        &self,
        observation: &STPoint,
        cur_candidates: &[CandidatePoint],
        message: &FxHashMap<CandidatePoint, f64>,
        emission_log_p: &FxHashMap<CandidatePoint, f64>,
        transition_log_p: &FxHashMap<(CandidatePoint, CandidatePoint), f64>,
        transition_descriptors: &FxHashMap<(CandidatePoint, CandidatePoint), Rc<RoadPath>>,
    ) -> MatchResult<ForwardStepResult> {
        debug_assert!(!self.prev_candidates.is_empty());
        let mut result = ForwardStepResult {
            new_message: FxHashMap::default(),
            new_extended_states: FxHashMap::default(),
        };

        for cur_state in cur_candidates {
            let mut max_log_p = f64::NEG_INFINITY;
            let mut max_prev_state: Option<&CandidatePoint> = None;
            for prev_state in &self.prev_candidates {
                let transition = transition_log_p
                    .get(&(*prev_state, *cur_state))
                    .copied()
                    .unwrap_or(f64::NEG_INFINITY);
                let log_p = message[prev_state] + transition;
                if log_p > max_log_p {
                    max_log_p = log_p;
                    max_prev_state = Some(prev_state);
                }
            }
            let emission = *emission_log_p
                .get(cur_state)
                .ok_or(MatchError::MissingEmission(*cur_state))?;
            result.new_message.insert(*cur_state, max_log_p + emission);

            // max_prev_state stays None when no transition has non-zero
            // probability; cur_state then cannot be part of the most likely
            // sequence and needs no back pointer.
            if let Some(prev_state) = max_prev_state {
                let extended = ExtendedState {
                    state: *cur_state,
                    back_pointer: Some(Rc::clone(&self.last_extended_states[prev_state])),
                    observation: observation.clone(),
                    transition_descriptor: transition_descriptors
                        .get(&(*prev_state, *cur_state))
                        .cloned(),
                };
                result
                    .new_extended_states
                    .insert(*cur_state, Rc::new(extended));
            }
        }
        Ok(result)
    }

    /// The most likely state sequence over all steps, initial observation
    /// included.  If the last step broke, the sequence up to the step before
    /// is returned; before initialization (or when the initial step broke)
    /// the sequence is empty.
    pub fn compute_most_likely_sequence(&self) -> Vec<SequenceState> {
        let Some(message) = &self.message else {
            return Vec::new();
        };
        let mut sequence = Vec::new();
        let mut extended = self
            .most_likely_state(message)
            .and_then(|state| self.last_extended_states.get(state));
        while let Some(es) = extended {
            sequence.push(SequenceState {
                state: Some(es.state),
                observation: es.observation.clone(),
                transition_descriptor: es.transition_descriptor.clone(),
            });
            extended = es.back_pointer.as_ref();
        }
        sequence.reverse();
        sequence
    }

    /// First candidate (in insertion order) with maximal message probability.
    fn most_likely_state(&self, message: &FxHashMap<CandidatePoint, f64>) -> Option<&CandidatePoint> {
        let mut best: Option<(&CandidatePoint, f64)> = None;
        for candidate in &self.prev_candidates {
            let log_p = message[candidate];
            if log_p > f64::NEG_INFINITY && best.is_none_or(|(_, b)| log_p > b) {
                best = Some((candidate, log_p));
            }
        }
        // A committed message always holds at least one finite entry,
        // otherwise a break would have occurred.
        debug_assert!(best.is_some());
        best.map(|(candidate, _)| candidate)
    }
}

/// A message breaks the HMM when it is empty or every hypothesis has zero
/// probability.
fn hmm_break(message: &FxHashMap<CandidatePoint, f64>) -> bool {
    !message.values().any(|&log_p| log_p != f64::NEG_INFINITY)
}
