//! The time-inhomogeneous HMM map matcher.

use std::rc::Rc;

use log::debug;
use mm_core::{CandidatePoint, Path, PointData, STPoint, Trajectory};
use mm_network::{NetworkError, RoadNetwork, RoutingWeight, find_shortest_path};
use rustc_hash::FxHashMap;

use crate::candidates::get_candidates;
use crate::error::MatchResult;
use crate::hmm::probabilities::HmmProbabilities;
use crate::hmm::viterbi::{RoadPath, SequenceState, ViterbiDecoder};
use crate::route::construct_path;

// ── TimeStep ──────────────────────────────────────────────────────────────────

/// Everything the decoder needs for one observation: the candidate set, the
/// emission probabilities, and (from the second step on) the transition
/// probabilities and their road paths.
pub struct TimeStep {
    pub observation: STPoint,
    pub candidates: Vec<CandidatePoint>,
    pub emission_log_p: FxHashMap<CandidatePoint, f64>,
    pub transition_log_p: FxHashMap<(CandidatePoint, CandidatePoint), f64>,
    pub road_paths: FxHashMap<(CandidatePoint, CandidatePoint), Rc<RoadPath>>,
}

impl TimeStep {
    /// `candidates` must be non-empty.
    pub fn new(observation: STPoint, candidates: Vec<CandidatePoint>) -> Self {
        debug_assert!(!candidates.is_empty());
        Self {
            observation,
            candidates,
            emission_log_p: FxHashMap::default(),
            transition_log_p: FxHashMap::default(),
            road_paths: FxHashMap::default(),
        }
    }

    pub fn add_emission_log_p(&mut self, candidate: CandidatePoint, log_p: f64) {
        let replaced = self.emission_log_p.insert(candidate, log_p);
        debug_assert!(replaced.is_none(), "candidate added twice");
    }

    pub fn add_transition_log_p(&mut self, from: CandidatePoint, to: CandidatePoint, log_p: f64) {
        let replaced = self.transition_log_p.insert((from, to), log_p);
        debug_assert!(replaced.is_none(), "transition added twice");
    }

    pub fn add_road_path(&mut self, from: CandidatePoint, to: CandidatePoint, path: RoadPath) {
        let replaced = self.road_paths.insert((from, to), Rc::new(path));
        debug_assert!(replaced.is_none(), "road path added twice");
    }
}

// ── Configuration ─────────────────────────────────────────────────────────────

/// Tuning knobs of the matcher.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MatcherConfig {
    /// GPS noise standard deviation in meters (emission spread).
    pub measurement_error_sigma: f64,
    /// Route-vs-straight-line deviation scale in meters (transition decay).
    pub transition_probability_beta: f64,
    /// Candidate lookup radius in meters; defaults to the sigma.
    pub candidate_search_radius: f64,
    /// Per-edge attribute the router minimizes.
    pub routing_weight: RoutingWeight,
    /// Smallest number of entities a reconstructed path must have to be
    /// emitted.  The traditional value of 3 drops degenerate one/two-edge
    /// fragments.
    pub min_path_entities: usize,
    /// Keep every committed Viterbi message (debugging aid).
    pub keep_message_history: bool,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            measurement_error_sigma: 50.0,
            transition_probability_beta: 2.0,
            candidate_search_radius: 50.0,
            routing_weight: RoutingWeight::Length,
            min_path_entities: 3,
            keep_message_history: false,
        }
    }
}

impl MatcherConfig {
    /// A config with the given sigma, the search radius following it, and
    /// everything else at defaults.
    pub fn with_sigma(sigma: f64) -> Self {
        Self {
            measurement_error_sigma: sigma,
            candidate_search_radius: sigma,
            ..Self::default()
        }
    }
}

// ── MapMatcher ────────────────────────────────────────────────────────────────

/// A map-matching algorithm: trajectory in, matched trajectory (or timed
/// paths) out.
///
/// Implementations must be `Sync`-shareable for batch matching; the network
/// is read-only during matching.
pub trait MapMatcher {
    /// Match every point of `traj` to a road candidate (or `None` for gaps).
    ///
    /// The output trajectory has the same oid, tid, point count, timestamps,
    /// and raw coordinates; each point carries
    /// [`PointData::candi_pt`](mm_core::PointData).
    fn match_trajectory(&self, traj: &Trajectory) -> MatchResult<Trajectory>;

    /// Match and reconstruct timed edge paths (several when the trace has
    /// gaps or breaks).
    fn match_to_paths(&self, traj: &Trajectory) -> MatchResult<Vec<Path>>;
}

/// HMM matcher over a time-inhomogeneous Viterbi lattice.
pub struct TiHmmMatcher<'a> {
    rn: &'a RoadNetwork,
    config: MatcherConfig,
    probabilities: HmmProbabilities,
}

impl<'a> TiHmmMatcher<'a> {
    pub fn new(rn: &'a RoadNetwork) -> Self {
        Self::with_config(rn, MatcherConfig::default())
    }

    pub fn with_config(rn: &'a RoadNetwork, config: MatcherConfig) -> Self {
        Self {
            rn,
            config,
            probabilities: HmmProbabilities::new(
                config.measurement_error_sigma,
                config.transition_probability_beta,
            ),
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    fn new_decoder(&self) -> ViterbiDecoder {
        if self.config.keep_message_history {
            ViterbiDecoder::with_message_history()
        } else {
            ViterbiDecoder::new()
        }
    }

    fn create_time_step(&self, pt: &STPoint) -> Option<TimeStep> {
        get_candidates(pt, self.rn, self.config.candidate_search_radius)
            .map(|candidates| TimeStep::new(pt.clone(), candidates))
    }

    fn compute_emission_log_p(&self, time_step: &mut TimeStep) {
        for candidate in time_step.candidates.clone() {
            time_step
                .add_emission_log_p(candidate, self.probabilities.emission_log_p(candidate.error));
        }
    }

    /// Fill transitions from every previous candidate to every current one.
    /// Pairs without a route get no transition at all (−∞ to the decoder).
    fn compute_transition_log_p(
        &self,
        prev_time_step: &TimeStep,
        time_step: &mut TimeStep,
    ) -> MatchResult<()> {
        let linear_dist = prev_time_step
            .observation
            .point()
            .distance_m(time_step.observation.point());
        let cur_candidates = time_step.candidates.clone();
        for prev_candidate in &prev_time_step.candidates {
            for cur_candidate in &cur_candidates {
                match find_shortest_path(
                    self.rn,
                    prev_candidate,
                    cur_candidate,
                    self.config.routing_weight,
                ) {
                    Ok(route) => {
                        time_step.add_road_path(*prev_candidate, *cur_candidate, route.vertices);
                        time_step.add_transition_log_p(
                            *prev_candidate,
                            *cur_candidate,
                            self.probabilities.transition_log_p(route.cost, linear_dist),
                        );
                    }
                    Err(NetworkError::NoPath { .. }) => {}
                    Err(e) => return Err(e.into()),
                }
            }
        }
        Ok(())
    }

    /// Run the decoder over the whole point list, restarting on gaps and
    /// HMM breaks, and return one [`SequenceState`] per input point.
    fn compute_viterbi_sequence(&self, pts: &[STPoint]) -> MatchResult<Vec<SequenceState>> {
        let mut seq: Vec<SequenceState> = Vec::with_capacity(pts.len());
        let mut viterbi = self.new_decoder();
        let mut prev_time_step: Option<TimeStep> = None;
        for pt in pts {
            match self.create_time_step(pt) {
                // No candidates: close the sequence ended at the previous
                // point, emit a gap, and start over at the next one.
                None => {
                    seq.extend(viterbi.compute_most_likely_sequence());
                    seq.push(SequenceState {
                        state: None,
                        observation: pt.clone(),
                        transition_descriptor: None,
                    });
                    viterbi = self.new_decoder();
                    prev_time_step = None;
                }
                Some(mut time_step) => {
                    self.compute_emission_log_p(&mut time_step);
                    match &prev_time_step {
                        None => viterbi.start_with_initial_observation(
                            &time_step.observation,
                            &time_step.candidates,
                            &time_step.emission_log_p,
                        )?,
                        Some(prev) => {
                            self.compute_transition_log_p(prev, &mut time_step)?;
                            viterbi.next_step(
                                &time_step.observation,
                                &time_step.candidates,
                                &time_step.emission_log_p,
                                &time_step.transition_log_p,
                                &time_step.road_paths,
                            )?;
                            if viterbi.is_broken() {
                                // Close the sequence ended at the previous
                                // point and restart at the current one.
                                debug!("HMM break at {}", time_step.observation);
                                seq.extend(viterbi.compute_most_likely_sequence());
                                viterbi = self.new_decoder();
                                viterbi.start_with_initial_observation(
                                    &time_step.observation,
                                    &time_step.candidates,
                                    &time_step.emission_log_p,
                                )?;
                            }
                        }
                    }
                    prev_time_step = Some(time_step);
                }
            }
        }
        if seq.len() < pts.len() {
            seq.extend(viterbi.compute_most_likely_sequence());
        }
        Ok(seq)
    }
}

impl MapMatcher for TiHmmMatcher<'_> {
    fn match_trajectory(&self, traj: &Trajectory) -> MatchResult<Trajectory> {
        traj.validate()?;
        let seq = self.compute_viterbi_sequence(&traj.pts)?;
        debug_assert_eq!(seq.len(), traj.pts.len());
        let matched_pts = seq
            .into_iter()
            .map(|ss| {
                STPoint::with_data(
                    ss.observation.lat,
                    ss.observation.lng,
                    ss.observation.time,
                    PointData {
                        candi_pt: ss.state,
                    },
                )
            })
            .collect();
        Ok(Trajectory::new(traj.oid.clone(), traj.tid.clone(), matched_pts))
    }

    fn match_to_paths(&self, traj: &Trajectory) -> MatchResult<Vec<Path>> {
        let matched = self.match_trajectory(traj)?;
        construct_path(
            self.rn,
            &matched,
            self.config.routing_weight,
            self.config.min_path_entities,
        )
    }
}
