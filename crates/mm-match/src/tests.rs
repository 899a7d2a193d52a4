//! Unit tests for mm-match.
//!
//! Networks are hand-crafted.  East-west edges run along the equator, where
//! 0.001 degrees of longitude ≈ 111.195 m; meter-exact edges run along the
//! prime meridian using `LAT_PER_METER` (haversine degenerates to an exact
//! arc length there).

#[cfg(test)]
mod helpers {
    use chrono::{TimeZone, Utc};
    use mm_core::{
        CandidatePoint, EdgeId, LAT_PER_METER, PointData, SPoint, STPoint, Timestamp, Trajectory,
        tid_for,
    };
    use mm_network::RoadNetwork;

    /// Meters per 0.001 degrees at the equator.
    pub const DEG_001_M: f64 = 111.195;

    pub fn ts(secs: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2008, 2, 2, 12, 0, 0).unwrap() + chrono::Duration::seconds(secs)
    }

    pub fn pt(lat: f64, lng: f64, secs: i64) -> STPoint {
        STPoint::new(lat, lng, ts(secs))
    }

    pub fn traj(oid: &str, pts: Vec<STPoint>) -> Trajectory {
        let tid = tid_for(oid, &pts);
        Trajectory::new(oid, tid, pts)
    }

    /// Latitude of the point `m` meters north of the equator.
    pub fn lat_m(m: f64) -> f64 {
        m * LAT_PER_METER
    }

    /// A matched point with a hand-attached candidate.
    pub fn matched_pt(candi: CandidatePoint, secs: i64) -> STPoint {
        STPoint::with_data(
            candi.lat,
            candi.lng,
            ts(secs),
            PointData {
                candi_pt: Some(candi),
            },
        )
    }

    /// Single directed edge 1: (0,0) → (0,0.001), ≈111 m.
    pub fn single_edge() -> RoadNetwork {
        let mut rn = RoadNetwork::directed();
        rn.add_edge(EdgeId(1), vec![SPoint::new(0.0, 0.0), SPoint::new(0.0, 0.001)])
            .unwrap();
        rn
    }

    /// Five directed edges chained along the equator, lng 0 → 0.005.
    pub fn chain5() -> RoadNetwork {
        let mut rn = RoadNetwork::directed();
        for i in 0..5u32 {
            let from = i as f64 * 0.001;
            rn.add_edge(
                EdgeId(i + 1),
                vec![SPoint::new(0.0, from), SPoint::new(0.0, from + 0.001)],
            )
            .unwrap();
        }
        rn
    }

    /// Y junction: edge 1 east to the fork, edges 2/3 diverging northeast
    /// and southeast.
    pub fn y_network() -> RoadNetwork {
        let mut rn = RoadNetwork::directed();
        rn.add_edge(EdgeId(1), vec![SPoint::new(0.0, 0.0), SPoint::new(0.0, 0.001)])
            .unwrap();
        rn.add_edge(
            EdgeId(2),
            vec![SPoint::new(0.0, 0.001), SPoint::new(0.0005, 0.002)],
        )
        .unwrap();
        rn.add_edge(
            EdgeId(3),
            vec![SPoint::new(0.0, 0.001), SPoint::new(-0.0005, 0.002)],
        )
        .unwrap();
        rn
    }

    /// Meter-exact meridian chain for time-interpolation tests:
    ///
    ///   e1: 0–100 m, e2: 100–200 m, e3: 200–400 m, e4: 400–500 m,
    ///   e5: 500–600 m (northward along lng 0).
    pub fn meridian_chain(directed: bool) -> RoadNetwork {
        let mut rn = if directed {
            RoadNetwork::directed()
        } else {
            RoadNetwork::undirected()
        };
        let marks = [0.0, 100.0, 200.0, 400.0, 500.0, 600.0];
        for (i, w) in marks.windows(2).enumerate() {
            rn.add_edge(
                EdgeId(i as u32 + 1),
                vec![SPoint::new(lat_m(w[0]), 0.0), SPoint::new(lat_m(w[1]), 0.0)],
            )
            .unwrap();
        }
        rn
    }
}

// ── Probabilities ─────────────────────────────────────────────────────────────

#[cfg(test)]
mod probabilities {
    use crate::HmmProbabilities;

    #[test]
    fn emission_peak_includes_normalization() {
        let p = HmmProbabilities::default();
        // log(1 / (sqrt(2π) · 50)) ≈ -4.831.
        assert!((p.emission_log_p(0.0) + 4.8310).abs() < 1e-3);
    }

    #[test]
    fn emission_decreases_with_error() {
        let p = HmmProbabilities::default();
        assert!(p.emission_log_p(10.0) > p.emission_log_p(50.0));
        assert!(p.emission_log_p(50.0) > p.emission_log_p(200.0));
    }

    #[test]
    fn transition_peak_at_equal_lengths() {
        let p = HmmProbabilities::default();
        // log(1/β) = log(0.5) ≈ -0.693.
        assert!((p.transition_log_p(100.0, 100.0) + 0.6931).abs() < 1e-3);
        assert!(p.transition_log_p(110.0, 100.0) > p.transition_log_p(150.0, 100.0));
        // The deviation is symmetric.
        assert_eq!(p.transition_log_p(120.0, 100.0), p.transition_log_p(100.0, 120.0));
    }
}

// ── Candidate generation ──────────────────────────────────────────────────────

#[cfg(test)]
mod candidates {
    use mm_core::{EdgeId, SPoint};
    use mm_network::RoadNetwork;

    use super::helpers::{DEG_001_M, chain5, pt, single_edge};
    use crate::get_candidates;

    #[test]
    fn projects_to_the_edge() {
        let rn = single_edge();
        let candidates = get_candidates(&pt(0.00005, 0.0005, 0), &rn, 50.0).unwrap();
        assert_eq!(candidates.len(), 1);
        let c = &candidates[0];
        assert_eq!(c.eid, EdgeId(1));
        assert!((c.offset - DEG_001_M / 2.0).abs() < 0.1, "offset {}", c.offset);
        assert!((c.error - 5.56).abs() < 0.05, "error {}", c.error);
        assert!(c.lat.abs() < 1e-12);
    }

    #[test]
    fn clamps_beyond_the_end_vertex() {
        let rn = single_edge();
        let candidates = get_candidates(&pt(0.0, 0.00101, 0), &rn, 50.0).unwrap();
        let c = &candidates[0];
        assert!((c.offset - DEG_001_M).abs() < 0.1, "offset {}", c.offset);
        assert!((c.lng - 0.001).abs() < 1e-12);
    }

    #[test]
    fn finds_all_edges_near_a_junction() {
        let rn = chain5();
        let candidates = get_candidates(&pt(0.00005, 0.001, 0), &rn, 50.0).unwrap();
        let mut eids: Vec<_> = candidates.iter().map(|c| c.eid).collect();
        eids.sort_unstable();
        assert_eq!(eids, vec![EdgeId(1), EdgeId(2)]);
    }

    #[test]
    fn none_when_out_of_radius() {
        let rn = single_edge();
        assert!(get_candidates(&pt(0.01, 0.0005, 0), &rn, 50.0).is_none());
    }

    #[test]
    fn error_filter_applies_even_inside_the_query_box() {
        let rn = single_edge();
        // Diagonally past the end vertex: the query box still touches the
        // edge's MBR, but the exact projection error (~39 m) exceeds a 30 m
        // search distance.
        assert!(get_candidates(&pt(0.00025, 0.00125, 0), &rn, 30.0).is_none());
        assert!(get_candidates(&pt(0.00025, 0.00125, 0), &rn, 50.0).is_some());
    }

    #[test]
    fn offset_accumulates_over_polyline_segments() {
        let mut rn = RoadNetwork::directed();
        // Eastward then northward, with a bend at (0, 0.001).
        rn.add_edge(
            EdgeId(7),
            vec![
                SPoint::new(0.0, 0.0),
                SPoint::new(0.0, 0.001),
                SPoint::new(0.001, 0.001),
            ],
        )
        .unwrap();
        let candidates = get_candidates(&pt(0.0005, 0.00105, 0), &rn, 50.0).unwrap();
        let c = &candidates[0];
        assert_eq!(c.eid, EdgeId(7));
        // First segment (≈111.2 m) plus half of the second.
        assert!((c.offset - 1.5 * DEG_001_M).abs() < 0.2, "offset {}", c.offset);
    }
}

// ── Viterbi decoder ───────────────────────────────────────────────────────────

#[cfg(test)]
mod viterbi {
    use std::rc::Rc;

    use mm_core::{CandidatePoint, EdgeId};
    use mm_network::VertexKey;
    use rustc_hash::FxHashMap;

    use super::helpers::pt;
    use crate::{MatchError, ViterbiDecoder};

    fn cand(eid: u32, offset: f64) -> CandidatePoint {
        CandidatePoint::new(0.0, 0.0, EdgeId(eid), 5.0, offset)
    }

    fn emissions(pairs: &[(CandidatePoint, f64)]) -> FxHashMap<CandidatePoint, f64> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn single_step_sequence() {
        let c1 = cand(1, 0.0);
        let c2 = cand(2, 0.0);
        let mut v = ViterbiDecoder::new();
        v.start_with_initial_observation(
            &pt(0.0, 0.0, 0),
            &[c1, c2],
            &emissions(&[(c1, -1.0), (c2, -2.0)]),
        )
        .unwrap();
        let seq = v.compute_most_likely_sequence();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0].state, Some(c1));
    }

    #[test]
    fn follows_the_best_transitions() {
        let (a1, a2) = (cand(1, 0.0), cand(2, 0.0));
        let (b1, b2) = (cand(3, 0.0), cand(4, 0.0));
        let mut v = ViterbiDecoder::new();
        v.start_with_initial_observation(
            &pt(0.0, 0.0, 0),
            &[a1, a2],
            &emissions(&[(a1, -1.0), (a2, -5.0)]),
        )
        .unwrap();
        let mut transitions = FxHashMap::default();
        transitions.insert((a1, b1), -10.0);
        transitions.insert((a1, b2), -1.0);
        transitions.insert((a2, b2), -1.0);
        v.next_step(
            &pt(0.0, 0.0001, 10),
            &[b1, b2],
            &emissions(&[(b1, -1.0), (b2, -1.0)]),
            &transitions,
            &FxHashMap::default(),
        )
        .unwrap();
        let seq = v.compute_most_likely_sequence();
        assert_eq!(seq.len(), 2);
        // a1 → b2 dominates: -1 + -1 + -1 beats every alternative.
        assert_eq!(seq[0].state, Some(a1));
        assert_eq!(seq[1].state, Some(b2));
    }

    #[test]
    fn first_seen_candidate_wins_ties() {
        let c1 = cand(1, 0.0);
        let c2 = cand(2, 0.0);
        let mut v = ViterbiDecoder::new();
        v.start_with_initial_observation(
            &pt(0.0, 0.0, 0),
            &[c1, c2],
            &emissions(&[(c1, -1.5), (c2, -1.5)]),
        )
        .unwrap();
        assert_eq!(v.compute_most_likely_sequence()[0].state, Some(c1));
    }

    #[test]
    fn break_preserves_the_previous_message() {
        let c1 = cand(1, 0.0);
        let c2 = cand(2, 0.0);
        let mut v = ViterbiDecoder::new();
        v.start_with_initial_observation(&pt(0.0, 0.0, 0), &[c1], &emissions(&[(c1, -1.0)]))
            .unwrap();
        // No transitions at all: every new hypothesis is -inf.
        v.next_step(
            &pt(0.0, 0.001, 10),
            &[c2],
            &emissions(&[(c2, -1.0)]),
            &FxHashMap::default(),
            &FxHashMap::default(),
        )
        .unwrap();
        assert!(v.is_broken());
        // The sequence up to the last healthy step is still available.
        let seq = v.compute_most_likely_sequence();
        assert_eq!(seq.len(), 1);
        assert_eq!(seq[0].state, Some(c1));
    }

    #[test]
    fn stepping_a_broken_decoder_is_an_error() {
        let c1 = cand(1, 0.0);
        let c2 = cand(2, 0.0);
        let mut v = ViterbiDecoder::new();
        v.start_with_initial_observation(&pt(0.0, 0.0, 0), &[c1], &emissions(&[(c1, -1.0)]))
            .unwrap();
        v.next_step(
            &pt(0.0, 0.001, 10),
            &[c2],
            &emissions(&[(c2, -1.0)]),
            &FxHashMap::default(),
            &FxHashMap::default(),
        )
        .unwrap();
        let err = v
            .next_step(
                &pt(0.0, 0.002, 20),
                &[c2],
                &emissions(&[(c2, -1.0)]),
                &FxHashMap::default(),
                &FxHashMap::default(),
            )
            .unwrap_err();
        assert!(matches!(err, MatchError::DecoderBroken));
    }

    #[test]
    fn lifecycle_misuse_is_an_error() {
        let c1 = cand(1, 0.0);
        let mut v = ViterbiDecoder::new();
        let err = v
            .next_step(
                &pt(0.0, 0.0, 0),
                &[c1],
                &emissions(&[(c1, -1.0)]),
                &FxHashMap::default(),
                &FxHashMap::default(),
            )
            .unwrap_err();
        assert!(matches!(err, MatchError::DecoderNotInitialized));

        v.start_with_initial_observation(&pt(0.0, 0.0, 0), &[c1], &emissions(&[(c1, -1.0)]))
            .unwrap();
        let err = v
            .start_with_initial_observation(&pt(0.0, 0.0, 0), &[c1], &emissions(&[(c1, -1.0)]))
            .unwrap_err();
        assert!(matches!(err, MatchError::DecoderAlreadyInitialized));
    }

    #[test]
    fn missing_emission_is_fatal() {
        let c1 = cand(1, 0.0);
        let c2 = cand(2, 0.0);
        let mut v = ViterbiDecoder::new();
        let err = v
            .start_with_initial_observation(
                &pt(0.0, 0.0, 0),
                &[c1, c2],
                &emissions(&[(c1, -1.0)]),
            )
            .unwrap_err();
        assert!(matches!(err, MatchError::MissingEmission(c) if c == c2));
    }

    #[test]
    fn transition_descriptors_ride_along() {
        let c1 = cand(1, 0.0);
        let c2 = cand(2, 0.0);
        let mut v = ViterbiDecoder::new();
        v.start_with_initial_observation(&pt(0.0, 0.0, 0), &[c1], &emissions(&[(c1, -1.0)]))
            .unwrap();
        let mut transitions = FxHashMap::default();
        transitions.insert((c1, c2), -1.0);
        let mut descriptors = FxHashMap::default();
        let road_path = Rc::new(vec![VertexKey::new(0.001, 0.0)]);
        descriptors.insert((c1, c2), Rc::clone(&road_path));
        v.next_step(
            &pt(0.0, 0.001, 10),
            &[c2],
            &emissions(&[(c2, -1.0)]),
            &transitions,
            &descriptors,
        )
        .unwrap();
        let seq = v.compute_most_likely_sequence();
        assert!(seq[0].transition_descriptor.is_none());
        assert_eq!(seq[1].transition_descriptor, Some(road_path));
    }

    #[test]
    fn message_history_records_each_committed_step() {
        let c1 = cand(1, 0.0);
        let mut v = ViterbiDecoder::with_message_history();
        v.start_with_initial_observation(&pt(0.0, 0.0, 0), &[c1], &emissions(&[(c1, -1.0)]))
            .unwrap();
        let mut transitions = FxHashMap::default();
        transitions.insert((c1, c1), -0.5);
        v.next_step(
            &pt(0.0, 0.0001, 10),
            &[c1],
            &emissions(&[(c1, -1.0)]),
            &transitions,
            &FxHashMap::default(),
        )
        .unwrap();
        assert_eq!(v.message_history().unwrap().len(), 2);
    }
}

// ── Matcher scenarios ─────────────────────────────────────────────────────────

#[cfg(test)]
mod matcher {
    use mm_core::{EdgeId, STPoint, Trajectory};

    use super::helpers::{chain5, pt, single_edge, traj, y_network};
    use crate::{MapMatcher, MatchError, MatcherConfig, TiHmmMatcher, match_batch};

    /// S1 — three points along one edge all match it, with monotone offsets.
    #[test]
    fn straight_line_single_edge() {
        let rn = single_edge();
        let matcher = TiHmmMatcher::new(&rn);
        let input = traj(
            "t1",
            vec![
                pt(0.00005, 0.0, 0),
                pt(0.00005, 0.0005, 10),
                pt(0.00005, 0.001, 20),
            ],
        );
        let matched = matcher.match_trajectory(&input).unwrap();

        assert_eq!(matched.pts.len(), 3);
        assert_eq!(matched.oid, input.oid);
        assert_eq!(matched.tid, input.tid);
        let mut last_offset = -1.0;
        for (raw, mm) in input.pts.iter().zip(&matched.pts) {
            // Raw coordinates and timestamps are preserved exactly.
            assert_eq!(raw.lat, mm.lat);
            assert_eq!(raw.lng, mm.lng);
            assert_eq!(raw.time, mm.time);
            let c = mm.candidate().expect("every point on the edge matches");
            assert_eq!(c.eid, EdgeId(1));
            assert!(c.error <= 50.0);
            assert!(c.offset > last_offset);
            last_offset = c.offset;
        }
    }

    /// S1 — the constructed path holds the single traversed edge.
    #[test]
    fn straight_line_single_entity_path() {
        let rn = single_edge();
        let matcher = TiHmmMatcher::with_config(
            &rn,
            MatcherConfig {
                min_path_entities: 1,
                ..MatcherConfig::default()
            },
        );
        let input = traj(
            "t1",
            vec![
                pt(0.00005, 0.0, 0),
                pt(0.00005, 0.0005, 10),
                pt(0.00005, 0.001, 20),
            ],
        );
        let paths = matcher.match_to_paths(&input).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].entities.len(), 1);
        let entity = &paths[0].entities[0];
        assert_eq!(entity.eid, EdgeId(1));
        assert_eq!(entity.enter_time, input.pts[0].time);
        assert_eq!(entity.leave_time, input.pts[2].time);
    }

    /// S2 — points drifting toward the fork's upper branch.
    #[test]
    fn y_junction_follows_the_drift() {
        let rn = y_network();
        let matcher = TiHmmMatcher::new(&rn);
        let input = traj(
            "t1",
            vec![
                pt(0.00005, 0.0003, 0),
                pt(0.00005, 0.0008, 10),
                pt(0.00016, 0.0013, 20),
                pt(0.00036, 0.0017, 30),
            ],
        );
        let matched = matcher.match_trajectory(&input).unwrap();
        let eids: Vec<_> = matched
            .pts
            .iter()
            .map(|p| p.candidate().expect("no breaks expected").eid)
            .collect();
        assert_eq!(eids, vec![EdgeId(1), EdgeId(1), EdgeId(2), EdgeId(2)]);
    }

    /// S3 — an off-network observation becomes a gap without disturbing the
    /// rest.
    #[test]
    fn far_point_becomes_a_gap() {
        let rn = single_edge();
        let matcher = TiHmmMatcher::new(&rn);
        let input = traj(
            "t1",
            vec![
                pt(0.00005, 0.0002, 0),
                pt(0.1, 0.1, 10), // ~15 km away
                pt(0.00005, 0.0008, 20),
            ],
        );
        let matched = matcher.match_trajectory(&input).unwrap();
        assert_eq!(matched.pts.len(), 3);
        assert!(matched.pts[0].candidate().is_some());
        assert!(matched.pts[1].candidate().is_none());
        assert!(matched.pts[2].candidate().is_some());
    }

    /// S4 — a same-edge transition with decreasing offset is unreachable on
    /// a directed network; the decoder breaks and restarts at the current
    /// step, so both points still match.
    #[test]
    fn reversed_offset_breaks_and_restarts() {
        let rn = single_edge();
        let matcher = TiHmmMatcher::new(&rn);
        let input = traj("t1", vec![pt(0.00005, 0.0008, 0), pt(0.00005, 0.0002, 10)]);
        let matched = matcher.match_trajectory(&input).unwrap();
        assert_eq!(matched.pts.len(), 2);
        let first = matched.pts[0].candidate().unwrap();
        let second = matched.pts[1].candidate().unwrap();
        assert_eq!(first.eid, EdgeId(1));
        assert_eq!(second.eid, EdgeId(1));
        assert!(first.offset > second.offset);
    }

    /// S5 — a contiguous off-network stretch yields null states and two
    /// reconstructed paths, one per bracket.
    #[test]
    fn gap_recovery_emits_two_paths() {
        let rn = chain5();
        let matcher = TiHmmMatcher::new(&rn);
        let mut pts = vec![
            pt(0.00005, 0.0001, 0),
            pt(0.00005, 0.0012, 10),
            pt(0.00005, 0.0023, 20),
        ];
        for i in 0..4 {
            pts.push(pt(0.1, 0.1 + i as f64 * 0.001, 30 + i * 10));
        }
        pts.extend([
            pt(0.00005, 0.0027, 70),
            pt(0.00005, 0.0038, 80),
            pt(0.00005, 0.0049, 90),
        ]);
        let input = traj("t1", pts);

        let matched = matcher.match_trajectory(&input).unwrap();
        assert_eq!(matched.pts.len(), 11);
        for (i, p) in matched.pts.iter().enumerate() {
            if (3..7).contains(&i) {
                assert!(p.candidate().is_none(), "point {i} should be a gap");
            } else {
                assert!(p.candidate().is_some(), "point {i} should match");
            }
        }

        let paths = matcher.match_to_paths(&input).unwrap();
        assert_eq!(paths.len(), 2);
        let eids = |path: &mm_core::Path| -> Vec<EdgeId> {
            path.entities.iter().map(|e| e.eid).collect()
        };
        assert_eq!(eids(&paths[0]), vec![EdgeId(1), EdgeId(2), EdgeId(3)]);
        assert_eq!(eids(&paths[1]), vec![EdgeId(3), EdgeId(4), EdgeId(5)]);
        assert!(paths[0].pid.starts_with("t1_"));
    }

    /// Property 6 — matching its own output (candidates stripped) changes
    /// nothing when there were no breaks.
    #[test]
    fn matching_is_idempotent() {
        let rn = y_network();
        let matcher = TiHmmMatcher::new(&rn);
        let input = traj(
            "t1",
            vec![
                pt(0.00005, 0.0003, 0),
                pt(0.00005, 0.0008, 10),
                pt(0.00016, 0.0013, 20),
                pt(0.00036, 0.0017, 30),
            ],
        );
        let first = matcher.match_trajectory(&input).unwrap();
        let stripped = Trajectory::new(
            first.oid.clone(),
            first.tid.clone(),
            first
                .pts
                .iter()
                .map(|p| STPoint::new(p.lat, p.lng, p.time))
                .collect(),
        );
        let second = matcher.match_trajectory(&stripped).unwrap();
        assert_eq!(first, second);
    }

    /// Determinism — identical inputs decode to identical outputs.
    #[test]
    fn matching_is_deterministic() {
        let rn = chain5();
        let matcher = TiHmmMatcher::new(&rn);
        let input = traj(
            "t1",
            vec![
                pt(0.00005, 0.0004, 0),
                pt(0.00005, 0.0016, 10),
                pt(0.00005, 0.0028, 20),
                pt(0.00005, 0.0041, 30),
            ],
        );
        let a = matcher.match_trajectory(&input).unwrap();
        let b = matcher.match_trajectory(&input).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn noisy_trace_stays_on_the_chain() {
        use rand::{Rng, SeedableRng, rngs::SmallRng};

        let rn = chain5();
        let matcher = TiHmmMatcher::new(&rn);
        let mut rng = SmallRng::seed_from_u64(42);
        let pts = (0..20)
            .map(|i| {
                let jitter_lat: f64 = rng.gen_range(-2.0e-5..2.0e-5);
                let jitter_lng: f64 = rng.gen_range(-2.0e-5..2.0e-5);
                pt(
                    0.00005 + jitter_lat,
                    0.0001 + i as f64 * 0.00025 + jitter_lng,
                    i * 15,
                )
            })
            .collect();
        let input = traj("noisy", pts);
        let matched = matcher.match_trajectory(&input).unwrap();
        assert_eq!(matched.pts.len(), 20);
        for p in &matched.pts {
            let c = p.candidate().expect("jitter stays within the radius");
            assert!(c.error <= 50.0);
        }
    }

    #[test]
    fn input_invariants_abort_the_trajectory() {
        let rn = single_edge();
        let matcher = TiHmmMatcher::new(&rn);

        let empty = Trajectory::new("t1", "t1_empty", vec![]);
        assert!(matches!(
            matcher.match_trajectory(&empty),
            Err(MatchError::Core(_))
        ));

        let reversed = Trajectory::new(
            "t1",
            "t1_rev",
            vec![pt(0.00005, 0.0005, 10), pt(0.00005, 0.0008, 0)],
        );
        assert!(matches!(
            matcher.match_trajectory(&reversed),
            Err(MatchError::Core(_))
        ));
    }

    #[test]
    fn batch_keeps_input_order() {
        let rn = single_edge();
        let matcher = TiHmmMatcher::new(&rn);
        let t1 = traj("a", vec![pt(0.00005, 0.0002, 0), pt(0.00005, 0.0006, 10)]);
        let t2 = traj("b", vec![pt(0.00005, 0.0003, 0), pt(0.00005, 0.0007, 10)]);
        let results = match_batch(&matcher, &[t1.clone(), t2.clone()]);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().oid, "a");
        assert_eq!(results[1].as_ref().unwrap().oid, "b");
        assert_eq!(
            results[0].as_ref().unwrap(),
            &matcher.match_trajectory(&t1).unwrap()
        );
    }
}

// ── Path reconstruction ───────────────────────────────────────────────────────

#[cfg(test)]
mod route {
    use mm_core::{CandidatePoint, EdgeId, Timestamp, Trajectory};
    use mm_network::RoutingWeight;

    use super::helpers::{lat_m, matched_pt, meridian_chain, ts};
    use crate::construct_path;

    fn assert_close(actual: Timestamp, expected: Timestamp) {
        let diff = (actual - expected).num_milliseconds().abs();
        assert!(diff <= 1, "expected {expected}, got {actual}");
    }

    /// S6 — 60 s over 500 m split 50/100/200/100/50 gives edge boundaries at
    /// 6, 18, 42, and 54 seconds.
    #[test]
    fn proportional_time_interpolation() {
        let rn = meridian_chain(true);
        let mm = Trajectory::new(
            "t1",
            "t1_s6",
            vec![
                matched_pt(CandidatePoint::new(lat_m(50.0), 0.0, EdgeId(1), 0.0, 50.0), 0),
                matched_pt(CandidatePoint::new(lat_m(550.0), 0.0, EdgeId(5), 0.0, 50.0), 60),
            ],
        );
        let paths = construct_path(&rn, &mm, RoutingWeight::Length, 1).unwrap();
        assert_eq!(paths.len(), 1);
        let entities = &paths[0].entities;
        assert_eq!(entities.len(), 5);

        let expected_eids: Vec<EdgeId> = (1..=5).map(EdgeId).collect();
        let actual_eids: Vec<EdgeId> = entities.iter().map(|e| e.eid).collect();
        assert_eq!(actual_eids, expected_eids);

        let expected_leaves = [6, 18, 42, 54, 60];
        for (entity, secs) in entities.iter().zip(expected_leaves) {
            assert_close(entity.leave_time, ts(secs));
        }
        // Property 4: entities hand over without gaps.
        for w in entities.windows(2) {
            assert_close(w[1].enter_time, w[0].leave_time);
            assert!(w[0].enter_time <= w[0].leave_time);
        }
    }

    /// Two observations collapsing onto the shared vertex of their edges.
    #[test]
    fn zero_distance_transition() {
        let rn = meridian_chain(true);
        // Offset exactly at the end of e1: the remaining distance is 0.0.
        let e1_len = rn.edge(EdgeId(1)).unwrap().length;
        let mm = Trajectory::new(
            "t1",
            "t1_zero",
            vec![
                matched_pt(
                    CandidatePoint::new(lat_m(100.0), 0.0, EdgeId(1), 0.0, e1_len),
                    0,
                ),
                matched_pt(CandidatePoint::new(lat_m(100.0), 0.0, EdgeId(2), 0.0, 0.0), 10),
            ],
        );
        let paths = construct_path(&rn, &mm, RoutingWeight::Length, 1).unwrap();
        assert_eq!(paths.len(), 1);
        let entities = &paths[0].entities;
        assert_eq!(entities.len(), 2);
        // The previous edge absorbs the whole interval; the current edge is
        // entered (and closed) at the second observation.
        assert_eq!(entities[0].leave_time, ts(10));
        assert_eq!(entities[1].enter_time, ts(10));
        assert_eq!(entities[1].leave_time, ts(10));
    }

    /// Undirected exit distance uses the *current* candidate's offset from
    /// its edge's far vertex.
    #[test]
    fn undirected_exit_distance_uses_current_offset() {
        let rn = meridian_chain(false);
        // prev 20 m into e2 (just past the junction), cur 30 m into e1:
        // the route backs out of e2 (20 m) and runs 70 m down e1.
        let mm = Trajectory::new(
            "t1",
            "t1_undir",
            vec![
                matched_pt(CandidatePoint::new(lat_m(120.0), 0.0, EdgeId(2), 0.0, 20.0), 0),
                matched_pt(CandidatePoint::new(lat_m(30.0), 0.0, EdgeId(1), 0.0, 30.0), 90),
            ],
        );
        let paths = construct_path(&rn, &mm, RoutingWeight::Length, 1).unwrap();
        assert_eq!(paths.len(), 1);
        let entities = &paths[0].entities;
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].eid, EdgeId(2));
        assert_eq!(entities[1].eid, EdgeId(1));
        // 90 s over 90 m: the handover happens 20 s in, on both sides.
        assert_close(entities[0].leave_time, ts(20));
        assert_close(entities[1].enter_time, ts(20));
        assert_close(entities[1].leave_time, ts(90));
    }

    #[test]
    fn emission_threshold_is_configurable() {
        let rn = meridian_chain(true);
        let mm = Trajectory::new(
            "t1",
            "t1_short",
            vec![
                matched_pt(CandidatePoint::new(lat_m(10.0), 0.0, EdgeId(1), 0.0, 10.0), 0),
                matched_pt(CandidatePoint::new(lat_m(90.0), 0.0, EdgeId(1), 0.0, 90.0), 10),
            ],
        );
        // One entity: dropped at the traditional threshold, kept at 1.
        assert!(construct_path(&rn, &mm, RoutingWeight::Length, 3)
            .unwrap()
            .is_empty());
        let paths = construct_path(&rn, &mm, RoutingWeight::Length, 1).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].entities.len(), 1);
    }

    #[test]
    fn unmatched_trajectory_produces_no_paths() {
        let rn = meridian_chain(true);
        let mm = Trajectory::new(
            "t1",
            "t1_none",
            vec![super::helpers::pt(0.5, 0.5, 0), super::helpers::pt(0.5, 0.5, 10)],
        );
        assert!(construct_path(&rn, &mm, RoutingWeight::Length, 1)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn entity_times_never_regress() {
        let rn = meridian_chain(true);
        let mm = Trajectory::new(
            "t1",
            "t1_mono",
            vec![
                matched_pt(CandidatePoint::new(lat_m(50.0), 0.0, EdgeId(1), 0.0, 50.0), 0),
                matched_pt(CandidatePoint::new(lat_m(150.0), 0.0, EdgeId(2), 0.0, 50.0), 25),
                matched_pt(CandidatePoint::new(lat_m(550.0), 0.0, EdgeId(5), 0.0, 50.0), 85),
            ],
        );
        let paths = construct_path(&rn, &mm, RoutingWeight::Length, 1).unwrap();
        assert_eq!(paths.len(), 1);
        for entity in &paths[0].entities {
            assert!(entity.enter_time <= entity.leave_time);
        }
        for w in paths[0].entities.windows(2) {
            let gap = (w[1].enter_time - w[0].leave_time).num_milliseconds().abs();
            assert!(gap <= 1);
        }
    }
}
