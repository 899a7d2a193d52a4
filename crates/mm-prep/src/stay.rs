//! Stay-point detection — finding where an object lingered.
//!
//! A stay point is a maximal run of points that remains within
//! `max_stay_dist_m` of its anchor for longer than `max_stay_time_secs`
//! (a parked taxi, a delivery stop).

use mm_core::{STPoint, Trajectory, tid_for};

/// Detects the stay sub-trajectories of a trace.
pub trait StayPointDetector {
    fn detect(&self, traj: &Trajectory) -> Vec<Trajectory>;
}

/// Index of the first successor of `pts[cur_idx]` farther than `max_dist_m`
/// from it (or `pts.len()` when none is).
pub(crate) fn find_first_exceed_max_distance(
    pts: &[STPoint],
    cur_idx: usize,
    max_dist_m: f64,
) -> usize {
    let anchor = pts[cur_idx].point();
    let mut next_idx = cur_idx + 1;
    while next_idx < pts.len() {
        if anchor.distance_m(pts[next_idx].point()) > max_dist_m {
            break;
        }
        next_idx += 1;
    }
    next_idx
}

/// Whether the run `cur_idx..next_idx` (with `next_idx` the first index
/// outside the distance threshold) lasted longer than `max_stay_secs`.
pub(crate) fn exceed_max_time(
    pts: &[STPoint],
    cur_idx: usize,
    next_idx: usize,
    max_stay_secs: f64,
) -> bool {
    let span = (pts[next_idx - 1].time - pts[cur_idx].time).num_milliseconds() as f64 / 1_000.0;
    span > max_stay_secs
}

// ── Classic detector ──────────────────────────────────────────────────────────

/// The classic anchor-advancing detector: each detected stay jumps the
/// anchor past its own end, so stays never overlap.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassicStayPointDetector {
    pub max_stay_dist_m: f64,
    pub max_stay_time_secs: f64,
}

impl ClassicStayPointDetector {
    pub fn new(max_stay_dist_m: f64, max_stay_time_secs: f64) -> Self {
        Self {
            max_stay_dist_m,
            max_stay_time_secs,
        }
    }
}

impl StayPointDetector for ClassicStayPointDetector {
    fn detect(&self, traj: &Trajectory) -> Vec<Trajectory> {
        let pts = &traj.pts;
        let mut stays = Vec::new();
        if pts.len() <= 1 {
            return stays;
        }
        let mut cur_idx = 0;
        while cur_idx < pts.len() - 1 {
            let next_idx = find_first_exceed_max_distance(pts, cur_idx, self.max_stay_dist_m);
            if exceed_max_time(pts, cur_idx, next_idx, self.max_stay_time_secs) {
                let slice = pts[cur_idx..next_idx].to_vec();
                stays.push(Trajectory::new(
                    traj.oid.clone(),
                    tid_for(&traj.oid, &slice),
                    slice,
                ));
                cur_idx = next_idx;
            } else {
                cur_idx += 1;
            }
        }
        stays
    }
}

// ── Density detector ──────────────────────────────────────────────────────────

/// Density-based variant: anchors advance one point at a time and a stay
/// stays open while later anchors keep extending its reach, so slowly
/// drifting clusters merge into one stay instead of fragmenting.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DensityStayPointDetector {
    pub max_stay_dist_m: f64,
    pub max_stay_time_secs: f64,
}

impl DensityStayPointDetector {
    pub fn new(max_stay_dist_m: f64, max_stay_time_secs: f64) -> Self {
        Self {
            max_stay_dist_m,
            max_stay_time_secs,
        }
    }
}

impl StayPointDetector for DensityStayPointDetector {
    fn detect(&self, traj: &Trajectory) -> Vec<Trajectory> {
        let pts = &traj.pts;
        let mut stays = Vec::new();
        if pts.len() <= 1 {
            return stays;
        }
        let mut furthest_next_idx = 0;
        let mut stay_start_idx = 0;
        let mut is_open = false;
        let mut cur_idx = 0;
        while cur_idx < pts.len() - 1 {
            let next_idx = find_first_exceed_max_distance(pts, cur_idx, self.max_stay_dist_m);
            if furthest_next_idx < next_idx
                && exceed_max_time(pts, cur_idx, next_idx, self.max_stay_time_secs)
            {
                if !is_open {
                    stay_start_idx = cur_idx;
                    is_open = true;
                }
                furthest_next_idx = next_idx;
            }
            if is_open && cur_idx + 1 == furthest_next_idx {
                is_open = false;
                let slice = pts[stay_start_idx..furthest_next_idx].to_vec();
                stays.push(Trajectory::new(
                    traj.oid.clone(),
                    tid_for(&traj.oid, &slice),
                    slice,
                ));
            }
            cur_idx += 1;
        }
        stays
    }
}
