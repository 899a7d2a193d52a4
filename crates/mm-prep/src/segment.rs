//! Trajectory segmentation — cutting one trace into independently matchable
//! pieces.

use mm_core::{STPoint, Trajectory, tid_for};

use crate::stay::{exceed_max_time, find_first_exceed_max_distance};

/// Splits a trajectory into segments; segments with fewer than the minimum
/// points are discarded.
pub trait Segmentation {
    fn segment(&self, traj: &Trajectory) -> Vec<Trajectory>;
}

fn make_segment(oid: &str, pts: Vec<STPoint>) -> Trajectory {
    let tid = tid_for(oid, &pts);
    Trajectory::new(oid, tid, pts)
}

// ── Time-interval segmentation ────────────────────────────────────────────────

/// Cuts wherever the recording gap between consecutive points exceeds
/// `max_interval_secs`.  Segments need at least 2 points.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeIntervalSegmentation {
    pub max_interval_secs: f64,
}

impl TimeIntervalSegmentation {
    pub fn new(max_interval_secs: f64) -> Self {
        Self { max_interval_secs }
    }
}

impl Segmentation for TimeIntervalSegmentation {
    fn segment(&self, traj: &Trajectory) -> Vec<Trajectory> {
        let pts = &traj.pts;
        let mut segments = Vec::new();
        if pts.len() <= 1 {
            return segments;
        }
        let mut partial: Vec<STPoint> = vec![pts[0].clone()];
        for w in pts.windows(2) {
            let span = (w[1].time - w[0].time).num_milliseconds() as f64 / 1_000.0;
            if span <= self.max_interval_secs {
                partial.push(w[1].clone());
            } else {
                if partial.len() > 1 {
                    segments.push(make_segment(&traj.oid, partial));
                }
                partial = vec![w[1].clone()];
            }
        }
        if partial.len() > 1 {
            segments.push(make_segment(&traj.oid, partial));
        }
        segments
    }
}

// ── Stay-point segmentation ───────────────────────────────────────────────────

/// Cuts the trajectory at detected stays (see [`crate::stay`]): the stay
/// itself is dropped and travel resumes on its far side.  Segments need at
/// least 3 points.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StayPointSegmentation {
    pub max_stay_dist_m: f64,
    pub max_stay_time_secs: f64,
}

impl StayPointSegmentation {
    pub fn new(max_stay_dist_m: f64, max_stay_time_secs: f64) -> Self {
        Self {
            max_stay_dist_m,
            max_stay_time_secs,
        }
    }
}

impl Segmentation for StayPointSegmentation {
    fn segment(&self, traj: &Trajectory) -> Vec<Trajectory> {
        let pts = &traj.pts;
        let mut segments = Vec::new();
        if pts.len() <= 1 {
            return segments;
        }
        let mut seg_start_idx = 0usize;
        let mut cur_idx = 0usize;
        while cur_idx < pts.len() - 1 {
            let next_idx = find_first_exceed_max_distance(pts, cur_idx, self.max_stay_dist_m);
            if exceed_max_time(pts, cur_idx, next_idx, self.max_stay_time_secs) {
                if (seg_start_idx as i64) < cur_idx as i64 - 2 {
                    segments.push(make_segment(&traj.oid, pts[seg_start_idx..cur_idx].to_vec()));
                }
                seg_start_idx = next_idx;
                cur_idx = next_idx;
            } else {
                cur_idx += 1;
            }
        }
        if (seg_start_idx as i64) < pts.len() as i64 - 2 {
            segments.push(make_segment(&traj.oid, pts[seg_start_idx..].to_vec()));
        }
        segments
    }
}
