//! Noise filters — dropping implausible observations.

use mm_core::time::{ID_MINUTES_FORMAT, format_timestamp};
use mm_core::{Mbr, STPoint, Timestamp, Trajectory};

/// A filter that removes implausible points from a trajectory.
///
/// Filters return `None` when fewer than two points survive — such a residue
/// is useless to every downstream consumer.  The surviving trajectory gets a
/// fresh tid derived (at minute precision) from its new first/last points.
pub trait NoiseFilter {
    fn filter(&self, traj: &Trajectory) -> Option<Trajectory>;
}

/// Minute-precision tid for a filtered point list.
fn filtered_tid(oid: &str, pts: &[STPoint]) -> String {
    format!(
        "{}_{}_{}",
        oid,
        format_timestamp(pts[0].time, ID_MINUTES_FORMAT),
        format_timestamp(pts[pts.len() - 1].time, ID_MINUTES_FORMAT)
    )
}

fn rebuild(oid: &str, clean: Vec<STPoint>) -> Option<Trajectory> {
    if clean.len() > 1 {
        let tid = filtered_tid(oid, &clean);
        Some(Trajectory::new(oid, tid, clean))
    } else {
        None
    }
}

// ── HeuristicFilter ───────────────────────────────────────────────────────────

/// Drops points that would require exceeding `max_speed_mps` to reach from
/// the last *kept* point.  A teleporting outlier is skipped and the anchor
/// stays put, so a single bad fix cannot drag the rest of the trace with it.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeuristicFilter {
    pub max_speed_mps: f64,
}

impl HeuristicFilter {
    pub fn new(max_speed_mps: f64) -> Self {
        Self { max_speed_mps }
    }
}

impl NoiseFilter for HeuristicFilter {
    fn filter(&self, traj: &Trajectory) -> Option<Trajectory> {
        if traj.pts.len() <= 1 {
            return None;
        }
        let mut pre = &traj.pts[0];
        let mut clean: Vec<STPoint> = vec![pre.clone()];
        for cur in &traj.pts[1..] {
            let secs = (cur.time - pre.time).num_milliseconds() as f64 / 1_000.0;
            let dist = pre.point().distance_m(cur.point());
            if secs > 0.0 && dist / secs <= self.max_speed_mps {
                clean.push(cur.clone());
                pre = cur;
            }
        }
        rebuild(&traj.oid, clean)
    }
}

// ── StFilter ──────────────────────────────────────────────────────────────────

/// Keeps only points inside a spatio-temporal window: `mbr` spatially,
/// `start <= t < end` temporally.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StFilter {
    pub mbr: Mbr,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl StFilter {
    pub fn new(mbr: Mbr, start: Timestamp, end: Timestamp) -> Self {
        Self { mbr, start, end }
    }
}

impl NoiseFilter for StFilter {
    fn filter(&self, traj: &Trajectory) -> Option<Trajectory> {
        if traj.pts.len() <= 1 {
            return None;
        }
        let clean: Vec<STPoint> = traj
            .pts
            .iter()
            .filter(|pt| {
                self.start <= pt.time && pt.time < self.end && self.mbr.contains(pt.lat, pt.lng)
            })
            .cloned()
            .collect();
        rebuild(&traj.oid, clean)
    }
}
