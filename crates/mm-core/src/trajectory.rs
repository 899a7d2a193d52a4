//! Spatio-temporal points and trajectories.
//!
//! A [`Trajectory`] is an ordered sequence of [`STPoint`]s with
//! non-decreasing timestamps, owned by one moving object (`oid`).  The
//! trajectory id `tid` is derivable from the object id and the first/last
//! timestamps (see [`tid_for`]).
//!
//! Points carry an optional [`PointData`] payload; the map matcher uses it to
//! attach the chosen [`CandidatePoint`] to every point of its output.

use crate::candidate::CandidatePoint;
use crate::error::{CoreError, CoreResult};
use crate::geo::{SPoint, point_along_segment};
use crate::mbr::Mbr;
use crate::time::{ID_SECONDS_FORMAT, TRAJ_TIME_FORMAT, Timestamp, format_timestamp};

// ── STPoint ───────────────────────────────────────────────────────────────────

/// Per-point payload attached by downstream processing.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PointData {
    /// The matched candidate, or `None` for a point the matcher could not
    /// place on the network.
    pub candi_pt: Option<CandidatePoint>,
}

/// A geographic point observed at an instant.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct STPoint {
    pub lat: f64,
    pub lng: f64,
    pub time: Timestamp,
    pub data: Option<PointData>,
}

impl STPoint {
    pub fn new(lat: f64, lng: f64, time: Timestamp) -> Self {
        Self {
            lat,
            lng,
            time,
            data: None,
        }
    }

    pub fn with_data(lat: f64, lng: f64, time: Timestamp, data: PointData) -> Self {
        Self {
            lat,
            lng,
            time,
            data: Some(data),
        }
    }

    #[inline]
    pub fn point(&self) -> SPoint {
        SPoint::new(self.lat, self.lng)
    }

    /// The matched candidate, if any payload carries one.
    #[inline]
    pub fn candidate(&self) -> Option<&CandidatePoint> {
        self.data.as_ref().and_then(|d| d.candi_pt.as_ref())
    }
}

impl std::fmt::Display for STPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {}, {})",
            format_timestamp(self.time, TRAJ_TIME_FORMAT),
            self.lat,
            self.lng
        )
    }
}

// ── Trajectory ────────────────────────────────────────────────────────────────

/// An ordered GPS trace of one moving object.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trajectory {
    pub oid: String,
    pub tid: String,
    pub pts: Vec<STPoint>,
}

impl Trajectory {
    pub fn new(oid: impl Into<String>, tid: impl Into<String>, pts: Vec<STPoint>) -> Self {
        Self {
            oid: oid.into(),
            tid: tid.into(),
            pts,
        }
    }

    /// Check the input invariants: at least one point, non-decreasing times.
    pub fn validate(&self) -> CoreResult<()> {
        if self.pts.is_empty() {
            return Err(CoreError::EmptyTrajectory(self.tid.clone()));
        }
        for (i, pair) in self.pts.windows(2).enumerate() {
            if pair[1].time < pair[0].time {
                return Err(CoreError::NonMonotonicTimestamps {
                    tid: self.tid.clone(),
                    index: i + 1,
                });
            }
        }
        Ok(())
    }

    pub fn start_time(&self) -> Option<Timestamp> {
        self.pts.first().map(|p| p.time)
    }

    pub fn end_time(&self) -> Option<Timestamp> {
        self.pts.last().map(|p| p.time)
    }

    /// Wall-clock span in seconds (0 for single-point trajectories).
    pub fn duration_secs(&self) -> f64 {
        match (self.start_time(), self.end_time()) {
            (Some(s), Some(e)) => (e - s).num_milliseconds() as f64 / 1_000.0,
            _ => 0.0,
        }
    }

    /// Total haversine length of the trace in meters.
    pub fn length_m(&self) -> f64 {
        self.pts
            .windows(2)
            .map(|w| w[0].point().distance_m(w[1].point()))
            .sum()
    }

    /// Mean time gap between consecutive points, in seconds.
    pub fn mean_time_interval_secs(&self) -> Option<f64> {
        if self.pts.len() < 2 {
            return None;
        }
        Some(self.duration_secs() / (self.pts.len() - 1) as f64)
    }

    /// Mean distance between consecutive points, in meters.
    pub fn mean_distance_interval_m(&self) -> Option<f64> {
        if self.pts.len() < 2 {
            return None;
        }
        Some(self.length_m() / (self.pts.len() - 1) as f64)
    }

    pub fn mbr(&self) -> Option<Mbr> {
        if self.pts.is_empty() {
            return None;
        }
        Some(Mbr::of_points(self.pts.iter().map(|p| p.point())))
    }

    pub fn centroid(&self) -> Option<SPoint> {
        if self.pts.is_empty() {
            return None;
        }
        let n = self.pts.len() as f64;
        let (lat, lng) = self
            .pts
            .iter()
            .fold((0.0, 0.0), |(lat, lng), p| (lat + p.lat, lng + p.lng));
        Some(SPoint::new(lat / n, lng / n))
    }

    /// Interpolated location at `time`, or `None` when `time` falls outside
    /// `[start_time, end_time)`.
    pub fn location_at(&self, time: Timestamp) -> Option<SPoint> {
        let idx = self.index_at(time)?;
        if idx + 1 >= self.pts.len() {
            return None;
        }
        let (a, b) = (&self.pts[idx], &self.pts[idx + 1]);
        let span_ms = (b.time - a.time).num_milliseconds();
        if a.time == time || span_ms == 0 {
            return Some(a.point());
        }
        let dist_ab = a.point().distance_m(b.point());
        if dist_ab == 0.0 {
            return Some(a.point());
        }
        let rate = (time - a.time).num_milliseconds() as f64 / span_ms as f64;
        Some(point_along_segment(a.point(), b.point(), rate))
    }

    /// Largest `idx` with `pts[idx].time <= time`, or `None` when `time`
    /// precedes the trajectory.
    fn index_at(&self, time: Timestamp) -> Option<usize> {
        if self.pts.is_empty() || time < self.pts[0].time {
            return None;
        }
        Some(self.pts.partition_point(|p| p.time <= time) - 1)
    }
}

impl std::fmt::Display for Trajectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Trajectory(oid={},tid={})", self.oid, self.tid)
    }
}

/// Derive a trajectory id from the object id and the first/last timestamps:
/// `oid_YYYYmmddHHMMSS_YYYYmmddHHMMSS`.
///
/// The slice must be non-empty.
pub fn tid_for(oid: &str, pts: &[STPoint]) -> String {
    debug_assert!(!pts.is_empty());
    format!(
        "{}_{}_{}",
        oid,
        format_timestamp(pts[0].time, ID_SECONDS_FORMAT),
        format_timestamp(pts[pts.len() - 1].time, ID_SECONDS_FORMAT)
    )
}
