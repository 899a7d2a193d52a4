//! Candidate points — projections of raw observations onto road edges.

use std::hash::{Hash, Hasher};

use crate::geo::SPoint;
use crate::ids::EdgeId;

/// A projection of one raw observation onto a nearby road edge.
///
/// `error` is the haversine distance in meters from the raw point to the
/// projection; `offset` is the distance in meters from the edge's start
/// vertex along its polyline to the projection.
///
/// Candidates are used as map keys inside a Viterbi time step, so equality
/// and hashing are **bitwise** on the float fields: two candidates are the
/// same state only if every field reproduces exactly.  That identity is
/// stable for the lifetime of a step, which is all the decoder requires.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CandidatePoint {
    pub lat: f64,
    pub lng: f64,
    pub eid: EdgeId,
    pub error: f64,
    pub offset: f64,
}

impl CandidatePoint {
    pub fn new(lat: f64, lng: f64, eid: EdgeId, error: f64, offset: f64) -> Self {
        Self {
            lat,
            lng,
            eid,
            error,
            offset,
        }
    }

    /// The projected location as a plain geographic point.
    #[inline]
    pub fn point(&self) -> SPoint {
        SPoint::new(self.lat, self.lng)
    }
}

impl PartialEq for CandidatePoint {
    fn eq(&self, other: &Self) -> bool {
        self.eid == other.eid
            && self.lat.to_bits() == other.lat.to_bits()
            && self.lng.to_bits() == other.lng.to_bits()
            && self.error.to_bits() == other.error.to_bits()
            && self.offset.to_bits() == other.offset.to_bits()
    }
}

impl Eq for CandidatePoint {}

impl Hash for CandidatePoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.eid.hash(state);
        self.lat.to_bits().hash(state);
        self.lng.to_bits().hash(state);
        self.error.to_bits().hash(state);
        self.offset.to_bits().hash(state);
    }
}

impl std::fmt::Display for CandidatePoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{},{}",
            self.eid.0, self.lat, self.lng, self.error, self.offset
        )
    }
}
