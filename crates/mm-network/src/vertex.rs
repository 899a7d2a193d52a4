//! Exact-coordinate vertex keys.

use mm_core::SPoint;
use ordered_float::OrderedFloat;

/// Graph key of a road-network vertex: its `(lng, lat)` coordinate pair.
///
/// Identity is exact float equality — the loader must hand the router the
/// same bits it handed the graph, with no re-rounding in between.
/// `OrderedFloat` supplies the `Eq + Hash + Ord` the graph maps and the A*
/// heap need.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VertexKey {
    pub lng: OrderedFloat<f64>,
    pub lat: OrderedFloat<f64>,
}

impl VertexKey {
    #[inline]
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            lng: OrderedFloat(lng),
            lat: OrderedFloat(lat),
        }
    }

    /// Key for a geographic point.
    #[inline]
    pub fn of(pt: SPoint) -> Self {
        Self::new(pt.lng, pt.lat)
    }

    /// The vertex location as a geographic point.
    #[inline]
    pub fn point(self) -> SPoint {
        SPoint::new(self.lat.0, self.lng.0)
    }
}

impl std::fmt::Display for VertexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.lng.0, self.lat.0)
    }
}
