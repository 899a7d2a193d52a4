//! Strongly typed edge identifier.

use std::fmt;

/// Identifier of a road-network edge, globally unique within one network.
///
/// The inner integer is `pub`: file formats print and parse it directly,
/// and `to_directed()` mints fresh backward-edge ids from `max(eid)+1`
/// upward (`u32` leaves headroom for networks of ~2 billion one-way
/// segments).  `Copy + Ord + Hash` so ids work as map keys and sort
/// without ceremony.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeId(pub u32);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}
