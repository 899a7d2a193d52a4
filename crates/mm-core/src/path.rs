//! Timed edge paths — the final product of map matching.

use crate::ids::EdgeId;
use crate::time::{ID_MINUTES_FORMAT, Timestamp, format_timestamp};

/// One traversed edge with interpolated enter/leave times.
///
/// Invariant: `enter_time <= leave_time`, and within a [`Path`] consecutive
/// entities hand over exactly (`entities[k].leave_time ==
/// entities[k+1].enter_time` up to millisecond rounding).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathEntity {
    pub enter_time: Timestamp,
    pub leave_time: Timestamp,
    pub eid: EdgeId,
}

impl PathEntity {
    pub fn new(enter_time: Timestamp, leave_time: Timestamp, eid: EdgeId) -> Self {
        Self {
            enter_time,
            leave_time,
            eid,
        }
    }
}

/// A contiguous timed traversal of road edges by one object.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    pub oid: String,
    pub pid: String,
    pub entities: Vec<PathEntity>,
}

impl Path {
    pub fn new(oid: impl Into<String>, pid: impl Into<String>, entities: Vec<PathEntity>) -> Self {
        Self {
            oid: oid.into(),
            pid: pid.into(),
            entities,
        }
    }
}

/// Derive a path id from the object id and the first-enter/last-leave times:
/// `oid_YYYYmmddHHMM_YYYYmmddHHMM`.
///
/// The slice must be non-empty.
pub fn pid_for(oid: &str, entities: &[PathEntity]) -> String {
    debug_assert!(!entities.is_empty());
    format!(
        "{}_{}_{}",
        oid,
        format_timestamp(entities[0].enter_time, ID_MINUTES_FORMAT),
        format_timestamp(entities[entities.len() - 1].leave_time, ID_MINUTES_FORMAT)
    )
}
