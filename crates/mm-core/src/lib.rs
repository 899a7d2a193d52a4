//! `mm-core` — foundational types for the `rust_mm` map-matching toolkit.
//!
//! This crate is a dependency of every other `mm-*` crate.  It intentionally
//! has no `mm-*` dependencies and minimal external ones (only `chrono` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module         | Contents                                               |
//! |----------------|--------------------------------------------------------|
//! | [`ids`]        | `EdgeId`                                               |
//! | [`geo`]        | `SPoint`, haversine distance, bearing, projections     |
//! | [`mbr`]        | `Mbr` geographic bounding rectangle                    |
//! | [`time`]       | `Timestamp`, file/id time formats                      |
//! | [`trajectory`] | `STPoint`, `PointData`, `Trajectory`                   |
//! | [`candidate`]  | `CandidatePoint`                                       |
//! | [`path`]       | `PathEntity`, `Path`                                   |
//! | [`error`]      | `CoreError`, `CoreResult`                              |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                      |
//! |---------|-------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.         |

pub mod candidate;
pub mod error;
pub mod geo;
pub mod ids;
pub mod mbr;
pub mod path;
pub mod time;
pub mod trajectory;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use candidate::CandidatePoint;
pub use error::{CoreError, CoreResult};
pub use geo::{
    EARTH_MEAN_RADIUS_M, LAT_PER_METER, LNG_PER_METER, Projection, SPoint, point_along_segment,
    project_to_line, project_to_segment,
};
pub use ids::EdgeId;
pub use mbr::Mbr;
pub use path::{Path, PathEntity, pid_for};
pub use time::Timestamp;
pub use trajectory::{PointData, STPoint, Trajectory, tid_for};
