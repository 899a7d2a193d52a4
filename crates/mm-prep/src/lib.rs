//! `mm-prep` — trajectory preprocessing.
//!
//! Raw GPS corpora are dirty: teleporting outliers, multi-hour recording
//! gaps, parked-vehicle clusters.  This crate cleans and cuts trajectories
//! before they reach the map matcher.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                  |
//! |--------------|-----------------------------------------------------------|
//! | [`noise`]    | `NoiseFilter` trait, `HeuristicFilter`, `StFilter`        |
//! | [`stay`]     | `StayPointDetector` trait, classic and density detectors  |
//! | [`segment`]  | `Segmentation` trait, time-interval and stay-point cutters |
//! | [`simplify`] | `DouglasPeucker` polyline simplification                  |
//!
//! A typical pipeline: filter → segment → match:
//!
//! ```rust,ignore
//! let filters: Vec<Box<dyn NoiseFilter>> = vec![
//!     Box::new(StFilter::new(mbr, start, end)),
//!     Box::new(HeuristicFilter::new(35.0)),
//! ];
//! let segmentation = TimeIntervalSegmentation::new(360.0);
//! ```
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on parameter structs.      |

pub mod noise;
pub mod segment;
pub mod simplify;
pub mod stay;


pub use noise::{HeuristicFilter, NoiseFilter, StFilter};
pub use segment::{Segmentation, StayPointSegmentation, TimeIntervalSegmentation};
pub use simplify::DouglasPeucker;
pub use stay::{ClassicStayPointDetector, DensityStayPointDetector, StayPointDetector};
