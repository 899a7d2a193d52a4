//! `mm-network` — road network graph, spatial indexing, and routing.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                     |
//! |-------------|--------------------------------------------------------------|
//! | [`vertex`]  | `VertexKey` — exact-coordinate graph keys                    |
//! | [`network`] | `RoadNetwork` (adjacency + eid index + R-tree), `Edge`       |
//! | [`router`]  | `find_shortest_path` between candidates, `Route`, `RoutingWeight` |
//! | [`error`]   | `NetworkError`, `NetworkResult<T>`                           |
//!
//! # Consistency model
//!
//! A [`RoadNetwork`] keeps four structures in step: the adjacency lists, the
//! `eid → Edge` table, the endpoint index, and the R-tree over edge bounding
//! rectangles.  `add_edge`/`remove_edge` are the only mutation paths and
//! update all four together.  Mutation is construction-phase only — matching
//! holds the network by shared reference.
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                        |
//! |---------|---------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public value types.      |

pub mod error;
pub mod network;
pub mod router;
pub mod vertex;


pub use error::{NetworkError, NetworkResult};
pub use network::{Edge, RoadNetwork};
pub use router::{Route, RoutingWeight, find_shortest_path};
pub use vertex::VertexKey;
