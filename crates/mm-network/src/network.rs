//! Road network representation.
//!
//! # Data layout
//!
//! The graph is vertex-keyed: a vertex *is* its exact `(lng, lat)` pair
//! ([`VertexKey`]), so loaders can build the network straight from edge
//! polylines without a separate node table.  Four structures are maintained
//! together:
//!
//! - `adj` — per-vertex outgoing `(neighbor, eid)` lists, in insertion order
//!   (iteration order is part of the determinism contract);
//! - `edges` — the `eid → Edge` table holding polyline and length;
//! - `by_endpoints` — `(u, v) → eid`, both orientations for undirected
//!   networks;
//! - `spatial_idx` — an R-tree (via `rstar`) of edge bounding rectangles,
//!   keyed by `eid`, answering [`range_query`](RoadNetwork::range_query).
//!
//! `add_edge` and `remove_edge` are the only mutation paths and update all
//! four structures as one operation.

use log::info;
use mm_core::{EdgeId, Mbr, SPoint};
use rstar::{AABB, RTree, RTreeObject};
use rustc_hash::FxHashMap;

use crate::error::{NetworkError, NetworkResult};
use crate::vertex::VertexKey;

// ── Edge ──────────────────────────────────────────────────────────────────────

/// A road segment: a polyline with a globally unique id.
///
/// In a directed network the reverse carriageway is a distinct edge with its
/// own id and reversed polyline.  `u`/`v` are the keys of the polyline's
/// first and last coordinates.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Edge {
    pub eid: EdgeId,
    pub u: VertexKey,
    pub v: VertexKey,
    /// Shape of the segment; at least 2 coordinates.
    pub coords: Vec<SPoint>,
    /// Polyline length in meters (sum of haversine hops).
    pub length: f64,
}

impl Edge {
    /// Bounding rectangle of the polyline.
    pub fn mbr(&self) -> Mbr {
        Mbr::of_points(self.coords.iter().copied())
    }
}

fn polyline_length(coords: &[SPoint]) -> f64 {
    coords.windows(2).map(|w| w[0].distance_m(w[1])).sum()
}

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// Entry stored in the edge R-tree: the edge's MBR as an `[lng, lat]` box.
/// Equality is on `eid` alone so individual edges can be removed.
#[derive(Clone, Debug)]
struct EdgeEnvelope {
    eid: EdgeId,
    aabb: AABB<[f64; 2]>,
}

impl EdgeEnvelope {
    fn new(eid: EdgeId, mbr: &Mbr) -> Self {
        Self {
            eid,
            aabb: AABB::from_corners([mbr.min_lng, mbr.min_lat], [mbr.max_lng, mbr.max_lat]),
        }
    }
}

impl PartialEq for EdgeEnvelope {
    fn eq(&self, other: &Self) -> bool {
        self.eid == other.eid
    }
}

impl RTreeObject for EdgeEnvelope {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

// ── RoadNetwork ───────────────────────────────────────────────────────────────

/// Directed or undirected road graph with an edge spatial index.
///
/// Read-only during matching; all mutation happens while the loader owns the
/// network exclusively.
#[derive(Clone)]
pub struct RoadNetwork {
    directed: bool,
    adj: FxHashMap<VertexKey, Vec<(VertexKey, EdgeId)>>,
    edges: FxHashMap<EdgeId, Edge>,
    by_endpoints: FxHashMap<(VertexKey, VertexKey), EdgeId>,
    spatial_idx: RTree<EdgeEnvelope>,
}

impl RoadNetwork {
    /// An empty directed network.
    pub fn directed() -> Self {
        Self::new(true)
    }

    /// An empty undirected network.
    pub fn undirected() -> Self {
        Self::new(false)
    }

    fn new(directed: bool) -> Self {
        Self {
            directed,
            adj: FxHashMap::default(),
            edges: FxHashMap::default(),
            by_endpoints: FxHashMap::default(),
            spatial_idx: RTree::new(),
        }
    }

    #[inline]
    pub fn is_directed(&self) -> bool {
        self.directed
    }

    pub fn vertex_count(&self) -> usize {
        self.adj.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ── Mutation (construction phase) ─────────────────────────────────────

    /// Insert an edge.  `u`/`v` are derived from the polyline endpoints, the
    /// length from the polyline itself; graph, eid table, endpoint index,
    /// and R-tree are updated together.
    ///
    /// In an undirected network the single edge is traversable both ways and
    /// reachable under both endpoint orders.
    pub fn add_edge(&mut self, eid: EdgeId, coords: Vec<SPoint>) -> NetworkResult<()> {
        if coords.len() < 2 {
            return Err(NetworkError::InvalidPolyline(eid));
        }
        if self.edges.contains_key(&eid) {
            return Err(NetworkError::DuplicateEdge(eid));
        }
        let u = VertexKey::of(coords[0]);
        let v = VertexKey::of(coords[coords.len() - 1]);
        let edge = Edge {
            eid,
            u,
            v,
            length: polyline_length(&coords),
            coords,
        };

        self.spatial_idx.insert(EdgeEnvelope::new(eid, &edge.mbr()));
        self.adj.entry(u).or_default().push((v, eid));
        self.adj.entry(v).or_default();
        self.by_endpoints.insert((u, v), eid);
        if !self.directed {
            self.adj.entry(v).or_default().push((u, eid));
            self.by_endpoints.insert((v, u), eid);
        }
        self.edges.insert(eid, edge);
        Ok(())
    }

    /// Remove the edge between `u` and `v`, returning it.
    pub fn remove_edge(&mut self, u: VertexKey, v: VertexKey) -> NetworkResult<Edge> {
        let eid = self
            .by_endpoints
            .remove(&(u, v))
            .ok_or(NetworkError::NoEdgeBetween { u, v })?;
        if !self.directed {
            self.by_endpoints.remove(&(v, u));
        }
        // The eid table, adjacency, and endpoint index are kept in lockstep,
        // so the remaining removals cannot miss.
        let edge = self
            .edges
            .remove(&eid)
            .ok_or(NetworkError::EdgeNotFound(eid))?;
        if let Some(out) = self.adj.get_mut(&edge.u) {
            out.retain(|&(_, e)| e != eid);
        }
        if !self.directed {
            if let Some(out) = self.adj.get_mut(&edge.v) {
                out.retain(|&(_, e)| e != eid);
            }
        }
        let _ = self.spatial_idx.remove(&EdgeEnvelope::new(eid, &edge.mbr()));
        Ok(edge)
    }

    /// Double every edge of an undirected network into a directed one.
    ///
    /// Forward edges keep their eid; backward edges get fresh ids from
    /// `max(eid)+1` upward (assigned in ascending forward-eid order, so the
    /// result is reproducible) and reversed polylines.  Both directions are
    /// spatially indexed with the original MBR.  A directed network is
    /// returned as a plain clone.
    pub fn to_directed(&self) -> RoadNetwork {
        if self.directed {
            return self.clone();
        }
        let mut next_eid = self.edges.keys().map(|e| e.0).max().map_or(0, |m| m + 1);
        let mut rn = RoadNetwork::directed();
        let mut eids: Vec<EdgeId> = self.edges.keys().copied().collect();
        eids.sort_unstable();
        for eid in eids {
            let edge = &self.edges[&eid];
            // add_edge cannot fail here: polylines were validated on insert
            // and the fresh backward ids cannot collide.
            let _ = rn.add_edge(eid, edge.coords.clone());
            let mut backward = edge.coords.clone();
            backward.reverse();
            let _ = rn.add_edge(EdgeId(next_eid), backward);
            next_eid += 1;
        }
        info!(
            "to_directed: {} vertices, {} edges",
            rn.vertex_count(),
            rn.edge_count()
        );
        rn
    }

    // ── Lookup ────────────────────────────────────────────────────────────

    /// The edge with the given id.
    pub fn edge(&self, eid: EdgeId) -> NetworkResult<&Edge> {
        self.edges.get(&eid).ok_or(NetworkError::EdgeNotFound(eid))
    }

    /// The `(u, v)` vertex-key pair of an edge.
    pub fn edge_endpoints(&self, eid: EdgeId) -> NetworkResult<(VertexKey, VertexKey)> {
        self.edge(eid).map(|e| (e.u, e.v))
    }

    /// The edge connecting `u` to `v`, if any.  In an undirected network
    /// both endpoint orders resolve to the same edge.
    pub fn edge_between(&self, u: VertexKey, v: VertexKey) -> Option<&Edge> {
        self.by_endpoints.get(&(u, v)).map(|eid| &self.edges[eid])
    }

    /// Edge lookup for ids handed out by this network's own adjacency lists.
    /// Panics on a foreign id, like direct indexing would.
    pub(crate) fn edge_by_id(&self, eid: EdgeId) -> &Edge {
        &self.edges[&eid]
    }

    /// Outgoing `(neighbor, eid)` pairs of `v`, in insertion order.
    pub fn neighbors(&self, v: VertexKey) -> impl Iterator<Item = (VertexKey, EdgeId)> + '_ {
        self.adj.get(&v).into_iter().flatten().copied()
    }

    #[inline]
    pub fn contains_vertex(&self, v: VertexKey) -> bool {
        self.adj.contains_key(&v)
    }

    // ── Spatial queries ───────────────────────────────────────────────────

    /// Ids of all edges whose MBR intersects `mbr`.  Never fails; unknown
    /// regions simply return an empty list.
    pub fn range_query(&self, mbr: &Mbr) -> Vec<EdgeId> {
        let query = AABB::from_corners([mbr.min_lng, mbr.min_lat], [mbr.max_lng, mbr.max_lat]);
        self.spatial_idx
            .locate_in_envelope_intersecting(&query)
            .map(|entry| entry.eid)
            .collect()
    }
}

impl std::fmt::Debug for RoadNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoadNetwork")
            .field("directed", &self.directed)
            .field("vertices", &self.vertex_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}
