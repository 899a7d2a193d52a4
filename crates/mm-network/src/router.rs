//! Shortest paths between candidate points.
//!
//! [`find_shortest_path`] connects two partial-edge positions: the cost
//! always includes the remaining distance on the source edge and the
//! traveled distance on the target edge, with an A\* search over the vertex
//! graph in between.  Undirected networks try all four endpoint pairings and
//! keep the cheapest.
//!
//! Unreachable pairs report [`NetworkError::NoPath`]; the map matcher
//! recovers from that locally by dropping the transition.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use mm_core::CandidatePoint;
use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;

use crate::error::{NetworkError, NetworkResult};
use crate::network::{Edge, RoadNetwork};
use crate::vertex::VertexKey;

// ── Routing weight ────────────────────────────────────────────────────────────

/// Which per-edge attribute the A\* search minimizes.
///
/// Only [`Length`](RoutingWeight::Length) exists today; the enum keeps the
/// knob explicit in configurations and call sites.  With `Length`, the cost
/// returned by [`find_shortest_path`] equals the geometric travel distance in
/// meters, which both the transition probability and the path-time
/// interpolation rely on, and the haversine heuristic is admissible (a
/// polyline is never shorter than the great circle between its endpoints).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoutingWeight {
    #[default]
    Length,
}

impl RoutingWeight {
    /// Cost of traversing `edge` under this weight.
    #[inline]
    pub fn cost(self, edge: &Edge) -> f64 {
        match self {
            RoutingWeight::Length => edge.length,
        }
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// The result of a candidate-to-candidate routing query.
#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    /// Total cost: source partial edge + inner path + target partial edge.
    pub cost: f64,
    /// Vertices of the inner path, source side first.  Empty when both
    /// candidates sit on the same edge; a single vertex when the source
    /// edge's exit is the target edge's entrance.
    pub vertices: Vec<VertexKey>,
}

// ── find_shortest_path ────────────────────────────────────────────────────────

/// Shortest path from `prev` to `cur` under `weight`.
pub fn find_shortest_path(
    rn: &RoadNetwork,
    prev: &CandidatePoint,
    cur: &CandidatePoint,
    weight: RoutingWeight,
) -> NetworkResult<Route> {
    if rn.is_directed() {
        find_directed(rn, prev, cur, weight)
    } else {
        find_undirected(rn, prev, cur, weight)
    }
}

fn find_directed(
    rn: &RoadNetwork,
    prev: &CandidatePoint,
    cur: &CandidatePoint,
    weight: RoutingWeight,
) -> NetworkResult<Route> {
    let no_path = NetworkError::NoPath {
        from: prev.eid,
        to: cur.eid,
    };
    // Same edge: reachable only without leaving the edge, i.e. when the
    // target projection is not behind the source one.
    if prev.eid == cur.eid {
        if prev.offset <= cur.offset {
            return Ok(Route {
                cost: cur.offset - prev.offset,
                vertices: vec![],
            });
        }
        return Err(no_path);
    }
    let prev_edge = rn.edge(prev.eid)?;
    let cur_edge = rn.edge(cur.eid)?;
    match astar(rn, prev_edge.v, cur_edge.u, weight) {
        Some((inner_cost, vertices)) => Ok(Route {
            cost: (prev_edge.length - prev.offset) + inner_cost + cur.offset,
            vertices,
        }),
        None => Err(no_path),
    }
}

fn find_undirected(
    rn: &RoadNetwork,
    prev: &CandidatePoint,
    cur: &CandidatePoint,
    weight: RoutingWeight,
) -> NetworkResult<Route> {
    if prev.eid == cur.eid {
        return Ok(Route {
            cost: (cur.offset - prev.offset).abs(),
            vertices: vec![],
        });
    }
    let prev_edge = rn.edge(prev.eid)?;
    let cur_edge = rn.edge(cur.eid)?;
    // Either end of either edge may face the path; try all four pairings,
    // each with its own partial-edge distances, and keep the first minimum.
    let pairings = [
        (prev_edge.u, cur_edge.u, prev.offset, cur.offset),
        (
            prev_edge.u,
            cur_edge.v,
            prev.offset,
            cur_edge.length - cur.offset,
        ),
        (
            prev_edge.v,
            cur_edge.u,
            prev_edge.length - prev.offset,
            cur.offset,
        ),
        (
            prev_edge.v,
            cur_edge.v,
            prev_edge.length - prev.offset,
            cur_edge.length - cur.offset,
        ),
    ];
    let mut best: Option<Route> = None;
    for (src, dst, dist_to_src, dist_to_dst) in pairings {
        if let Some((inner_cost, vertices)) = astar(rn, src, dst, weight) {
            let cost = dist_to_src + inner_cost + dist_to_dst;
            if best.as_ref().is_none_or(|b| cost < b.cost) {
                best = Some(Route { cost, vertices });
            }
        }
    }
    best.ok_or(NetworkError::NoPath {
        from: prev.eid,
        to: cur.eid,
    })
}

// ── A* internals ──────────────────────────────────────────────────────────────

/// Heap entry: `(f-score, insertion counter, vertex, g at push)`.  The
/// counter breaks f-score ties deterministically in insertion order; the
/// pushed g-score identifies stale entries.
type HeapEntry = Reverse<(OrderedFloat<f64>, u64, VertexKey, OrderedFloat<f64>)>;

/// A\* over the vertex graph with the haversine great-circle heuristic.
///
/// Returns the accumulated edge cost and the vertex path `start..=goal`
/// (`[start]` when the two coincide), or `None` when `goal` is unreachable.
fn astar(
    rn: &RoadNetwork,
    start: VertexKey,
    goal: VertexKey,
    weight: RoutingWeight,
) -> Option<(f64, Vec<VertexKey>)> {
    if !rn.contains_vertex(start) || !rn.contains_vertex(goal) {
        return None;
    }
    if start == goal {
        return Some((0.0, vec![start]));
    }

    let heuristic = |v: VertexKey| v.point().distance_m(goal.point());

    let mut g_score: FxHashMap<VertexKey, f64> = FxHashMap::default();
    let mut came_from: FxHashMap<VertexKey, VertexKey> = FxHashMap::default();
    let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::new();
    let mut counter = 0u64;

    g_score.insert(start, 0.0);
    heap.push(Reverse((
        OrderedFloat(heuristic(start)),
        counter,
        start,
        OrderedFloat(0.0),
    )));

    while let Some(Reverse((_, _, node, g_pushed))) = heap.pop() {
        let g_node = g_score[&node];
        // Skip stale heap entries.
        if g_pushed.0 > g_node {
            continue;
        }
        if node == goal {
            return Some((g_node, reconstruct(&came_from, start, goal)));
        }
        for (neighbor, eid) in rn.neighbors(node) {
            let tentative = g_node + weight.cost(rn.edge_by_id(eid));
            if g_score.get(&neighbor).is_none_or(|&g| tentative < g) {
                g_score.insert(neighbor, tentative);
                came_from.insert(neighbor, node);
                counter += 1;
                heap.push(Reverse((
                    OrderedFloat(tentative + heuristic(neighbor)),
                    counter,
                    neighbor,
                    OrderedFloat(tentative),
                )));
            }
        }
    }
    None
}

fn reconstruct(
    came_from: &FxHashMap<VertexKey, VertexKey>,
    start: VertexKey,
    goal: VertexKey,
) -> Vec<VertexKey> {
    let mut vertices = vec![goal];
    let mut cur = goal;
    while cur != start {
        cur = came_from[&cur];
        vertices.push(cur);
    }
    vertices.reverse();
    vertices
}
