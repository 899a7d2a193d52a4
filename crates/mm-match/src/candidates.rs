//! Candidate generation — projecting a raw observation onto nearby edges.

use mm_core::{CandidatePoint, Mbr, SPoint, STPoint, project_to_segment};
use mm_network::{Edge, RoadNetwork};

/// Enumerate the edges within `search_dist` meters of `pt` and project the
/// observation onto each.
///
/// The spatial index is queried with a degree-space box of `search_dist`
/// half-extents, then candidates whose projection error exceeds
/// `search_dist` are discarded.  Returns `None` when nothing qualifies —
/// the observation is a gap.
pub fn get_candidates(
    pt: &STPoint,
    rn: &RoadNetwork,
    search_dist: f64,
) -> Option<Vec<CandidatePoint>> {
    let mbr = Mbr::around(pt.point(), search_dist);
    let candidates: Vec<CandidatePoint> = rn
        .range_query(&mbr)
        .into_iter()
        .filter_map(|eid| rn.edge(eid).ok())
        .map(|edge| project_onto_edge(pt.point(), edge))
        .filter(|candi| candi.error <= search_dist)
        .collect();
    if candidates.is_empty() {
        None
    } else {
        Some(candidates)
    }
}

/// Project `raw` onto the nearest segment of the edge's polyline.
///
/// The offset is the cumulative polyline length up to the chosen segment
/// plus the along-segment distance to the projection.  When two segments tie
/// on distance the first wins.
fn project_onto_edge(raw: SPoint, edge: &Edge) -> CandidatePoint {
    let mut best_idx = 0;
    let mut best = project_to_segment(edge.coords[0], edge.coords[1], raw);
    for (i, w) in edge.coords.windows(2).enumerate().skip(1) {
        let proj = project_to_segment(w[0], w[1], raw);
        if proj.dist_m < best.dist_m {
            best_idx = i;
            best = proj;
        }
    }
    let mut offset: f64 = edge.coords[..=best_idx]
        .windows(2)
        .map(|w| w[0].distance_m(w[1]))
        .sum();
    offset += edge.coords[best_idx].distance_m(best.point);
    CandidatePoint::new(best.point.lat, best.point.lng, edge.eid, best.dist_m, offset)
}
