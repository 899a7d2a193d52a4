//! Path reconstruction — turning a matched trajectory into timed edge paths.
//!
//! A matched trajectory pins each observation to a candidate on some edge;
//! this module walks consecutive matches, routes across edge changes, and
//! splits the observation time interval over the traversed edges
//! proportionally to distance.  Gaps and unroutable transitions close the
//! running path, so one trajectory can yield several [`Path`]s.
//!
//! The enter time of a path's first entity and the leave time of its last
//! are only as accurate as the bracketing observations.

use chrono::Duration;
use mm_core::{CandidatePoint, Path, PathEntity, Timestamp, Trajectory, pid_for};
use mm_network::{NetworkError, RoadNetwork, RoutingWeight, VertexKey, find_shortest_path};

use crate::error::MatchResult;

/// Reconstruct the timed edge paths of `mm_traj` (a trajectory whose points
/// carry matched candidates).
///
/// A path buffer is emitted only when it holds at least `min_entities`
/// entries; the traditional threshold of 3 rejects degenerate one/two-edge
/// fragments.
pub fn construct_path(
    rn: &RoadNetwork,
    mm_traj: &Trajectory,
    weight: RoutingWeight,
    min_entities: usize,
) -> MatchResult<Vec<Path>> {
    let pts = &mm_traj.pts;
    let mut paths: Vec<Path> = Vec::new();
    let mut entities: Vec<PathEntity> = Vec::new();

    // Nothing to reconstruct without a matched point.
    let Some(start_idx) = pts.iter().position(|p| p.candidate().is_some()) else {
        return Ok(paths);
    };
    let mut pre_edge_enter_time = pts[start_idx].time;

    for i in (start_idx + 1)..pts.len() {
        let pre_pt = &pts[i - 1];
        let cur_pt = &pts[i];

        // unmatched → anything: the edge (if any) resumes at the current time.
        let Some(pre_candi) = pre_pt.candidate() else {
            pre_edge_enter_time = cur_pt.time;
            continue;
        };
        // matched → unmatched: close the running edge at the previous time.
        let Some(cur_candi) = cur_pt.candidate() else {
            entities.push(PathEntity::new(pre_edge_enter_time, pre_pt.time, pre_candi.eid));
            flush(&mut entities, &mut paths, &mm_traj.oid, min_entities);
            continue;
        };
        // matched → matched on the same edge: no new information yet.
        if pre_candi.eid == cur_candi.eid {
            continue;
        }
        // matched → matched across edges: route between the candidates.
        let route = match find_shortest_path(rn, pre_candi, cur_candi, weight) {
            Ok(route) => route,
            Err(NetworkError::NoPath { .. }) => {
                entities.push(PathEntity::new(pre_edge_enter_time, pre_pt.time, pre_candi.eid));
                flush(&mut entities, &mut paths, &mm_traj.oid, min_entities);
                pre_edge_enter_time = cur_pt.time;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let (dist_to_p_entrance, dist_to_p_exit) =
            partial_distances(rn, pre_candi, cur_candi, &route.vertices)?;
        // With the length weight the router's cost is exactly
        // entrance + inner + exit, all in meters.
        let total_dist = route.cost;
        let delta_ms = (cur_pt.time - pre_pt.time).num_milliseconds();

        if total_dist == 0.0 {
            // Both observations collapse onto the same vertex.
            entities.push(PathEntity::new(pre_edge_enter_time, cur_pt.time, pre_candi.eid));
            pre_edge_enter_time = cur_pt.time;
        } else {
            let pre_edge_leave_time =
                offset_time(pre_pt.time, delta_ms, dist_to_p_entrance / total_dist);
            entities.push(PathEntity::new(pre_edge_enter_time, pre_edge_leave_time, pre_candi.eid));
            let cur_edge_enter_time =
                offset_time(cur_pt.time, -delta_ms, dist_to_p_exit / total_dist);
            interpolate_inner_path(
                rn,
                &route.vertices,
                total_dist - dist_to_p_entrance - dist_to_p_exit,
                pre_edge_leave_time,
                cur_edge_enter_time,
                &mut entities,
            )?;
            pre_edge_enter_time = cur_edge_enter_time;
        }
    }

    // The trailing matched edge closes at the last observation.
    if let Some(last) = pts.last()
        && let Some(candi) = last.candidate()
    {
        entities.push(PathEntity::new(pre_edge_enter_time, last.time, candi.eid));
        flush(&mut entities, &mut paths, &mm_traj.oid, min_entities);
    }
    Ok(paths)
}

/// Remaining distance on the previous candidate's edge toward the path, and
/// traveled distance on the current candidate's edge from the path.
///
/// Directed networks always exit an edge through its end vertex and enter
/// through the start vertex.  Undirected networks consult the path's first
/// and last vertices to see which end of each edge faces the route.
fn partial_distances(
    rn: &RoadNetwork,
    pre_candi: &CandidatePoint,
    cur_candi: &CandidatePoint,
    path: &[VertexKey],
) -> MatchResult<(f64, f64)> {
    let pre_edge = rn.edge(pre_candi.eid)?;
    let cur_edge = rn.edge(cur_candi.eid)?;
    if rn.is_directed() {
        return Ok((pre_edge.length - pre_candi.offset, cur_candi.offset));
    }
    // Cross-edge routes always carry at least one vertex.
    let entrance_vertex = path.first().copied().ok_or(NetworkError::NoPath {
        from: pre_candi.eid,
        to: cur_candi.eid,
    })?;
    let exit_vertex = path.last().copied().ok_or(NetworkError::NoPath {
        from: pre_candi.eid,
        to: cur_candi.eid,
    })?;
    let dist_to_p_entrance = if pre_edge.u == entrance_vertex {
        pre_candi.offset
    } else {
        pre_edge.length - pre_candi.offset
    };
    let dist_to_p_exit = if cur_edge.u == exit_vertex {
        cur_candi.offset
    } else {
        cur_edge.length - cur_candi.offset
    };
    Ok((dist_to_p_entrance, dist_to_p_exit))
}

/// Spread `enter_time..leave_time` over the inner path's edges,
/// proportionally to each edge's length.  The last edge's leave time is
/// pinned to `leave_time` to absorb rounding.
fn interpolate_inner_path(
    rn: &RoadNetwork,
    path: &[VertexKey],
    dist_inner: f64,
    enter_time: Timestamp,
    leave_time: Timestamp,
    entities: &mut Vec<PathEntity>,
) -> MatchResult<()> {
    let hops = path.len().saturating_sub(1);
    let delta_ms = (leave_time - enter_time).num_milliseconds();
    let mut edge_enter_time = enter_time;
    for (i, w) in path.windows(2).enumerate() {
        let edge = rn
            .edge_between(w[0], w[1])
            .ok_or(NetworkError::NoEdgeBetween { u: w[0], v: w[1] })?;
        let edge_leave_time = if i == hops - 1 {
            leave_time
        } else {
            offset_time(edge_enter_time, delta_ms, edge.length / dist_inner)
        };
        entities.push(PathEntity::new(edge_enter_time, edge_leave_time, edge.eid));
        edge_enter_time = edge_leave_time;
    }
    Ok(())
}

/// Emit the buffered entities as a [`Path`] when there are enough of them;
/// either way the buffer is cleared.
fn flush(entities: &mut Vec<PathEntity>, paths: &mut Vec<Path>, oid: &str, min_entities: usize) {
    if entities.len() >= min_entities {
        let entities = std::mem::take(entities);
        paths.push(Path::new(oid, pid_for(oid, &entities), entities));
    } else {
        entities.clear();
    }
}

/// `base + delta_ms * fraction`, rounded to the millisecond.
fn offset_time(base: Timestamp, delta_ms: i64, fraction: f64) -> Timestamp {
    base + Duration::milliseconds((delta_ms as f64 * fraction).round() as i64)
}
