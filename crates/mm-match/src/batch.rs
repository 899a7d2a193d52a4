//! Batch matching over many trajectories.
//!
//! Trajectories are independent given a read-only network, so the batch is
//! embarrassingly parallel.  With the `parallel` feature the work is spread
//! over the Rayon pool; without it the same API degrades to a sequential
//! loop.

use mm_core::Trajectory;

use crate::error::MatchResult;
use crate::matcher::MapMatcher;

/// Match every trajectory of `trajs`, returning per-trajectory results in
/// input order.  One failing trajectory does not affect the others.
#[cfg(feature = "parallel")]
pub fn match_batch<M>(matcher: &M, trajs: &[Trajectory]) -> Vec<MatchResult<Trajectory>>
where
    M: MapMatcher + Sync,
{
    use rayon::prelude::*;
    trajs
        .par_iter()
        .map(|traj| matcher.match_trajectory(traj))
        .collect()
}

/// Match every trajectory of `trajs`, returning per-trajectory results in
/// input order.  One failing trajectory does not affect the others.
#[cfg(not(feature = "parallel"))]
pub fn match_batch<M>(matcher: &M, trajs: &[Trajectory]) -> Vec<MatchResult<Trajectory>>
where
    M: MapMatcher + Sync,
{
    trajs
        .iter()
        .map(|traj| matcher.match_trajectory(traj))
        .collect()
}
