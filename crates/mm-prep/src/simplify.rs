//! Douglas–Peucker trajectory simplification.

use mm_core::{STPoint, project_to_line};

/// Recursive Douglas–Peucker over the *line* projection distance (the
/// projection may fall outside the chord, which is what the algorithm
/// wants for hairpin shapes).
///
/// Runs of 4 or fewer points are returned unchanged (fewer than 3 interior
/// distances to compare); a longer run whose interior stays within
/// `epsilon_m` of the chord collapses to its endpoints.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DouglasPeucker {
    pub epsilon_m: f64,
}

impl DouglasPeucker {
    pub fn new(epsilon_m: f64) -> Self {
        Self { epsilon_m }
    }

    pub fn simplify(&self, pts: &[STPoint]) -> Vec<STPoint> {
        if pts.len() <= 4 {
            return pts.to_vec();
        }
        let first = pts[0].point();
        let last = pts[pts.len() - 1].point();
        // First-seen maximum among the interior points.
        let mut max_idx = 1;
        let mut max_dist = f64::NEG_INFINITY;
        for (i, pt) in pts.iter().enumerate().take(pts.len() - 1).skip(1) {
            let dist = project_to_line(first, last, pt.point()).dist_m;
            if dist > max_dist {
                max_idx = i;
                max_dist = dist;
            }
        }
        if max_dist >= self.epsilon_m {
            let mut left = self.simplify(&pts[..=max_idx]);
            let right = self.simplify(&pts[max_idx..]);
            left.pop(); // the split point is the first element of `right`
            left.extend(right);
            left
        } else {
            vec![pts[0].clone(), pts[pts.len() - 1].clone()]
        }
    }
}
