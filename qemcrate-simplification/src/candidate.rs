//! Collapse candidate evaluation
//!
//! A candidate is one edge of a triangle together with the point its two
//! endpoints would merge into and the quadric error of that point. An edge is
//! only eligible when moving both endpoints to the new point leaves every
//! surviving neighbor triangle well shaped and facing roughly the same way.

use crate::mesh_state::MeshState;
use crate::quadric::{triangle_normal, DIRECTION_EPSILON};
use qemcrate_core::Point3d;

/// Edge directions more parallel than this make a sliver triangle.
const SLIVER_DOT: f64 = 0.999;

/// Normal dot threshold at the default aggressiveness of 7.
const BASE_NORMAL_DOT: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Candidate {
    /// Edge `v[corner] -> v[(corner + 1) % 3]` of the owning triangle.
    pub corner: usize,
    pub cost: f64,
    pub target: Point3d,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct CandidateEvaluator {
    min_normal_dot: f64,
}

impl CandidateEvaluator {
    /// Higher aggressiveness tolerates more rotation of neighboring faces.
    pub fn new(aggressiveness: f64) -> Self {
        let min_normal_dot = (BASE_NORMAL_DOT * 7.0 / aggressiveness.max(1.0)).clamp(0.0, 0.9);
        Self { min_normal_dot }
    }

    pub fn min_normal_dot(&self) -> f64 {
        self.min_normal_dot
    }

    /// Merge point and error for collapsing the edge `a`-`b`.
    pub fn edge_cost(&self, state: &MeshState, a: usize, b: usize) -> (Point3d, f64) {
        let va = &state.vertices[a];
        let vb = &state.vertices[b];
        (va.quadric + vb.quadric).optimal_collapse(&va.position, &vb.position)
    }

    /// Whether moving `moved` to `target` (with `other` merging into it)
    /// would degenerate or flip one of `moved`'s surviving triangles.
    pub fn would_flip(&self, state: &MeshState, moved: usize, other: usize, target: &Point3d) -> bool {
        let origin = &state.vertices[moved].position;
        for r in state.refs_of(moved) {
            let tri = &state.triangles[r.tid];
            if tri.deleted || tri.contains(other) {
                continue;
            }
            let p1 = &state.vertices[tri.v[(r.corner + 1) % 3]].position;
            let p2 = &state.vertices[tri.v[(r.corner + 2) % 3]].position;

            let (Some(d1), Some(d2)) = (
                (p1 - target).try_normalize(DIRECTION_EPSILON),
                (p2 - target).try_normalize(DIRECTION_EPSILON),
            ) else {
                return true;
            };
            if d1.dot(&d2).abs() > SLIVER_DOT {
                return true;
            }
            let Some(new_normal) = d1.cross(&d2).try_normalize(DIRECTION_EPSILON) else {
                return true;
            };
            // A face that is already degenerate has no orientation to lose.
            if let Some(old_normal) = triangle_normal(origin, p1, p2) {
                if new_normal.dot(&old_normal) < self.min_normal_dot {
                    return true;
                }
            }
        }
        false
    }

    /// Edge `a`-`b` may collapse to `target` without flipping either side.
    pub fn is_valid(&self, state: &MeshState, a: usize, b: usize, target: &Point3d) -> bool {
        !self.would_flip(state, a, b, target) && !self.would_flip(state, b, a, target)
    }

    /// Cheapest valid edge of a live triangle.
    pub fn best_edge(&self, state: &MeshState, tid: usize) -> Option<Candidate> {
        let tri = &state.triangles[tid];
        let mut best: Option<Candidate> = None;
        for corner in 0..3 {
            let (a, b) = (tri.v[corner], tri.v[(corner + 1) % 3]);
            let (target, cost) = self.edge_cost(state, a, b);
            if best.is_some_and(|c| c.cost <= cost) {
                continue;
            }
            if self.is_valid(state, a, b, &target) {
                best = Some(Candidate { corner, cost, target });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_state::tests::fan;
    use approx::assert_relative_eq;
    use qemcrate_core::Point3f;

    fn seeded(vertices: &[Point3f], triangles: &[[usize; 3]]) -> MeshState {
        let mut state = MeshState::default();
        state.load(vertices, triangles).unwrap();
        state.seed_quadrics(1000.0);
        state
    }

    #[test]
    fn test_normal_threshold() {
        assert_relative_eq!(CandidateEvaluator::new(7.0).min_normal_dot(), 0.2, epsilon = 1e-12);
        assert_relative_eq!(CandidateEvaluator::new(14.0).min_normal_dot(), 0.1, epsilon = 1e-12);
        assert_relative_eq!(CandidateEvaluator::new(0.0).min_normal_dot(), 0.9);
        assert_relative_eq!(CandidateEvaluator::new(1.0).min_normal_dot(), 0.9);
        assert_relative_eq!(CandidateEvaluator::new(1e9).min_normal_dot(), 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_interior_collapse_is_free() {
        let (v, t) = fan();
        let state = seeded(&v, &t);
        let evaluator = CandidateEvaluator::new(7.0);
        // Center into a corner stays on the plane and on the border lines.
        let (target, cost) = evaluator.edge_cost(&state, 0, 4);
        assert_relative_eq!(cost, 0.0, epsilon = 1e-9);
        assert_relative_eq!(target.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(target.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_border_edge_is_expensive_off_border() {
        let (v, t) = fan();
        let state = seeded(&v, &t);
        let evaluator = CandidateEvaluator::new(7.0);
        // Two border vertices on different sides: any merge point leaves a border line.
        let (_, cost) = evaluator.edge_cost(&state, 1, 3);
        assert!(cost > 100.0);
    }

    #[test]
    fn test_flip_detection() {
        let (v, t) = fan();
        let state = seeded(&v, &t);
        let evaluator = CandidateEvaluator::new(7.0);
        // Dragging the center past the [0, 1] edge flips triangle [0, 1, 4].
        assert!(evaluator.would_flip(&state, 4, 2, &Point3d::new(1.0, -1.0, 0.0)));
        // Moving it inside the square keeps every face upright.
        assert!(!evaluator.would_flip(&state, 4, 2, &Point3d::new(1.2, 1.1, 0.0)));
    }

    #[test]
    fn test_sliver_rejected() {
        let (v, t) = fan();
        let state = seeded(&v, &t);
        let evaluator = CandidateEvaluator::new(7.0);
        // On the line through corners 0 and 1 triangle [0, 1, 4] collapses to a segment.
        assert!(evaluator.would_flip(&state, 4, 2, &Point3d::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_best_edge_of_fan_triangle() {
        let (v, t) = fan();
        let state = seeded(&v, &t);
        let evaluator = CandidateEvaluator::new(7.0);
        let c = evaluator.best_edge(&state, 0).unwrap();
        // Only the two spokes are cheap; the border edge [0, 1] is not chosen.
        assert_ne!(c.corner, 0);
        assert_relative_eq!(c.cost, 0.0, epsilon = 1e-9);
    }
}
