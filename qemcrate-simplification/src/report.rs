//! Summary of a finished simplification run

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// How a run that reduced the mesh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimplifyOutcome {
    /// The triangle count reached the target.
    TargetReached,
    /// Collapses ran out before the target; the mesh is smaller but above it.
    PartialReduction,
    /// A lossless run removed every collapse that introduced no error.
    Lossless,
}

/// Counts and timing of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimplifyReport {
    pub outcome: SimplifyOutcome,
    pub original_triangles: usize,
    pub target_triangles: usize,
    pub final_triangles: usize,
    pub original_vertices: usize,
    pub final_vertices: usize,
    pub collapses: usize,
    pub passes: usize,
    pub elapsed: Duration,
}

impl SimplifyReport {
    /// Final over original triangle count.
    pub fn reduction_ratio(&self) -> f64 {
        if self.original_triangles == 0 {
            1.0
        } else {
            self.final_triangles as f64 / self.original_triangles as f64
        }
    }

    /// Percentage of triangles removed.
    pub fn reduction_percent(&self) -> f64 {
        (1.0 - self.reduction_ratio()) * 100.0
    }

    pub fn reached_target(&self) -> bool {
        self.outcome != SimplifyOutcome::PartialReduction
    }
}

impl fmt::Display for SimplifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Simplified {} -> {} triangles ({:.1}% reduction, {} collapses in {} passes, {:.3}s)",
            self.original_triangles,
            self.final_triangles,
            self.reduction_percent(),
            self.collapses,
            self.passes,
            self.elapsed.as_secs_f64()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: SimplifyOutcome) -> SimplifyReport {
        SimplifyReport {
            outcome,
            original_triangles: 1000,
            target_triangles: 500,
            final_triangles: 500,
            original_vertices: 502,
            final_vertices: 252,
            collapses: 250,
            passes: 6,
            elapsed: Duration::from_millis(1500),
        }
    }

    #[test]
    fn test_reduction_ratio() {
        let r = report(SimplifyOutcome::TargetReached);
        assert!((r.reduction_ratio() - 0.5).abs() < 1e-12);
        assert!((r.reduction_percent() - 50.0).abs() < 1e-9);
        assert!(r.reached_target());
        assert!(!report(SimplifyOutcome::PartialReduction).reached_target());
    }

    #[test]
    fn test_display() {
        let display = format!("{}", report(SimplifyOutcome::TargetReached));
        assert!(display.contains("1000 -> 500"));
        assert!(display.contains("50.0%"));
        assert!(display.contains("1.500s"));
    }
}
