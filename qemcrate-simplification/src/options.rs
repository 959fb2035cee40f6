//! Tuning knobs for the decimation engine

use qemcrate_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default aggressiveness; higher values collapse more per pass.
pub const DEFAULT_AGGRESSIVENESS: f64 = 7.0;

/// Default weight of the plane constraints placed on border edges.
pub const DEFAULT_BORDER_WEIGHT: f64 = 1000.0;

/// Fewest triangles a target-mode run may aim for.
pub const MIN_TARGET_TRIANGLES: usize = 4;

/// Engine options that stay fixed across runs.
///
/// The per-run reduction ratio and aggressiveness are arguments of
/// [`DecimationEngine::simplify`](crate::DecimationEngine::simplify);
/// `aggressiveness` here is what [`QuadricErrorSimplifier`](crate::QuadricErrorSimplifier)
/// passes on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimplifyOptions {
    /// Aggressiveness used by the one-call simplifier.
    pub aggressiveness: f64,

    /// Scale of the border penalty quadrics. Default: 1000.0
    pub border_weight: f64,

    /// Largest error a lossless collapse may introduce.
    pub lossless_epsilon: f64,

    /// Stop after this many passes even if the target is not reached.
    pub max_passes: Option<usize>,

    /// Live triangle count from which candidates are evaluated in parallel.
    pub parallel_threshold: usize,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            aggressiveness: DEFAULT_AGGRESSIVENESS,
            border_weight: DEFAULT_BORDER_WEIGHT,
            lossless_epsilon: f64::EPSILON,
            max_passes: None,
            parallel_threshold: 1024,
        }
    }
}

impl SimplifyOptions {
    /// Set the aggressiveness used by the one-call simplifier.
    #[must_use]
    pub const fn with_aggressiveness(mut self, aggressiveness: f64) -> Self {
        self.aggressiveness = aggressiveness;
        self
    }

    /// Set the border penalty weight.
    #[must_use]
    pub const fn with_border_weight(mut self, weight: f64) -> Self {
        self.border_weight = weight;
        self
    }

    #[must_use]
    pub const fn with_lossless_epsilon(mut self, epsilon: f64) -> Self {
        self.lossless_epsilon = epsilon;
        self
    }

    /// Cap the number of passes per run.
    #[must_use]
    pub const fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = Some(passes);
        self
    }

    /// Always evaluate candidates on the calling thread.
    #[must_use]
    pub const fn sequential(mut self) -> Self {
        self.parallel_threshold = usize::MAX;
        self
    }

    #[must_use]
    pub const fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Reject weights and tolerances that would make the error metric
    /// meaningless: every float field must be finite and non-negative.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("aggressiveness", self.aggressiveness),
            ("border_weight", self.border_weight),
            ("lossless_epsilon", self.lossless_epsilon),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidInput(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SimplifyOptions::default();
        assert!((options.aggressiveness - 7.0).abs() < 1e-12);
        assert!((options.border_weight - 1000.0).abs() < 1e-12);
        assert_eq!(options.lossless_epsilon, f64::EPSILON);
        assert_eq!(options.max_passes, None);
    }

    #[test]
    fn test_builders() {
        let options = SimplifyOptions::default()
            .with_aggressiveness(3.0)
            .with_border_weight(10.0)
            .with_max_passes(5)
            .sequential();
        assert!((options.aggressiveness - 3.0).abs() < 1e-12);
        assert!((options.border_weight - 10.0).abs() < 1e-12);
        assert_eq!(options.max_passes, Some(5));
        assert_eq!(options.parallel_threshold, usize::MAX);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: SimplifyOptions = serde_json::from_str(r#"{"border_weight": 50.0}"#).unwrap();
        assert!((options.border_weight - 50.0).abs() < 1e-12);
        assert!((options.aggressiveness - DEFAULT_AGGRESSIVENESS).abs() < 1e-12);
        assert_eq!(options.parallel_threshold, 1024);
    }

    #[test]
    fn test_validate() {
        assert!(SimplifyOptions::default().validate().is_ok());
        assert!(SimplifyOptions::default().with_border_weight(0.0).validate().is_ok());

        let negative: SimplifyOptions =
            serde_json::from_str(r#"{"border_weight": -1000.0}"#).unwrap();
        assert!(matches!(negative.validate(), Err(Error::InvalidInput(_))));

        for options in [
            SimplifyOptions::default().with_aggressiveness(-1.0),
            SimplifyOptions::default().with_aggressiveness(f64::NAN),
            SimplifyOptions::default().with_border_weight(f64::INFINITY),
            SimplifyOptions::default().with_lossless_epsilon(-1e-9),
        ] {
            assert!(matches!(options.validate(), Err(Error::InvalidInput(_))), "{options:?}");
        }
    }
}
