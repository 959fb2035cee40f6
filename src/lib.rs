//! # qemcrate
//!
//! Quadric error metric mesh decimation for level-of-detail pipelines.
//!
//! This is the umbrella crate that re-exports the workspace crates. Use it to
//! get everything in one place, or depend on the individual crates directly.
//!
//! ## Features
//!
//! - **Core**: Mesh container, point aliases and the shared error type
//! - **Simplification**: The decimation engine and the one-call simplifier
//!
//! ## Quick Start
//!
//! ```rust
//! use qemcrate::prelude::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut vertices = Vec::new();
//! for y in 0..=4 {
//!     for x in 0..=4 {
//!         vertices.push(Point3f::new(x as f32, y as f32, 0.0));
//!     }
//! }
//! let mut faces = Vec::new();
//! for y in 0..4 {
//!     for x in 0..4 {
//!         let i = y * 5 + x;
//!         faces.push([i, i + 1, i + 6]);
//!         faces.push([i, i + 6, i + 5]);
//!     }
//! }
//!
//! let mut engine = DecimationEngine::new();
//! engine.load(&vertices, &faces)?;
//! let report = engine.simplify(0.5, 7.0)?;
//! assert!(engine.triangle_count() < 32);
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core and simplification
//! - `simplification`: Quadric error decimation

// Re-export core functionality
pub use qemcrate_core::*;

#[cfg(feature = "simplification")]
pub use qemcrate_simplification as simplification;

/// Convenient imports for common use cases
pub mod prelude {
    pub use qemcrate_core::*;

    #[cfg(feature = "simplification")]
    pub use qemcrate_simplification::{
        DecimationEngine, MeshSimplifier, QuadricErrorSimplifier, SimplifyOptions,
        SimplifyOutcome, SimplifyReport,
    };
}
