//! Mesh simplification by quadric error edge collapse
//!
//! Each vertex carries a quadric measuring squared distance to the planes of
//! its triangles. Collapsing an edge merges the two endpoint quadrics and
//! places the surviving vertex where the merged error is smallest. Edges are
//! collapsed cheapest first, pass by pass, until the triangle count reaches
//! the target:
//! - [`DecimationEngine`]: load, simplify, export
//! - [`QuadricErrorSimplifier`]: one-call [`MeshSimplifier`] over a [`TriangleMesh`]
//! - [`SymmetricMatrix`]: the quadric algebra
//!
//! Border edges are held in place by heavy plane constraints, triangles are
//! never allowed to flip, and texture coordinates stay attached to triangle
//! corners without interpolation.

mod candidate;
mod compactor;
mod mesh_state;
mod scheduler;

pub mod engine;
pub mod options;
pub mod quadric;
pub mod quadric_error;
pub mod report;

pub use engine::*;
pub use options::*;
pub use quadric::*;
pub use quadric_error::*;
pub use report::*;

use qemcrate_core::{Result, TriangleMesh};

/// Simplify a mesh by reducing the number of faces/vertices
pub trait MeshSimplifier {
    /// Simplify mesh keeping about `reduction_ratio` of its faces (1.0 = lossless only)
    fn simplify(&self, mesh: &TriangleMesh, reduction_ratio: f32) -> Result<TriangleMesh>;
}
