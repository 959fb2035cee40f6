//! Core data structures for qemcrate
//!
//! This crate provides the fundamental types shared by the qemcrate crates:
//! point and vector aliases, the indexed triangle mesh, and the error type.

pub mod point;
pub mod mesh;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
