//! Error types for qemcrate

use thiserror::Error;

/// Main error type for qemcrate operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The mesh or a simplification parameter was rejected before any work was done.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The requested triangle count is too small for the mesh to survive.
    #[error("Infeasible target: {target} triangles requested, at least {minimum} required")]
    InfeasibleTarget { target: usize, minimum: usize },

    /// The run finished without removing a single triangle.
    #[error("Unable to reduce mesh: {before} triangles before, {after} after")]
    NoProgress { before: usize, after: usize },

    /// Internal mesh bookkeeping broke an invariant; the run was aborted.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Result type alias for qemcrate operations
pub type Result<T> = std::result::Result<T, Error>;
