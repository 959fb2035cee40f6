//! Decimation engine
//!
//! [`DecimationEngine`] owns one mesh at a time. Load it, optionally attach
//! corner UVs, run [`simplify`](DecimationEngine::simplify) one or more times
//! and read the result back through the export methods. Every run re-seeds
//! the quadrics from the current geometry and ends with the mesh compacted.

use crate::compactor::compact;
use crate::mesh_state::{Attributes, MeshState, Triangle};
use crate::options::{SimplifyOptions, MIN_TARGET_TRIANGLES};
use crate::report::{SimplifyOutcome, SimplifyReport};
use crate::scheduler::{CollapseScheduler, Mode};
use qemcrate_core::{to_point3f, Error, Point3f, Result, TexCoord, TriangleMesh};
use std::time::Instant;
use tracing::{info, warn};

/// Quadric error edge-collapse decimator for a single mesh.
#[derive(Debug, Clone, Default)]
pub struct DecimationEngine {
    state: MeshState,
    options: SimplifyOptions,
    simplified: bool,
}

impl DecimationEngine {
    /// Create an empty engine with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty engine with custom options.
    ///
    /// Options are checked by [`simplify`](Self::simplify), which rejects
    /// negative or non-finite weights.
    pub fn with_options(options: SimplifyOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &SimplifyOptions {
        &self.options
    }

    /// Replace the current mesh.
    ///
    /// Triangles with out-of-range or repeated indices are skipped with a
    /// warning, and vertices no triangle uses are dropped. Fails when fewer
    /// than 3 vertices or 3 valid triangles remain, or when a coordinate is
    /// NaN or infinite; the engine is left empty then.
    pub fn load(&mut self, vertices: &[Point3f], triangles: &[[usize; 3]]) -> Result<()> {
        self.simplified = false;
        if let Err(e) = self.state.load(vertices, triangles) {
            self.state = MeshState::default();
            return Err(e);
        }
        compact(&mut self.state);
        Ok(())
    }

    /// Load a [`TriangleMesh`], including its per-vertex UVs when present.
    pub fn load_mesh(&mut self, mesh: &TriangleMesh) -> Result<()> {
        self.load(&mesh.vertices, &mesh.faces)?;
        if let Some(uvs) = &mesh.uvs {
            self.load_corner_uvs(uvs)?;
        }
        Ok(())
    }

    /// Attach texture coordinates, indexed by the vertex ids given to [`load`](Self::load).
    ///
    /// Each triangle corner takes the UV of its vertex. Must be called before
    /// the first simplification; corner UVs are never interpolated afterwards.
    pub fn load_corner_uvs(&mut self, uvs: &[TexCoord]) -> Result<()> {
        if self.simplified {
            return Err(Error::InvalidInput(
                "corner uvs must be loaded before simplification".to_string(),
            ));
        }
        if self.state.triangles.is_empty() {
            return Err(Error::InvalidInput("no mesh loaded".to_string()));
        }
        self.state.load_corner_uvs(uvs)
    }

    /// Reduce the mesh to about `reduction_ratio` of its triangles.
    ///
    /// `reduction_ratio` is the fraction to keep: 0.5 halves the triangle
    /// count. Values above 1 are treated as 1, which runs a lossless pass that
    /// only removes collapses introducing no error. `aggressiveness` trades
    /// quality for speed; 7 is a good default.
    pub fn simplify(&mut self, reduction_ratio: f64, aggressiveness: f64) -> Result<SimplifyReport> {
        let start_triangles = self.state.live_triangle_count();
        let start_vertices = self.state.live_vertex_count();
        if start_triangles < 3 || start_vertices < 3 {
            return Err(Error::InvalidInput(format!(
                "mesh has {start_triangles} triangles and {start_vertices} vertices, need at least 3 of each"
            )));
        }
        if reduction_ratio.is_nan() || reduction_ratio <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "reduction ratio must be positive, got {reduction_ratio}"
            )));
        }
        if !aggressiveness.is_finite() || aggressiveness < 0.0 {
            return Err(Error::InvalidInput(format!(
                "aggressiveness must be a finite non-negative number, got {aggressiveness}"
            )));
        }
        self.options.validate()?;

        let ratio = reduction_ratio.min(1.0);
        let target = (start_triangles as f64 * ratio).round() as usize;
        if target < MIN_TARGET_TRIANGLES {
            return Err(Error::InfeasibleTarget {
                target,
                minimum: MIN_TARGET_TRIANGLES,
            });
        }
        let mode = if ratio >= 1.0 {
            Mode::Lossless {
                epsilon: self.options.lossless_epsilon,
            }
        } else {
            Mode::Target(target)
        };

        info!(
            triangles = start_triangles,
            vertices = start_vertices,
            target = target,
            ratio = ratio,
            aggressiveness = aggressiveness,
            lossless = matches!(mode, Mode::Lossless { .. }),
            "Starting mesh simplification"
        );
        self.run(mode, aggressiveness, start_triangles, start_vertices, target)
    }

    /// Remove only collapses that introduce no measurable error.
    pub fn simplify_lossless(&mut self) -> Result<SimplifyReport> {
        self.simplify(1.0, self.options.aggressiveness)
    }

    fn run(
        &mut self,
        mode: Mode,
        aggressiveness: f64,
        start_triangles: usize,
        start_vertices: usize,
        target: usize,
    ) -> Result<SimplifyReport> {
        let timer = Instant::now();
        let summary = match CollapseScheduler::new(&self.options, aggressiveness)
            .run(&mut self.state, mode)
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!(error = %e, "Simplification aborted; discarding mesh");
                self.state = MeshState::default();
                return Err(e);
            }
        };
        compact(&mut self.state);
        self.simplified = true;

        let final_triangles = self.state.live_triangle_count();
        let final_vertices = self.state.live_vertex_count();
        let elapsed = timer.elapsed();

        if final_triangles >= start_triangles {
            info!(
                triangles = start_triangles,
                passes = summary.passes,
                "Simplification made no progress"
            );
            return Err(Error::NoProgress {
                before: start_triangles,
                after: final_triangles,
            });
        }

        let outcome = match mode {
            Mode::Lossless { .. } => SimplifyOutcome::Lossless,
            Mode::Target(t) if final_triangles <= t => SimplifyOutcome::TargetReached,
            Mode::Target(_) => SimplifyOutcome::PartialReduction,
        };
        let report = SimplifyReport {
            outcome,
            original_triangles: start_triangles,
            target_triangles: target,
            final_triangles,
            original_vertices: start_vertices,
            final_vertices,
            collapses: summary.collapses,
            passes: summary.passes,
            elapsed,
        };

        info!(
            triangles = final_triangles,
            vertices = final_vertices,
            reduction_percent = report.reduction_percent(),
            collapses = summary.collapses,
            passes = summary.passes,
            converged = summary.converged,
            elapsed_ms = elapsed.as_millis() as u64,
            outcome = ?outcome,
            "Simplification complete"
        );
        Ok(report)
    }

    /// Compact the state now. Runs end compacted already; this is idempotent.
    pub fn compact(&mut self) {
        compact(&mut self.state);
    }

    pub fn vertex_count(&self) -> usize {
        self.state.live_vertex_count()
    }

    pub fn triangle_count(&self) -> usize {
        self.state.live_triangle_count()
    }

    /// Vertex positions of the compacted mesh.
    ///
    /// Loading and every finished run leave the state compact, so these
    /// line up with [`export_triangles`](Self::export_triangles).
    pub fn export_vertices(&self) -> Vec<Point3f> {
        self.state
            .vertices
            .iter()
            .map(|v| to_point3f(&v.position))
            .collect()
    }

    /// Triangles of the compacted mesh, indexing [`export_vertices`](Self::export_vertices).
    pub fn export_triangles(&self) -> Vec<[usize; 3]> {
        self.state
            .triangles
            .iter()
            .filter(|t| !t.deleted)
            .map(|t| t.v)
            .collect()
    }

    /// UV table indexed by the vertex ids given to [`load`](Self::load).
    ///
    /// Entries for removed vertices are zero. Where a vertex's corners carry
    /// different UVs the last live triangle wins. Empty when no UVs were loaded.
    pub fn export_corner_uvs(&self) -> Vec<TexCoord> {
        if !self.state.has_texcoords() {
            return Vec::new();
        }
        let mut table = vec![[0.0; 2]; self.state.source_vertex_count()];
        for tri in self.live_textured_triangles() {
            for corner in 0..3 {
                table[self.state.vertices[tri.v[corner]].origin] = tri.uvs[corner];
            }
        }
        table
    }

    /// Corner UVs of each exported triangle, parallel to [`export_triangles`](Self::export_triangles).
    pub fn export_triangle_uvs(&self) -> Vec<[TexCoord; 3]> {
        if !self.state.has_texcoords() {
            return Vec::new();
        }
        self.state
            .triangles
            .iter()
            .filter(|t| !t.deleted)
            .map(|t| t.uvs)
            .collect()
    }

    /// The current mesh as a [`TriangleMesh`] with per-vertex UVs when loaded.
    pub fn to_triangle_mesh(&self) -> TriangleMesh {
        let mut mesh =
            TriangleMesh::from_vertices_and_faces(self.export_vertices(), self.export_triangles());
        if self.state.has_texcoords() {
            let mut uvs = vec![[0.0; 2]; mesh.vertex_count()];
            for tri in self.live_textured_triangles() {
                for corner in 0..3 {
                    uvs[tri.v[corner]] = tri.uvs[corner];
                }
            }
            mesh.set_uvs(uvs);
        }
        mesh
    }

    fn live_textured_triangles(&self) -> impl Iterator<Item = &Triangle> + '_ {
        self.state
            .triangles
            .iter()
            .filter(|t| !t.deleted && t.attributes.contains(Attributes::TEXCOORD))
    }
}
