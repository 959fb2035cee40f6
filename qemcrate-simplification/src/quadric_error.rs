//! Quadric error decimation

use crate::engine::DecimationEngine;
use crate::options::SimplifyOptions;
use crate::MeshSimplifier;
use qemcrate_core::{Result, TriangleMesh};

/// One-call quadric error decimation of a [`TriangleMesh`].
///
/// Builds a fresh [`DecimationEngine`] per call, so a single simplifier can
/// be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct QuadricErrorSimplifier {
    pub options: SimplifyOptions,
}

impl QuadricErrorSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SimplifyOptions) -> Self {
        Self { options }
    }
}

impl MeshSimplifier for QuadricErrorSimplifier {
    fn simplify(&self, mesh: &TriangleMesh, reduction_ratio: f32) -> Result<TriangleMesh> {
        let mut engine = DecimationEngine::with_options(self.options.clone());
        engine.load_mesh(mesh)?;
        engine.simplify(f64::from(reduction_ratio), self.options.aggressiveness)?;
        Ok(engine.to_triangle_mesh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qemcrate_core::{Error, Point3f};

    fn make_plane_grid(n: usize) -> TriangleMesh {
        let mut vertices = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3f::new(i as f32, j as f32, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + n + 1;
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        TriangleMesh::from_vertices_and_faces(vertices, faces)
    }

    #[test]
    fn test_simplify_grid() {
        let mesh = make_plane_grid(10);
        let result = QuadricErrorSimplifier::new().simplify(&mesh, 0.5).unwrap();
        assert!(result.face_count() <= 100);
        assert!(result.invalid_faces().is_empty());
        // A flat grid stays flat.
        assert!(result.vertices.iter().all(|v| v.z.abs() < 1e-5));
    }

    #[test]
    fn test_simplify_keeps_uvs() {
        let mut mesh = make_plane_grid(6);
        let uvs = mesh.vertices.iter().map(|v| [v.x / 6.0, v.y / 6.0]).collect();
        mesh.set_uvs(uvs);
        let result = QuadricErrorSimplifier::new().simplify(&mesh, 0.5).unwrap();
        let uvs = result.uvs.as_ref().unwrap();
        assert_eq!(uvs.len(), result.vertex_count());
        // Corner uvs are copied, never interpolated.
        let grid_step = |c: f32| ((c * 6.0).round() - c * 6.0).abs() < 1e-4;
        for uv in uvs {
            assert!((0.0..=1.0).contains(&uv[0]) && (0.0..=1.0).contains(&uv[1]));
            assert!(grid_step(uv[0]) && grid_step(uv[1]));
        }
    }

    #[test]
    fn test_simplify_rejects_tiny_mesh() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );
        let err = QuadricErrorSimplifier::new().simplify(&mesh, 0.5).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
