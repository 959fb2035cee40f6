//! Mesh data structures and functionality

use crate::point::*;
use serde::{Deserialize, Serialize};

/// An indexed triangle mesh with optional per-vertex texture coordinates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub uvs: Option<Vec<TexCoord>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            uvs: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            uvs: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Set per-vertex texture coordinates
    pub fn set_uvs(&mut self, uvs: Vec<TexCoord>) {
        if uvs.len() == self.vertices.len() {
            self.uvs = Some(uvs);
        }
    }

    /// Faces that index outside the vertex table or repeat a vertex
    pub fn invalid_faces(&self) -> Vec<usize> {
        let n = self.vertices.len();
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| {
                f.iter().any(|&i| i >= n) || f[0] == f[1] || f[1] == f[2] || f[0] == f[2]
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// Axis-aligned bounds as (min, max); both are the origin for an empty mesh
    pub fn bounding_box(&self) -> (Point3f, Point3f) {
        let Some(first) = self.vertices.first() else {
            return (Point3f::origin(), Point3f::origin());
        };

        let mut min = *first;
        let mut max = *first;

        for vertex in &self.vertices {
            min.x = min.x.min(vertex.x);
            min.y = min.y.min(vertex.y);
            min.z = min.z.min(vertex.z);

            max.x = max.x.max(vertex.x);
            max.y = max.y.max(vertex.y);
            max.z = max.z.max(vertex.z);
        }

        (min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_counts() {
        let mesh = quad();
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.face_count(), 2);
        assert!(!mesh.is_empty());
        assert!(TriangleMesh::new().is_empty());
    }

    #[test]
    fn test_set_uvs_requires_matching_length() {
        let mut mesh = quad();
        mesh.set_uvs(vec![[0.0, 0.0]; 3]);
        assert!(mesh.uvs.is_none());
        mesh.set_uvs(vec![[0.0, 0.0]; 4]);
        assert_eq!(mesh.uvs.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_invalid_faces() {
        let mut mesh = quad();
        mesh.add_face([0, 0, 1]);
        mesh.add_face([1, 2, 9]);
        assert_eq!(mesh.invalid_faces(), vec![2, 3]);
    }

    #[test]
    fn test_bounding_box() {
        let (min, max) = quad().bounding_box();
        assert_eq!(min, Point3f::new(0.0, 0.0, 0.0));
        assert_eq!(max, Point3f::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_serde_json() {
        let mut mesh = quad();
        mesh.set_uvs(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]);
        let json = serde_json::to_string(&mesh).unwrap();
        let back: TriangleMesh = serde_json::from_str(&json).unwrap();
        assert_eq!(back, mesh);
    }
}
