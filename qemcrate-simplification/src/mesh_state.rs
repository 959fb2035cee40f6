//! Live mesh state for edge-collapse decimation
//!
//! Vertices and triangles live in dense arrays and reference each other by
//! index. Each vertex owns a contiguous window `[tstart, tstart + tcount)` of
//! the shared `refs` arena listing the triangles that use it. Deletion is a
//! flag; nothing is removed from the arrays until compaction.

use crate::quadric::{triangle_normal, SymmetricMatrix};
use qemcrate_core::{to_point3d, Error, Point3d, Point3f, Result, TexCoord, Vector3d};
use std::collections::HashMap;
use tracing::warn;

/// Per-triangle attribute bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Attributes(u8);

impl Attributes {
    pub const TEXCOORD: Self = Self(1);

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Vertex {
    pub position: Point3d,
    pub quadric: SymmetricMatrix,
    pub border: bool,
    pub tstart: usize,
    pub tcount: usize,
    /// Live triangles using this vertex; zero means the vertex is gone.
    pub live: usize,
    /// Index of this vertex in the table it was loaded from.
    pub origin: usize,
}

impl Vertex {
    fn new(position: Point3d, origin: usize) -> Self {
        Self {
            position,
            quadric: SymmetricMatrix::ZERO,
            border: false,
            tstart: 0,
            tcount: 0,
            live: 0,
            origin,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Triangle {
    pub v: [usize; 3],
    pub uvs: [TexCoord; 3],
    pub attributes: Attributes,
    pub deleted: bool,
    /// Touched by a collapse since its candidate was last evaluated.
    pub dirty: bool,
    /// Face-plane quadric from the last seeding.
    pub quadric: SymmetricMatrix,
}

impl Triangle {
    fn new(v: [usize; 3]) -> Self {
        Self {
            v,
            uvs: [[0.0; 2]; 3],
            attributes: Attributes::default(),
            deleted: false,
            dirty: false,
            quadric: SymmetricMatrix::ZERO,
        }
    }

    pub fn contains(&self, vertex: usize) -> bool {
        self.v.contains(&vertex)
    }

    pub fn is_degenerate(&self) -> bool {
        self.v[0] == self.v[1] || self.v[1] == self.v[2] || self.v[0] == self.v[2]
    }
}

/// A vertex's use of a triangle: which triangle, and which corner of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Ref {
    pub tid: usize,
    pub corner: usize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MeshState {
    pub vertices: Vec<Vertex>,
    pub triangles: Vec<Triangle>,
    pub refs: Vec<Ref>,
    live_triangles: usize,
    source_vertex_count: usize,
}

impl MeshState {
    /// Replace the whole state with a new mesh.
    ///
    /// Triangles that index outside the vertex table or repeat a vertex are
    /// dropped. Fails when fewer than 3 vertices or valid triangles remain, or
    /// when a coordinate is not finite.
    pub fn load(&mut self, vertices: &[Point3f], triangles: &[[usize; 3]]) -> Result<()> {
        *self = Self::default();

        if vertices.len() < 3 {
            return Err(Error::InvalidInput(format!(
                "mesh needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }
        if let Some(i) = vertices.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidInput(format!(
                "vertex {i} has a non-finite coordinate"
            )));
        }

        let n = vertices.len();
        let mut kept = Vec::with_capacity(triangles.len());
        let mut dropped = 0usize;
        for tri in triangles {
            let t = Triangle::new(*tri);
            if tri.iter().any(|&i| i >= n) || t.is_degenerate() {
                dropped += 1;
                continue;
            }
            kept.push(t);
        }
        if dropped > 0 {
            warn!(dropped, total = triangles.len(), "Dropped invalid triangles during load");
        }
        if kept.len() < 3 {
            return Err(Error::InvalidInput(format!(
                "mesh needs at least 3 valid triangles, got {}",
                kept.len()
            )));
        }

        self.vertices = vertices
            .iter()
            .enumerate()
            .map(|(i, p)| Vertex::new(to_point3d(p), i))
            .collect();
        self.triangles = kept;
        self.source_vertex_count = n;
        self.rebuild_refs();
        Ok(())
    }

    /// Stamp every triangle's corner UVs from a table indexed by loaded vertex id.
    pub fn load_corner_uvs(&mut self, uvs: &[TexCoord]) -> Result<()> {
        if uvs.len() < self.source_vertex_count {
            return Err(Error::InvalidInput(format!(
                "uv table has {} entries for {} vertices",
                uvs.len(),
                self.source_vertex_count
            )));
        }
        for tri in &mut self.triangles {
            for corner in 0..3 {
                tri.uvs[corner] = uvs[self.vertices[tri.v[corner]].origin];
            }
            tri.attributes.insert(Attributes::TEXCOORD);
        }
        Ok(())
    }

    pub fn live_triangle_count(&self) -> usize {
        self.live_triangles
    }

    pub fn live_vertex_count(&self) -> usize {
        self.vertices.iter().filter(|v| v.live > 0).count()
    }

    pub fn source_vertex_count(&self) -> usize {
        self.source_vertex_count
    }

    pub fn has_texcoords(&self) -> bool {
        self.triangles
            .iter()
            .any(|t| !t.deleted && t.attributes.contains(Attributes::TEXCOORD))
    }

    /// Reference window of a vertex; may include triangles deleted since the last rebuild.
    pub fn refs_of(&self, vertex: usize) -> &[Ref] {
        let v = &self.vertices[vertex];
        &self.refs[v.tstart..v.tstart + v.tcount]
    }

    /// Live triangles using `vertex`.
    #[cfg(test)]
    pub fn incident_triangles(&self, vertex: usize) -> impl Iterator<Item = usize> + '_ {
        self.refs_of(vertex)
            .iter()
            .map(|r| r.tid)
            .filter(move |&tid| !self.triangles[tid].deleted)
    }

    pub fn is_border(&self, vertex: usize) -> bool {
        self.vertices[vertex].border
    }

    /// Current unit normal of a triangle.
    pub fn triangle_normal(&self, tid: usize) -> Option<Vector3d> {
        let [a, b, c] = self.triangles[tid].v;
        triangle_normal(
            &self.vertices[a].position,
            &self.vertices[b].position,
            &self.vertices[c].position,
        )
    }

    /// Rebuild every vertex's reference window from the live triangles,
    /// dropping references to deleted ones.
    pub fn rebuild_refs(&mut self) {
        for v in &mut self.vertices {
            v.tstart = 0;
            v.tcount = 0;
        }
        let mut live = 0;
        for tri in self.triangles.iter().filter(|t| !t.deleted) {
            live += 1;
            for &vid in &tri.v {
                self.vertices[vid].tcount += 1;
            }
        }

        let mut tstart = 0;
        for v in &mut self.vertices {
            v.tstart = tstart;
            v.live = v.tcount;
            tstart += v.tcount;
            v.tcount = 0;
        }

        self.refs.clear();
        self.refs.resize(tstart, Ref { tid: 0, corner: 0 });
        for (tid, tri) in self.triangles.iter().enumerate() {
            if tri.deleted {
                continue;
            }
            for (corner, &vid) in tri.v.iter().enumerate() {
                let v = &mut self.vertices[vid];
                self.refs[v.tstart + v.tcount] = Ref { tid, corner };
                v.tcount += 1;
            }
        }
        self.live_triangles = live;
    }

    /// Recompute border flags and vertex quadrics from the live triangles.
    ///
    /// Each vertex receives the face quadrics of its triangles plus, for every
    /// border edge it lies on, a plane through the edge perpendicular to the
    /// face scaled by `border_weight`.
    pub fn seed_quadrics(&mut self, border_weight: f64) {
        for v in &mut self.vertices {
            v.quadric = SymmetricMatrix::ZERO;
            v.border = false;
        }

        let mut normals: Vec<Option<Vector3d>> = vec![None; self.triangles.len()];
        let mut edges: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
        for tid in 0..self.triangles.len() {
            if self.triangles[tid].deleted {
                continue;
            }
            let normal = self.triangle_normal(tid);
            let tri = &mut self.triangles[tid];
            tri.quadric = match normal {
                Some(n) => SymmetricMatrix::from_point_normal(&self.vertices[tri.v[0]].position, &n),
                None => SymmetricMatrix::ZERO,
            };
            normals[tid] = normal;

            let q = tri.quadric;
            for &vid in &tri.v {
                self.vertices[vid].quadric += q;
            }
            for j in 0..3 {
                let (a, b) = (tri.v[j], tri.v[(j + 1) % 3]);
                let entry = edges.entry((a.min(b), a.max(b))).or_insert((0, tid));
                entry.0 += 1;
            }
        }

        for (&(a, b), &(count, tid)) in &edges {
            if count != 1 {
                continue;
            }
            self.vertices[a].border = true;
            self.vertices[b].border = true;
            if let Some(n) = normals[tid] {
                let q = SymmetricMatrix::border_plane(
                    &self.vertices[a].position,
                    &self.vertices[b].position,
                    &n,
                    border_weight,
                );
                self.vertices[a].quadric += q;
                self.vertices[b].quadric += q;
            }
        }
    }

    /// Merge `remove` into `keep`, moving `keep` to `position`.
    ///
    /// Triangles holding both vertices become degenerate and are deleted; the
    /// rest of `remove`'s triangles are retargeted to `keep`. Every surviving
    /// triangle around `keep` is marked dirty. Returns the number of triangles
    /// deleted.
    pub fn collapse(&mut self, keep: usize, remove: usize, position: Point3d) -> Result<usize> {
        if keep == remove || self.vertices[keep].live == 0 || self.vertices[remove].live == 0 {
            return Err(Error::InvariantViolation(format!(
                "cannot collapse vertex {remove} into {keep}"
            )));
        }

        let mut window: Vec<(usize, Ref)> =
            Vec::with_capacity(self.vertices[keep].tcount + self.vertices[remove].tcount);
        window.extend(self.refs_of(keep).iter().map(|&r| (keep, r)));
        window.extend(self.refs_of(remove).iter().map(|&r| (remove, r)));

        let mut kept_refs = Vec::with_capacity(window.len());
        let mut deleted = 0;
        for (owner, r) in window {
            let tri = &mut self.triangles[r.tid];
            if tri.deleted {
                continue;
            }
            if tri.v[r.corner] != owner {
                return Err(Error::InvariantViolation(format!(
                    "stale reference from vertex {owner} to triangle {}",
                    r.tid
                )));
            }
            if tri.contains(keep) && tri.contains(remove) {
                tri.deleted = true;
                let corners = tri.v;
                for vid in corners {
                    self.vertices[vid].live -= 1;
                }
                self.live_triangles -= 1;
                deleted += 1;
                continue;
            }
            if owner == remove {
                tri.v[r.corner] = keep;
                self.vertices[remove].live -= 1;
                self.vertices[keep].live += 1;
            }
            let tri = &mut self.triangles[r.tid];
            tri.dirty = true;
            if tri.is_degenerate() {
                return Err(Error::InvariantViolation(format!(
                    "triangle {} references vertex {} twice after collapse",
                    r.tid, keep
                )));
            }
            kept_refs.push(r);
        }

        if self.vertices[remove].live != 0 {
            return Err(Error::InvariantViolation(format!(
                "vertex {remove} still used by {} triangles after collapse",
                self.vertices[remove].live
            )));
        }

        let absorbed = self.vertices[remove].quadric;
        let was_border = self.vertices[remove].border;
        let tstart = self.refs.len();
        self.refs.extend_from_slice(&kept_refs);

        let k = &mut self.vertices[keep];
        k.quadric += absorbed;
        k.position = position;
        k.border |= was_border;
        k.tstart = tstart;
        k.tcount = kept_refs.len();

        let r = &mut self.vertices[remove];
        r.tcount = 0;

        Ok(deleted)
    }
}
