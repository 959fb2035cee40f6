//! Mark-and-sweep compaction of the mesh state

use crate::mesh_state::MeshState;
use tracing::debug;

/// Drop deleted triangles and unreferenced vertices, renumbering what is left.
///
/// Survivors keep their relative order, so compacting an already compact
/// state changes nothing. Vertex origins are carried over unchanged.
pub(crate) fn compact(state: &mut MeshState) {
    let mut used = vec![false; state.vertices.len()];
    for tri in state.triangles.iter().filter(|t| !t.deleted) {
        for &v in &tri.v {
            used[v] = true;
        }
    }

    let mut remap = vec![usize::MAX; state.vertices.len()];
    let mut next = 0;
    for (old, &keep) in used.iter().enumerate() {
        if keep {
            remap[old] = next;
            next += 1;
        }
    }

    let before = (state.vertices.len(), state.triangles.len());
    let mut index = 0;
    state.vertices.retain(|_| {
        let keep = used[index];
        index += 1;
        keep
    });
    state.triangles.retain(|t| !t.deleted);
    for tri in &mut state.triangles {
        for v in &mut tri.v {
            *v = remap[*v];
        }
    }
    state.rebuild_refs();

    debug!(
        vertices_before = before.0,
        vertices_after = state.vertices.len(),
        triangles_before = before.1,
        triangles_after = state.triangles.len(),
        "Compacted mesh"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_state::tests::fan;
    use qemcrate_core::Point3d;

    fn collapsed_fan() -> MeshState {
        let (v, t) = fan();
        let mut state = MeshState::default();
        state.load(&v, &t).unwrap();
        // Merge corner 1 into the center: 1 disappears, 4 survives.
        state.collapse(4, 1, Point3d::new(1.0, 1.0, 0.0)).unwrap();
        state
    }

    #[test]
    fn test_compact_removes_dead_entries() {
        let mut state = collapsed_fan();
        compact(&mut state);
        assert_eq!(state.triangles.len(), 2);
        assert_eq!(state.vertices.len(), 4);
        let origins: Vec<usize> = state.vertices.iter().map(|v| v.origin).collect();
        assert_eq!(origins, vec![0, 2, 3, 4]);
        // [2, 3, 4] and [3, 0, 4] renumbered around the missing vertex 1.
        assert_eq!(state.triangles[0].v, [1, 2, 3]);
        assert_eq!(state.triangles[1].v, [2, 0, 3]);
        assert!(state.vertices.iter().all(|v| v.live > 0));
    }

    #[test]
    fn test_compact_is_idempotent() {
        let mut state = collapsed_fan();
        compact(&mut state);
        let vertices: Vec<_> = state.vertices.iter().map(|v| (v.position, v.origin)).collect();
        let triangles: Vec<_> = state.triangles.iter().map(|t| t.v).collect();

        compact(&mut state);
        let again: Vec<_> = state.vertices.iter().map(|v| (v.position, v.origin)).collect();
        assert_eq!(again, vertices);
        assert_eq!(state.triangles.iter().map(|t| t.v).collect::<Vec<_>>(), triangles);
    }
}
