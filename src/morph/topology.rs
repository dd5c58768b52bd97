//! Topology validation
//!
//! Two meshes can be morphed between only if they are split into the same
//! submeshes and parts, with the same vertex count in every part. Materials,
//! indices and UVs don't take part in the comparison.

use thiserror::Error;

/// Per-part vertex counts grouped by submesh
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct MeshTopology(Vec<Vec<usize>>);

impl MeshTopology {
    pub fn new(counts: Vec<Vec<usize>>) -> Self {
        Self(counts)
    }

    pub fn submesh_count(&self) -> usize {
        self.0.len()
    }

    pub fn part_count(&self) -> usize {
        self.0.iter().map(Vec::len).sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.0.iter().flatten().sum()
    }
}

/// A target whose topology differs from the base
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("target {target_index} is not topologically identical to the base mesh (expected {expected:?}, found {found:?})")]
pub struct TopologyMismatch {
    pub target_index: usize,
    pub expected: MeshTopology,
    pub found: MeshTopology,
}

/// Check that every target has exactly the base topology.
///
/// Reports the first target that differs.
pub fn validate(base: &MeshTopology, targets: &[MeshTopology]) -> Result<(), TopologyMismatch> {
    match targets.iter().position(|target| target != base) {
        Some(target_index) => Err(TopologyMismatch {
            target_index,
            expected: base.clone(),
            found: targets[target_index].clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topo(counts: &[&[usize]]) -> MeshTopology {
        MeshTopology::new(counts.iter().map(|s| s.to_vec()).collect())
    }

    #[test]
    fn test_identical_topologies_pass() {
        let base = topo(&[&[4, 6], &[3]]);
        assert!(validate(&base, &[base.clone(), base.clone()]).is_ok());
    }

    #[test]
    fn test_no_targets_pass() {
        assert!(validate(&topo(&[&[4]]), &[]).is_ok());
    }

    #[test]
    fn test_vertex_count_difference_fails() {
        let base = topo(&[&[4, 6], &[3]]);
        let bad = topo(&[&[4, 6], &[4]]);
        let err = validate(&base, &[base.clone(), bad.clone()]).unwrap_err();
        assert_eq!(err.target_index, 1);
        assert_eq!(err.found, bad);
        assert_eq!(err.expected, base);
    }

    #[test]
    fn test_part_count_difference_fails() {
        let base = topo(&[&[4, 6]]);
        assert!(validate(&base, &[topo(&[&[4]])]).is_err());
        assert!(validate(&base, &[topo(&[&[4, 6, 0]])]).is_err());
    }

    #[test]
    fn test_submesh_count_difference_fails() {
        let base = topo(&[&[4], &[6]]);
        // Same flattened counts, different grouping
        assert!(validate(&base, &[topo(&[&[4, 6]])]).is_err());
        assert!(validate(&base, &[topo(&[&[4], &[6], &[]])]).is_err());
    }

    #[test]
    fn test_counts_accessors() {
        let t = topo(&[&[4, 6], &[3]]);
        assert_eq!(t.submesh_count(), 2);
        assert_eq!(t.part_count(), 3);
        assert_eq!(t.vertex_count(), 13);
    }
}
