//! Mesh data structures and generation
//!
//! A [`ModelMesh`] is the renderable geometry the host hands to the morph
//! core: submeshes made of parts, where each part is drawn with one material.
//! Only positions and normals matter for morphing, so that is all a
//! [`MeshPart`] carries.

use bevy_ecs::prelude::*;
use glam::Vec3;

use crate::morph::MeshTopology;

/// A single drawable part of a submesh
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshPart {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Index into the host's material list
    pub material_index: usize,
}

impl MeshPart {
    pub fn new(positions: Vec<Vec3>, normals: Vec<Vec3>) -> Self {
        Self {
            positions,
            normals,
            material_index: 0,
        }
    }

    pub fn with_material(mut self, material_index: usize) -> Self {
        self.material_index = material_index;
        self
    }

    /// Calculate vertex count
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }
}

/// A group of parts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submesh {
    pub parts: Vec<MeshPart>,
}

impl Submesh {
    pub fn new(parts: Vec<MeshPart>) -> Self {
        Self { parts }
    }
}

/// Renderable geometry of an entity
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ModelMesh {
    pub submeshes: Vec<Submesh>,
    pub name: String,
}

impl ModelMesh {
    pub fn new(name: &str) -> Self {
        Self {
            submeshes: Vec::new(),
            name: name.to_string(),
        }
    }

    /// A mesh made of one submesh holding one part
    pub fn from_part(name: &str, part: MeshPart) -> Self {
        Self {
            submeshes: vec![Submesh::new(vec![part])],
            name: name.to_string(),
        }
    }

    pub fn with_submesh(mut self, submesh: Submesh) -> Self {
        self.submeshes.push(submesh);
        self
    }

    /// Whether there is anything to render
    pub fn is_empty(&self) -> bool {
        self.submeshes.iter().all(|s| s.parts.is_empty())
    }

    /// Number of parts across all submeshes
    pub fn part_count(&self) -> usize {
        self.submeshes.iter().map(|s| s.parts.len()).sum()
    }

    /// Calculate vertex count across all parts
    pub fn vertex_count(&self) -> usize {
        self.parts().map(MeshPart::vertex_count).sum()
    }

    /// Iterate parts in submesh order
    pub fn parts(&self) -> impl Iterator<Item = &MeshPart> {
        self.submeshes.iter().flat_map(|s| s.parts.iter())
    }

    pub fn part(&self, submesh: usize, part: usize) -> Option<&MeshPart> {
        self.submeshes.get(submesh)?.parts.get(part)
    }

    /// Per-part vertex counts grouped by submesh
    pub fn topology(&self) -> MeshTopology {
        MeshTopology::new(
            self.submeshes
                .iter()
                .map(|s| s.parts.iter().map(MeshPart::vertex_count).collect())
                .collect(),
        )
    }

    /// Create a plane on the XZ axis, facing +Y
    pub fn plane(width: f32, depth: f32, subdivisions: u32) -> Self {
        let subdivisions = subdivisions.max(1);
        let half_width = width / 2.0;
        let half_depth = depth / 2.0;
        let step_x = width / subdivisions as f32;
        let step_z = depth / subdivisions as f32;

        let mut positions = Vec::new();
        for z in 0..=subdivisions {
            for x in 0..=subdivisions {
                let px = -half_width + x as f32 * step_x;
                let pz = -half_depth + z as f32 * step_z;
                positions.push(Vec3::new(px, 0.0, pz));
            }
        }
        let normals = vec![Vec3::Y; positions.len()];

        Self::from_part("plane", MeshPart::new(positions, normals))
    }

    /// Create a plane on the XY axis, facing +Z
    ///
    /// Vertices are emitted in the same order as [`ModelMesh::plane`], so the
    /// two are topologically identical for equal subdivisions.
    pub fn plane_xy(width: f32, height: f32, subdivisions: u32) -> Self {
        let subdivisions = subdivisions.max(1);
        let half_width = width / 2.0;
        let half_height = height / 2.0;
        let step_x = width / subdivisions as f32;
        let step_y = height / subdivisions as f32;

        let mut positions = Vec::new();
        for y in 0..=subdivisions {
            for x in 0..=subdivisions {
                let px = -half_width + x as f32 * step_x;
                let py = -half_height + y as f32 * step_y;
                positions.push(Vec3::new(px, py, 0.0));
            }
        }
        let normals = vec![Vec3::Z; positions.len()];

        Self::from_part("plane_xy", MeshPart::new(positions, normals))
    }

    /// Create a UV sphere
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segment_angle = 2.0 * std::f32::consts::PI / segments as f32;
        let ring_angle = std::f32::consts::PI / rings as f32;

        let mut positions = Vec::new();
        let mut normals = Vec::new();
        for ring in 0..=rings {
            let phi = ring as f32 * ring_angle;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for segment in 0..=segments {
                let theta = segment as f32 * segment_angle;
                let normal = Vec3::new(ring_radius * theta.cos(), y, ring_radius * theta.sin());
                positions.push(normal * radius);
                normals.push(normal.normalize_or_zero());
            }
        }

        Self::from_part("sphere", MeshPart::new(positions, normals))
    }
}
