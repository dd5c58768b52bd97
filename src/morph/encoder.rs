//! Delta encoding
//!
//! Packs per-vertex position offsets and normals for every target of one
//! mesh part into a 2D grid of half-float RGB pixels (an [`Atlas`]).
//!
//! # Layout
//!
//! For vertex `v` and target `t` (of `T` targets) two consecutive pixels are
//! written at linear index `(v * T + t) * 2`:
//!
//! - `+0`: `target.position[v] - base.position[v]`
//! - `+1`: `target.normal[v]`, stored as-is
//!
//! The grid is row-major with `width = min(vertex_count, max_width)` and as
//! many rows as needed; the tail of the last row is zero. A deformation
//! program finds the first pixel of a vertex from its index alone and steps
//! two pixels per target. Programs are compiled per target count, so no slots
//! are reserved for unused targets.

use glam::Vec3;
use half::f16;
use thiserror::Error;

use super::{MorphWeights, MAX_TARGETS};
use crate::resources::MeshPart;

/// Widest texture the encoder produces by default
pub const MAX_TEXTURE_WIDTH: u32 = 8192;

/// Pixels written per vertex per target (offset + normal)
pub const PIXELS_PER_TARGET: usize = 2;

/// One half-float RGB pixel
pub type AtlasPixel = [f16; 3];

/// Errors that can occur while encoding a part.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("expected between 1 and {max} targets, got {count}")]
    InvalidTargetCount { count: usize, max: usize },
    #[error("target {target_index} has {positions} positions and {normals} normals, the base part has {expected} vertices")]
    PositionsNormalsCountMismatch {
        target_index: usize,
        positions: usize,
        normals: usize,
        expected: usize,
    },
    #[error("{pixels} packed pixels exceed the texture capacity of {capacity}")]
    GeometryTooLarge { pixels: usize, capacity: usize },
    #[error("part has no vertices")]
    EmptyPart,
    #[error("could not allocate {pixels} atlas pixels")]
    AllocationFailed { pixels: usize },
}

/// Encoded offsets and normals of one mesh part
#[derive(Debug, Clone, PartialEq)]
pub struct Atlas {
    width: u32,
    height: u32,
    vertex_count: usize,
    target_count: usize,
    pixels: Vec<AtlasPixel>,
}

impl Atlas {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    /// All pixels, row-major, including the zero padding
    pub fn pixels(&self) -> &[AtlasPixel] {
        &self.pixels
    }

    /// Number of pixels holding data (excludes padding)
    pub fn used_pixels(&self) -> usize {
        self.vertex_count * self.target_count * PIXELS_PER_TARGET
    }

    /// Linear index of the offset pixel for `vertex` and `target`
    pub fn pixel_index(&self, vertex: usize, target: usize) -> usize {
        (vertex * self.target_count + target) * PIXELS_PER_TARGET
    }

    /// Grid coordinates of a linear pixel index
    pub fn coords(&self, index: usize) -> (u32, u32) {
        let width = self.width as usize;
        ((index % width) as u32, (index / width) as u32)
    }

    /// Pixel at grid coordinates
    pub fn pixel(&self, x: u32, y: u32) -> Option<Vec3> {
        if x >= self.width {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels.get(index).map(|p| decode(*p))
    }

    /// Decoded position offset of `vertex` towards `target`
    pub fn offset(&self, vertex: usize, target: usize) -> Option<Vec3> {
        if vertex >= self.vertex_count || target >= self.target_count {
            return None;
        }
        Some(decode(self.pixels[self.pixel_index(vertex, target)]))
    }

    /// Decoded normal of `vertex` in `target`
    pub fn normal(&self, vertex: usize, target: usize) -> Option<Vec3> {
        if vertex >= self.vertex_count || target >= self.target_count {
            return None;
        }
        Some(decode(self.pixels[self.pixel_index(vertex, target) + 1]))
    }

    /// Pixels widened to RGBA with zero alpha, the layout GPUs accept
    pub fn to_rgba(&self) -> Vec<[f16; 4]> {
        self.pixels
            .iter()
            .map(|[r, g, b]| [*r, *g, *b, f16::ZERO])
            .collect()
    }

    /// Apply `base + sum(weight[t] * offset[t])` on the CPU.
    ///
    /// Only the first `vertex_count` base positions are deformed. Weights
    /// beyond the atlas target count are ignored, matching what the
    /// deformation program reads.
    pub fn deform_positions(&self, base: &[Vec3], weights: &MorphWeights) -> Vec<Vec3> {
        base.iter()
            .take(self.vertex_count)
            .enumerate()
            .map(|(vertex, position)| {
                (0..self.target_count).fold(*position, |acc, target| {
                    let index = self.pixel_index(vertex, target);
                    acc + decode(self.pixels[index]) * weights.get(target)
                })
            })
            .collect()
    }
}

fn encode_vec3(v: Vec3) -> AtlasPixel {
    [f16::from_f32(v.x), f16::from_f32(v.y), f16::from_f32(v.z)]
}

fn decode(p: AtlasPixel) -> Vec3 {
    Vec3::new(p[0].to_f32(), p[1].to_f32(), p[2].to_f32())
}

/// Encode the deltas between `base` and each of `targets` into an [`Atlas`].
///
/// Fails without producing anything if any precondition is violated.
pub fn encode(base: &MeshPart, targets: &[&MeshPart], max_width: u32) -> Result<Atlas, EncodeError> {
    let target_count = targets.len();
    if !(1..=MAX_TARGETS).contains(&target_count) {
        return Err(EncodeError::InvalidTargetCount {
            count: target_count,
            max: MAX_TARGETS,
        });
    }

    let vertex_count = base.positions.len();
    for (target_index, target) in targets.iter().enumerate() {
        if target.positions.len() != vertex_count || target.normals.len() != vertex_count {
            return Err(EncodeError::PositionsNormalsCountMismatch {
                target_index,
                positions: target.positions.len(),
                normals: target.normals.len(),
                expected: vertex_count,
            });
        }
    }
    if vertex_count == 0 {
        return Err(EncodeError::EmptyPart);
    }

    let used = vertex_count * target_count * PIXELS_PER_TARGET;
    let capacity = max_width as usize * max_width as usize;
    if used > capacity {
        return Err(EncodeError::GeometryTooLarge {
            pixels: used,
            capacity,
        });
    }

    let width = vertex_count.min(max_width as usize);
    let height = used.div_ceil(width);
    let total = width * height;

    let mut pixels: Vec<AtlasPixel> = Vec::new();
    pixels
        .try_reserve_exact(total)
        .map_err(|_| EncodeError::AllocationFailed { pixels: total })?;

    for vertex in 0..vertex_count {
        let base_position = base.positions[vertex];
        for target in targets {
            pixels.push(encode_vec3(target.positions[vertex] - base_position));
            pixels.push(encode_vec3(target.normals[vertex]));
        }
    }
    pixels.resize(total, [f16::ZERO; 3]);

    Ok(Atlas {
        width: width as u32,
        height: height as u32,
        vertex_count,
        target_count,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ModelMesh;

    fn plane_part(width: f32, depth: f32) -> MeshPart {
        ModelMesh::plane(width, depth, 1).submeshes[0].parts[0].clone()
    }

    fn plane_xy_part(width: f32, height: f32) -> MeshPart {
        ModelMesh::plane_xy(width, height, 1).submeshes[0].parts[0].clone()
    }

    /// A line of vertices whose coordinates ramp from `start` in steps of one
    fn ramp_part(vertex_count: usize, start: f32) -> MeshPart {
        let positions = (0..vertex_count)
            .map(|i| Vec3::splat(start + (i % 64) as f32))
            .collect();
        MeshPart::new(positions, vec![Vec3::X; vertex_count])
    }

    #[test]
    fn test_layout_two_targets() {
        let base = plane_part(1.0, 1.0);
        let wide = plane_part(3.0, 1.0);
        let upright = plane_xy_part(1.0, 1.0);

        let atlas = encode(&base, &[&wide, &upright], MAX_TEXTURE_WIDTH).unwrap();
        assert_eq!(atlas.width(), 4);
        assert_eq!(atlas.height(), 4);
        assert_eq!(atlas.vertex_count(), 4);
        assert_eq!(atlas.target_count(), 2);
        assert_eq!(atlas.pixels().len(), 16);
    }

    #[test]
    fn test_height_is_twice_target_count_when_unwrapped() {
        let base = plane_part(1.0, 1.0);
        for count in 1..=MAX_TARGETS {
            let targets = vec![&base; count];
            let atlas = encode(&base, &targets, MAX_TEXTURE_WIDTH).unwrap();
            assert_eq!(atlas.width(), 4);
            assert_eq!(atlas.height() as usize, 2 * count);
        }
    }

    #[test]
    fn test_offsets_and_normals() {
        let base = plane_part(1.0, 1.0);
        let wide = plane_part(3.0, 1.0);
        let upright = plane_xy_part(1.0, 1.0);
        let atlas = encode(&base, &[&wide, &upright], MAX_TEXTURE_WIDTH).unwrap();

        // Target 0 stretches by one unit each way along x
        let offsets: Vec<Vec3> = (0..4).map(|v| atlas.offset(v, 0).unwrap()).collect();
        assert_eq!(
            offsets,
            vec![
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(-1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
            ]
        );
        assert!((0..4).all(|v| atlas.normal(v, 0) == Some(Vec3::Y)));

        // Target 1 rotates the plane about x
        let offsets: Vec<Vec3> = (0..4).map(|v| atlas.offset(v, 1).unwrap()).collect();
        assert_eq!(
            offsets,
            vec![
                Vec3::new(0.0, -0.5, 0.5),
                Vec3::new(0.0, -0.5, 0.5),
                Vec3::new(0.0, 0.5, -0.5),
                Vec3::new(0.0, 0.5, -0.5),
            ]
        );
        // Normals are stored absolute, not as a delta from +Y
        assert!((0..4).all(|v| atlas.normal(v, 1) == Some(Vec3::Z)));
    }

    #[test]
    fn test_vertex_major_interleaving() {
        let base = plane_part(1.0, 1.0);
        let wide = plane_part(3.0, 1.0);
        let upright = plane_xy_part(1.0, 1.0);
        let atlas = encode(&base, &[&wide, &upright], MAX_TEXTURE_WIDTH).unwrap();

        // Vertex 1: [offset t0, normal t0, offset t1, normal t1] at 4..8
        assert_eq!(atlas.pixel_index(1, 0), 4);
        assert_eq!(atlas.pixel_index(1, 1), 6);
        assert_eq!(atlas.pixel(0, 1), Some(Vec3::new(1.0, 0.0, 0.0)));
        assert_eq!(atlas.pixel(1, 1), Some(Vec3::Y));
        assert_eq!(atlas.pixel(2, 1), Some(Vec3::new(0.0, -0.5, 0.5)));
        assert_eq!(atlas.pixel(3, 1), Some(Vec3::Z));
    }

    #[test]
    fn test_wraps_past_max_width() {
        let vertex_count = MAX_TEXTURE_WIDTH as usize + 1;
        let base = ramp_part(vertex_count, 0.0);
        let target = ramp_part(vertex_count, 1.0);

        let atlas = encode(&base, &[&target], MAX_TEXTURE_WIDTH).unwrap();
        assert_eq!(atlas.width(), MAX_TEXTURE_WIDTH);
        assert_eq!(atlas.height(), 3);
        assert!((0..vertex_count).all(|v| atlas.offset(v, 0) == Some(Vec3::ONE)));

        // The last vertex spills two pixels onto the third row
        assert_eq!(atlas.pixel(0, 2), Some(Vec3::ONE));
        assert_eq!(atlas.pixel(1, 2), Some(Vec3::X));
        assert!((2..MAX_TEXTURE_WIDTH).all(|x| atlas.pixel(x, 2) == Some(Vec3::ZERO)));
    }

    #[test]
    fn test_small_max_width_pads_last_row() {
        let base = ramp_part(5, 0.0);
        let target = ramp_part(5, 2.0);
        let atlas = encode(&base, &[&target], 4).unwrap();
        // 10 pixels over rows of 4, capacity 16
        assert_eq!(atlas.width(), 4);
        assert_eq!(atlas.height(), 3);
        assert_eq!(atlas.used_pixels(), 10);
        assert_eq!(atlas.pixels().len(), 12);
        assert_eq!(atlas.coords(9), (1, 2));
        assert_eq!(atlas.pixel(2, 2), Some(Vec3::ZERO));
        assert_eq!(atlas.pixel(3, 2), Some(Vec3::ZERO));
        assert_eq!(atlas.offset(4, 0), Some(Vec3::splat(2.0)));
    }

    #[test]
    fn test_invalid_target_counts() {
        let base = plane_part(1.0, 1.0);
        assert_eq!(
            encode(&base, &[], MAX_TEXTURE_WIDTH),
            Err(EncodeError::InvalidTargetCount { count: 0, max: 4 })
        );
        let five = vec![&base; 5];
        assert!(matches!(
            encode(&base, &five, MAX_TEXTURE_WIDTH),
            Err(EncodeError::InvalidTargetCount { count: 5, .. })
        ));
    }

    #[test]
    fn test_missing_normals() {
        let base = plane_part(1.0, 1.0);
        let mut target = plane_part(3.0, 1.0);
        target.normals.clear();
        assert_eq!(
            encode(&base, &[&target], MAX_TEXTURE_WIDTH),
            Err(EncodeError::PositionsNormalsCountMismatch {
                target_index: 0,
                positions: 4,
                normals: 0,
                expected: 4,
            })
        );
    }

    #[test]
    fn test_too_large() {
        let base = ramp_part(10, 0.0);
        let target = ramp_part(10, 1.0);
        // 20 pixels do not fit 4x4
        assert_eq!(
            encode(&base, &[&target], 4),
            Err(EncodeError::GeometryTooLarge {
                pixels: 20,
                capacity: 16
            })
        );
    }

    #[test]
    fn test_empty_part() {
        let base = MeshPart::default();
        assert_eq!(
            encode(&base, &[&base], MAX_TEXTURE_WIDTH),
            Err(EncodeError::EmptyPart)
        );
    }

    #[test]
    fn test_deform_positions() {
        let base = plane_part(1.0, 1.0);
        let wide = plane_part(3.0, 1.0);
        let atlas = encode(&base, &[&wide], MAX_TEXTURE_WIDTH).unwrap();

        let none = atlas.deform_positions(&base.positions, &MorphWeights::ZERO);
        assert_eq!(none, base.positions);

        let full = atlas.deform_positions(&base.positions, &MorphWeights::new(&[1.0]));
        assert_eq!(full, wide.positions);

        let half = atlas.deform_positions(&base.positions, &MorphWeights::new(&[0.5]));
        assert_eq!(half[0], Vec3::new(-1.0, 0.0, -0.5));
    }

    #[test]
    fn test_rgba_expansion() {
        let base = plane_part(1.0, 1.0);
        let wide = plane_part(3.0, 1.0);
        let atlas = encode(&base, &[&wide], MAX_TEXTURE_WIDTH).unwrap();
        let rgba = atlas.to_rgba();
        assert_eq!(rgba.len(), atlas.pixels().len());
        assert_eq!(rgba[1][1].to_f32(), 1.0);
        assert!(rgba.iter().all(|p| p[3] == f16::ZERO));
    }
}
