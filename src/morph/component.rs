//! Morph component
//!
//! Owns the encoded atlases of an entity's mesh and the animation slot that
//! drives its weights. Built once from a base mesh and 1 to [`MAX_TARGETS`]
//! topologically identical targets, then ticked once per frame.

use std::sync::Arc;

use bevy_ecs::prelude::*;
use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use super::animation::{advance_state, MorphAnimation, MorphAnimator, MorphState};
use super::encoder::{encode, Atlas, EncodeError, PIXELS_PER_TARGET};
use super::environment::{DeformationProgram, MorphEnvironment, SurfaceProgram};
use super::keyframes::{Keyframe, KeyframeTimeline};
use super::topology::{self, TopologyMismatch};
use super::{MorphWeights, MAX_TARGETS};
use crate::backend::traits::{BackendError, TextureBackend, TextureHandle};
use crate::resources::{GpuTexture, MeshPart, ModelMesh, TextureData};
use crate::MorphConfig;

/// Errors raised while building a [`MorphComponent`].
///
/// Construction either fully succeeds or leaves nothing behind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MorphError {
    #[error("base entity has no renderable geometry")]
    MissingBaseMesh,
    #[error("expected between 1 and {max} targets, got {count}")]
    InvalidTargetCount { count: usize, max: usize },
    #[error(transparent)]
    TopologyMismatch(#[from] TopologyMismatch),
    #[error("{pixels} packed pixels exceed the texture capacity of {capacity}")]
    GeometryTooLarge { pixels: usize, capacity: usize },
    #[error("target {target_index} has {positions} positions but {normals} normals")]
    NormalsCountMismatch {
        target_index: usize,
        positions: usize,
        normals: usize,
    },
    #[error("could not build morph atlas: {0}")]
    EncodingFailed(#[source] EncodeError),
    #[error("could not upload morph atlas: {0}")]
    UploadFailed(#[from] BackendError),
}

impl From<EncodeError> for MorphError {
    fn from(err: EncodeError) -> Self {
        match err {
            EncodeError::InvalidTargetCount { count, max } => {
                Self::InvalidTargetCount { count, max }
            }
            EncodeError::PositionsNormalsCountMismatch {
                target_index,
                positions,
                normals,
                ..
            } => Self::NormalsCountMismatch {
                target_index,
                positions,
                normals,
            },
            EncodeError::GeometryTooLarge { pixels, capacity } => {
                Self::GeometryTooLarge { pixels, capacity }
            }
            err @ (EncodeError::EmptyPart | EncodeError::AllocationFailed { .. }) => {
                Self::EncodingFailed(err)
            }
        }
    }
}

/// Construction flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MorphOptions {
    /// Shade normals as colour instead of using the part's material
    pub debug_normals: bool,
}

impl MorphOptions {
    pub fn debug_normals() -> Self {
        Self {
            debug_normals: true,
        }
    }
}

/// Material slot of one morphed part.
///
/// The deformation program has no notion of which part it runs on, so every
/// part gets a slot of its own even if parts shared a material before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MorphMaterial {
    pub material_index: usize,
    pub source_material: usize,
    pub surface: SurfaceProgram,
    pub geometry: DeformationProgram,
}

/// Encoded data of one part of the base mesh
#[derive(Debug, Clone)]
pub struct MorphPart {
    pub submesh: usize,
    pub part: usize,
    pub atlas: Arc<Atlas>,
    pub texture: TextureHandle,
    pub material: MorphMaterial,
}

/// Uniform block read by the deformation program
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable, PartialEq)]
pub struct MorphUniforms {
    pub weights: [f32; 4],
    pub vertex_count: u32,
    pub target_count: u32,
    pub _padding: [u32; 2],
}

/// What the renderer needs to draw one part this frame
#[derive(Debug, Clone)]
pub struct PartUpdate {
    pub material_index: usize,
    pub texture: TextureHandle,
    pub atlas: Arc<Atlas>,
    pub weights: MorphWeights,
}

impl PartUpdate {
    pub fn vertex_count(&self) -> usize {
        self.atlas.vertex_count()
    }

    pub fn uniforms(&self) -> MorphUniforms {
        MorphUniforms {
            weights: self.weights.to_array(),
            vertex_count: self.atlas.vertex_count() as u32,
            target_count: self.atlas.target_count() as u32,
            _padding: [0; 2],
        }
    }
}

/// Weights and per-part resources to hand to the renderer
#[derive(Debug, Clone)]
pub struct RenderUpdate {
    pub weights: MorphWeights,
    pub parts: Vec<PartUpdate>,
}

/// Morph target animation state of an entity
#[derive(Component, Debug)]
pub struct MorphComponent {
    /// Weights most recently requested, ignoring animation in flight
    weights: MorphWeights,
    /// Weights most recently handed to the renderer
    current_weights: MorphWeights,
    state: MorphState,
    parts: Vec<MorphPart>,
    target_count: usize,
    program: DeformationProgram,
    options: MorphOptions,
    spring_epsilon: f32,
}

impl MorphComponent {
    /// Encode `targets` against `base` and upload one atlas per part.
    pub fn new<B: TextureBackend>(
        base: &ModelMesh,
        targets: &[ModelMesh],
        weights: MorphWeights,
        options: MorphOptions,
        env: &MorphEnvironment,
        backend: &mut B,
    ) -> Result<Self, MorphError> {
        if base.is_empty() {
            return Err(MorphError::MissingBaseMesh);
        }
        let program = env
            .program_for(targets.len())
            .cloned()
            .ok_or(MorphError::InvalidTargetCount {
                count: targets.len(),
                max: MAX_TARGETS,
            })?;

        let base_topology = base.topology();
        let target_topologies: Vec<_> = targets.iter().map(ModelMesh::topology).collect();
        topology::validate(&base_topology, &target_topologies)?;

        let config = env.config();
        let pixels = base_topology.vertex_count() * targets.len() * PIXELS_PER_TARGET;
        let capacity = config.max_texture_width as usize * config.max_texture_width as usize;
        if pixels > capacity {
            return Err(MorphError::GeometryTooLarge { pixels, capacity });
        }

        let surface = if options.debug_normals {
            env.debug_surface().clone()
        } else {
            SurfaceProgram::Inherited
        };

        let mut parts = Vec::with_capacity(base_topology.part_count());
        if let Err(err) =
            Self::build_parts(base, targets, &surface, &program, config, backend, &mut parts)
        {
            for part in &parts {
                backend.destroy_texture(part.texture);
            }
            return Err(err);
        }

        log::debug!(
            "Morph component for '{}': {} submesh(es), {} part(s), {} target(s), atlases {:?}",
            base.name,
            base_topology.submesh_count(),
            parts.len(),
            targets.len(),
            parts
                .iter()
                .map(|p| (p.atlas.width(), p.atlas.height()))
                .collect::<Vec<_>>()
        );

        Ok(Self {
            weights,
            current_weights: weights,
            state: MorphState::Idle,
            parts,
            target_count: targets.len(),
            program,
            options,
            spring_epsilon: config.spring_settle_epsilon,
        })
    }

    fn build_parts<B: TextureBackend>(
        base: &ModelMesh,
        targets: &[ModelMesh],
        surface: &SurfaceProgram,
        program: &DeformationProgram,
        config: &MorphConfig,
        backend: &mut B,
        parts: &mut Vec<MorphPart>,
    ) -> Result<(), MorphError> {
        for (submesh_index, submesh) in base.submeshes.iter().enumerate() {
            for (part_index, part) in submesh.parts.iter().enumerate() {
                let target_parts: Vec<&MeshPart> = targets
                    .iter()
                    .filter_map(|target| target.part(submesh_index, part_index))
                    .collect();

                let atlas = encode(part, &target_parts, config.max_texture_width)?;
                let name = format!("{}_morph_{}_{}", base.name, submesh_index, part_index);
                let texture = GpuTexture::create(backend, &TextureData::from_atlas(&atlas, &name))?;

                let material_index = parts.len();
                parts.push(MorphPart {
                    submesh: submesh_index,
                    part: part_index,
                    atlas: Arc::new(atlas),
                    texture: texture.handle,
                    material: MorphMaterial {
                        material_index,
                        source_material: part.material_index,
                        surface: surface.clone(),
                        geometry: program.clone(),
                    },
                });
            }
        }
        Ok(())
    }

    /// Weights most recently requested
    pub fn weights(&self) -> MorphWeights {
        self.weights
    }

    /// Weights most recently reported to the renderer
    pub fn current_weights(&self) -> MorphWeights {
        self.current_weights
    }

    pub fn state(&self) -> &MorphState {
        &self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state.is_running()
    }

    pub fn parts(&self) -> &[MorphPart] {
        &self.parts
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }

    pub fn program(&self) -> &DeformationProgram {
        &self.program
    }

    pub fn options(&self) -> MorphOptions {
        self.options
    }

    pub fn materials(&self) -> impl Iterator<Item = &MorphMaterial> {
        self.parts.iter().map(|p| &p.material)
    }

    /// Request new weights.
    ///
    /// [`weights`](Self::weights) changes immediately. The animation starts
    /// from the current weights, replacing any animation in flight.
    pub fn set_target_weights(&mut self, weights: impl Into<MorphWeights>, animation: MorphAnimation) {
        let target = weights.into();
        self.weights = target;
        self.state = MorphState::Running(MorphAnimator::with_spring_epsilon(
            self.current_weights,
            target,
            animation,
            self.spring_epsilon,
        ));
    }

    /// Request new weights with a linear animation of `duration` seconds
    pub fn set_target_weights_over(&mut self, weights: impl Into<MorphWeights>, duration: f32) {
        self.set_target_weights(weights, MorphAnimation::linear(duration));
    }

    /// Animate through `keyframes`, starting from the current weights.
    ///
    /// [`weights`](Self::weights) becomes the last keyframe's target.
    pub fn set_target_keyframes(&mut self, keyframes: &[Keyframe]) {
        let timeline =
            KeyframeTimeline::with_spring_epsilon(self.current_weights, keyframes, self.spring_epsilon);
        let animator = MorphAnimator::from_timeline(timeline);
        self.weights = animator.target();
        self.state = MorphState::Running(animator);
    }

    /// Advance the animation by `delta_time` seconds.
    ///
    /// Returns an update while an animation is active, including the frame on
    /// which it completes. Returns `None` once idle.
    pub fn tick(&mut self, delta_time: f32) -> Option<RenderUpdate> {
        let (state, event) = advance_state(std::mem::take(&mut self.state), delta_time);
        self.state = state;
        let event = event?;
        self.current_weights = event.weights;
        Some(self.render_state())
    }

    /// Current weights and resources of every part
    pub fn render_state(&self) -> RenderUpdate {
        RenderUpdate {
            weights: self.current_weights,
            parts: self
                .parts
                .iter()
                .map(|part| PartUpdate {
                    material_index: part.material.material_index,
                    texture: part.texture,
                    atlas: Arc::clone(&part.atlas),
                    weights: self.current_weights,
                })
                .collect(),
        }
    }

    /// Destroy the textures this component owns
    pub fn release<B: TextureBackend>(self, backend: &mut B) {
        for part in &self.parts {
            backend.destroy_texture(part.texture);
        }
    }
}
