//! Per-frame morph update system.
//!
//! Drives every [`MorphComponent`] by the frame's delta time and collects the
//! resulting [`RenderUpdate`]s into [`MorphRenderQueue`]. The queue only ever
//! holds the current frame's updates, at most one per entity.

use bevy_ecs::prelude::*;

use super::component::{MorphComponent, MorphError, MorphOptions, RenderUpdate};
use super::environment::MorphEnvironment;
use super::MorphWeights;
use crate::backend::traits::TextureBackend;
use crate::resources::ModelMesh;

/// Time since the previous frame
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameTime {
    pub delta_seconds: f32,
}

impl FrameTime {
    pub fn new(delta_seconds: f32) -> Self {
        Self { delta_seconds }
    }
}

/// Render updates produced by the latest frame, in query order
#[derive(Resource, Debug, Default)]
pub struct MorphRenderQueue {
    updates: Vec<(Entity, RenderUpdate)>,
}

impl MorphRenderQueue {
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    pub fn get(&self, entity: Entity) -> Option<&RenderUpdate> {
        self.updates
            .iter()
            .find(|(e, _)| *e == entity)
            .map(|(_, update)| update)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Entity, &RenderUpdate)> {
        self.updates.iter().map(|(entity, update)| (*entity, update))
    }

    /// Take the pending updates, leaving the queue empty
    pub fn drain(&mut self) -> Vec<(Entity, RenderUpdate)> {
        std::mem::take(&mut self.updates)
    }
}

/// Advances every morph component by [`FrameTime`].
///
/// Replaces the previous frame's updates. Idle components produce nothing.
pub fn morph_update_system(
    frame_time: Res<FrameTime>,
    mut query: Query<(Entity, &mut MorphComponent)>,
    mut queue: ResMut<MorphRenderQueue>,
) {
    queue.updates.clear();
    for (entity, mut morph) in query.iter_mut() {
        if !morph.is_animating() {
            continue;
        }
        if let Some(update) = morph.tick(frame_time.delta_seconds) {
            queue.updates.push((entity, update));
        }
    }
}

/// Insert the morph resources into `world` and add the update system to
/// `schedule`.
pub fn register_morph_system(world: &mut World, schedule: &mut Schedule) {
    world.init_resource::<FrameTime>();
    world.init_resource::<MorphRenderQueue>();
    schedule.add_systems(morph_update_system);
}

/// Build a [`MorphComponent`] from the entity's [`ModelMesh`] and insert it.
///
/// The entity is left untouched on failure.
pub fn attach_morph_component<B: TextureBackend>(
    world: &mut World,
    entity: Entity,
    targets: &[ModelMesh],
    weights: MorphWeights,
    options: MorphOptions,
    env: &MorphEnvironment,
    backend: &mut B,
) -> Result<(), MorphError> {
    let base = world
        .get::<ModelMesh>(entity)
        .ok_or(MorphError::MissingBaseMesh)?;
    let component = MorphComponent::new(base, targets, weights, options, env, backend)?;
    world.entity_mut(entity).insert(component);
    Ok(())
}
