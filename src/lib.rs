//! Morph Engine - morph targets (blend shapes) for the graphics engine
//!
//! Deforms a base mesh towards up to four target meshes of identical topology,
//! blended by an animated weight vector.
//!
//! # Features
//! - Half-float delta atlases, one texture per mesh part
//! - Deformation program selection by target count
//! - Linear, cubic, spring and keyframed weight animation
//! - Entity Component System (ECS) integration using Bevy ECS
//! - Headless texture backend for tests and offline tools

pub mod backend;
pub mod morph;
pub mod resources;

// Re-export Bevy ECS prelude for users
pub use bevy_ecs::prelude::*;

pub use backend::HeadlessBackend;
pub use morph::{
    MorphAnimation, MorphComponent, MorphEnvironment, MorphError, MorphOptions, MorphWeights,
    RenderUpdate, MAX_TARGETS,
};
pub use resources::ModelMesh;

/// Configuration shared by every morph component of an environment
#[derive(Debug, Clone, PartialEq)]
pub struct MorphConfig {
    /// Widest atlas texture, also bounding its height
    pub max_texture_width: u32,
    /// Bounce of springs requested without one
    pub default_spring_bounce: f32,
    /// A spring counts as settled once within this fraction of its travel
    pub spring_settle_epsilon: f32,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            max_texture_width: morph::MAX_TEXTURE_WIDTH,
            default_spring_bounce: morph::DEFAULT_SPRING_BOUNCE,
            spring_settle_epsilon: morph::DEFAULT_SPRING_EPSILON,
        }
    }
}
