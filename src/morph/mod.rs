//! Morph targets
//!
//! A base mesh is deformed towards up to [`MAX_TARGETS`] targets of identical
//! topology. Per-vertex offsets and normals of every target are packed into a
//! half-float atlas per mesh part, and a [`MorphComponent`] animates the blend
//! weights that a deformation program applies on the GPU:
//!
//! ```text
//! position = base + Σ weight[t] * offset[t]
//! ```

mod animation;
mod component;
mod encoder;
mod environment;
mod keyframes;
mod system;
mod topology;
mod weights;

pub use animation::*;
pub use component::*;
pub use encoder::*;
pub use environment::*;
pub use keyframes::*;
pub use system::*;
pub use topology::*;
pub use weights::*;

/// Most targets a single component can blend between
pub const MAX_TARGETS: usize = 4;
