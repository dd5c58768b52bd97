//! Precompiled programs shared by every morph component
//!
//! The deformation program is compiled once per target count so it never
//! reads past the targets that exist. The morph core only selects programs
//! by name; their contents belong to the renderer.

use super::animation::MorphAnimation;
use super::MAX_TARGETS;
use crate::MorphConfig;

/// Opaque handle to a per-vertex deformation program
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeformationProgram {
    name: String,
    target_count: usize,
}

impl DeformationProgram {
    fn for_target_count(target_count: usize) -> Self {
        Self {
            name: format!("morph_geometry_target_count_{target_count}"),
            target_count,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_count(&self) -> usize {
        self.target_count
    }
}

/// Surface shading used for a morphed part
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SurfaceProgram {
    /// Keep the part's own material
    Inherited,
    /// Shade normals as colour
    DebugNormals { name: String },
}

/// Program table and configuration shared by morph components
#[derive(Debug, Clone)]
pub struct MorphEnvironment {
    config: MorphConfig,
    programs: [DeformationProgram; MAX_TARGETS],
    debug_surface: SurfaceProgram,
}

impl MorphEnvironment {
    pub fn new(config: MorphConfig) -> Self {
        Self {
            config,
            programs: std::array::from_fn(|i| DeformationProgram::for_target_count(i + 1)),
            debug_surface: SurfaceProgram::DebugNormals {
                name: "debug_normals".to_string(),
            },
        }
    }

    pub fn config(&self) -> &MorphConfig {
        &self.config
    }

    /// Program compiled for `target_count` targets
    pub fn program_for(&self, target_count: usize) -> Option<&DeformationProgram> {
        target_count
            .checked_sub(1)
            .and_then(|index| self.programs.get(index))
    }

    pub fn debug_surface(&self) -> &SurfaceProgram {
        &self.debug_surface
    }

    /// Spring animation using the configured bounce
    pub fn spring(&self, duration: f32) -> MorphAnimation {
        MorphAnimation::spring_with_bounce(duration, self.config.default_spring_bounce)
    }
}

impl Default for MorphEnvironment {
    fn default() -> Self {
        Self::new(MorphConfig::default())
    }
}
