//! Core backend abstraction traits
//!
//! The morph core never renders anything itself. It only needs somewhere to
//! put the encoded atlases, which is what [`TextureBackend`] describes.

use crate::backend::types::*;
use thiserror::Error;

/// Backend error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to write texture: {0}")]
    TextureWriteFailed(String),
    #[error("Out of memory")]
    OutOfMemory,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Handle to a GPU texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub(crate) u64);

/// Texture storage exposed by the rendering collaborator
pub trait TextureBackend {
    /// Create a texture
    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle>;

    /// Write data to a texture
    fn write_texture(
        &mut self,
        texture: TextureHandle,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> BackendResult<()>;

    /// Destroy a texture
    fn destroy_texture(&mut self, texture: TextureHandle);
}
