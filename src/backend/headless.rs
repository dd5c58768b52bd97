//! Headless texture backend for testing and offline tools.
//!
//! This backend doesn't talk to a GPU. Uploaded texture bytes are kept in
//! memory so they can be read back and inspected.

use std::collections::HashMap;

use super::traits::{BackendError, BackendResult, TextureBackend, TextureHandle};
use super::types::TextureDescriptor;

struct HeadlessTexture {
    descriptor: TextureDescriptor,
    data: Vec<u8>,
}

/// CPU-only [`TextureBackend`].
#[derive(Default)]
pub struct HeadlessBackend {
    textures: HashMap<TextureHandle, HeadlessTexture>,
    next_id: u64,
    /// Creation fails once this many textures are alive.
    texture_limit: Option<usize>,
}

impl HeadlessBackend {
    /// Create a new headless backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend that refuses to hold more than `limit` live textures.
    pub fn with_texture_limit(limit: usize) -> Self {
        Self {
            texture_limit: Some(limit),
            ..Self::default()
        }
    }

    /// Number of textures currently alive.
    pub fn live_textures(&self) -> usize {
        self.textures.len()
    }

    /// Bytes last written to a texture.
    pub fn texture_data(&self, texture: TextureHandle) -> Option<&[u8]> {
        self.textures.get(&texture).map(|t| t.data.as_slice())
    }

    /// Descriptor the texture was created with.
    pub fn texture_descriptor(&self, texture: TextureHandle) -> Option<&TextureDescriptor> {
        self.textures.get(&texture).map(|t| &t.descriptor)
    }
}

impl TextureBackend for HeadlessBackend {
    fn create_texture(&mut self, desc: &TextureDescriptor) -> BackendResult<TextureHandle> {
        if self
            .texture_limit
            .is_some_and(|limit| self.textures.len() >= limit)
        {
            return Err(BackendError::OutOfMemory);
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::TextureCreationFailed(format!(
                "{:?} has zero extent ({}x{})",
                desc.label, desc.width, desc.height
            )));
        }

        log::trace!(
            "HeadlessBackend: creating texture {:?} ({}x{} {:?})",
            desc.label,
            desc.width,
            desc.height,
            desc.format
        );

        let handle = TextureHandle(self.next_id);
        self.next_id += 1;
        self.textures.insert(
            handle,
            HeadlessTexture {
                descriptor: desc.clone(),
                data: vec![0; desc.byte_size()],
            },
        );
        Ok(handle)
    }

    fn write_texture(
        &mut self,
        texture: TextureHandle,
        data: &[u8],
        width: u32,
        height: u32,
    ) -> BackendResult<()> {
        let entry = self.textures.get_mut(&texture).ok_or_else(|| {
            BackendError::TextureWriteFailed(format!("unknown texture {}", texture.0))
        })?;
        let desc = &entry.descriptor;
        if width != desc.width || height != desc.height || data.len() != desc.byte_size() {
            return Err(BackendError::TextureWriteFailed(format!(
                "{} bytes for {}x{} do not fit {:?} ({}x{})",
                data.len(),
                width,
                height,
                desc.label,
                desc.width,
                desc.height
            )));
        }

        log::trace!("HeadlessBackend: writing {} bytes to texture {}", data.len(), texture.0);
        entry.data.clear();
        entry.data.extend_from_slice(data);
        Ok(())
    }

    fn destroy_texture(&mut self, texture: TextureHandle) {
        log::trace!("HeadlessBackend: destroying texture {}", texture.0);
        self.textures.remove(&texture);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::TextureFormat;

    fn descriptor(width: u32, height: u32) -> TextureDescriptor {
        TextureDescriptor {
            label: Some("test".into()),
            width,
            height,
            format: TextureFormat::Rgba16Float,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_write_destroy() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.create_texture(&descriptor(2, 1)).unwrap();
        assert_eq!(backend.live_textures(), 1);
        assert_eq!(backend.texture_data(handle).unwrap().len(), 16);

        let bytes: Vec<u8> = (0..16).collect();
        backend.write_texture(handle, &bytes, 2, 1).unwrap();
        assert_eq!(backend.texture_data(handle), Some(bytes.as_slice()));

        backend.destroy_texture(handle);
        assert_eq!(backend.live_textures(), 0);
        assert!(backend.texture_data(handle).is_none());
    }

    #[test]
    fn test_write_size_mismatch() {
        let mut backend = HeadlessBackend::new();
        let handle = backend.create_texture(&descriptor(2, 2)).unwrap();
        let result = backend.write_texture(handle, &[0; 8], 2, 2);
        assert!(matches!(result, Err(BackendError::TextureWriteFailed(_))));
    }

    #[test]
    fn test_zero_extent_rejected() {
        let mut backend = HeadlessBackend::new();
        assert!(backend.create_texture(&descriptor(0, 4)).is_err());
    }

    #[test]
    fn test_texture_limit() {
        let mut backend = HeadlessBackend::with_texture_limit(1);
        backend.create_texture(&descriptor(1, 1)).unwrap();
        assert_eq!(
            backend.create_texture(&descriptor(1, 1)),
            Err(BackendError::OutOfMemory)
        );
    }
}
