//! Texture payloads and uploads

use crate::backend::traits::*;
use crate::backend::types::*;
use crate::morph::Atlas;

/// Texture bytes ready for upload
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
    pub name: String,
}

impl TextureData {
    /// Build an `Rgba16Float` payload from an atlas.
    ///
    /// GPU APIs have no sampled three-channel half format, so alpha is
    /// added and left at zero.
    pub fn from_atlas(atlas: &Atlas, name: &str) -> Self {
        let rgba = atlas.to_rgba();
        Self {
            width: atlas.width(),
            height: atlas.height(),
            format: TextureFormat::Rgba16Float,
            data: bytemuck::cast_slice(&rgba).to_vec(),
            name: name.to_string(),
        }
    }
}

/// GPU texture owned by whoever created it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuTexture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub name: String,
}

impl GpuTexture {
    /// Create and upload texture to GPU
    pub fn create<B: TextureBackend>(backend: &mut B, data: &TextureData) -> BackendResult<Self> {
        let handle = backend.create_texture(&TextureDescriptor {
            label: Some(data.name.clone()),
            width: data.width,
            height: data.height,
            mip_levels: 1,
            format: data.format,
            usage: TextureUsage::TEXTURE_BINDING | TextureUsage::COPY_DST,
        })?;

        if let Err(err) = backend.write_texture(handle, &data.data, data.width, data.height) {
            backend.destroy_texture(handle);
            return Err(err);
        }

        Ok(Self {
            handle,
            width: data.width,
            height: data.height,
            format: data.format,
            name: data.name.clone(),
        })
    }
}
