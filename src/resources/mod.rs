//! Resource management
//!
//! Mesh geometry handed in by the host, and texture payloads handed back.

mod mesh;
mod texture;

pub use mesh::*;
pub use texture::*;
