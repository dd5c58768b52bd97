//! Backend abstraction layer
//!
//! Provides the texture surface the rendering collaborator implements, plus a
//! headless implementation used by tests and offline tools.

pub mod headless;
pub mod traits;
pub mod types;

pub use headless::HeadlessBackend;
pub use traits::*;
pub use types::*;
