// src/gfx/resources/mod.rs
//! Materials, textures and the asynchronous loader that fills them.

pub mod loader;
pub mod material;
pub mod source;
pub mod texture;

// Re-export main types
pub use loader::{LoadCallbacks, LoadRequest, LoadingManager};
pub use material::{BasicMaterial, MaterialUniform};
pub use source::{worker_pool, AssetSource, FetchExecutor, FileSource, InlineExecutor, MemorySource};
pub use texture::{ImageData, LoadStatus, Texture};
