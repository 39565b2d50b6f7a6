//! Renderer & cache: turns a `TabView`'s current
//! page (and, later, VR layer placement from the `vr` crate) into
//! textures the SHM writer publishes. Platform-independent state
//! machine, cache and sprite-batch logic live here; the one seam that
//! actually touches a GPU (`GraphicsDevice`) is swappable, per
//! `backend`'s doc comment.
pub mod backend;
pub mod cache;
pub mod error;
pub mod sprite;
pub mod target;

pub use backend::{DXResources, DeviceGuard, GraphicsDevice, NullDevice, TextureId};
pub use cache::CachedLayer;
pub use error::RenderError;
pub use sprite::{DrawBatch, Sprite, SpriteBatch, SpriteVertex, MAX_VERTICES};
pub use target::{D2DGuard, D3DGuard, RenderTarget, RenderTargetWithMultipleIdentities};

#[cfg(windows)]
pub use backend::D3D11Device;
