//! Error taxonomy for the renderer: most render failures degrade to
//! an on-canvas error tile rather than aborting the SHM pipeline, but
//! a broken `RenderTarget` state-machine transition is `fatal!`.
use geometry::PixelSize;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create a {0:?} texture")]
    TextureCreation(PixelSize),
    #[error("GPU device lost")]
    DeviceLost,
    #[error("no producer available for cache key {0}")]
    NoProducer(u64),
}
