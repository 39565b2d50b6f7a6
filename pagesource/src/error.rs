//! Error taxonomy for page sources: a page that fails to load or
//! render degrades to the caller substituting an error tile rather
//! than tearing down the tab, so these are ordinary `Result` errors,
//! never `fatal!`.
use geometry::PixelSize;
use shm::PageID;

#[derive(Debug, thiserror::Error)]
pub enum PageSourceError {
    #[error("unknown page id {0:?}")]
    UnknownPage(PageID),
    #[error("failed to load page content: {0}")]
    LoadFailed(String),
    #[error("render target too small for a {0:?} page")]
    RenderTargetTooSmall(PixelSize),
}
