//! `IUILayer` and `Metrics`: the shared contract the
//! `KneeboardView` layer stack lays out against, without any one
//! layer needing to know another's preferred size up front.
use geometry::PixelRect;
use pagesource::{CursorEvent, PageSourceError};
use render::RenderTarget;
use shm::RenderTargetID;

/// What one layer reports back to the stack that's laying it out
///.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metrics {
    /// The size this layer would like, given unlimited space.
    pub preferred_size: geometry::PixelSize,
    /// The remaining area left for layers below this one in the
    /// stack, after this layer has claimed its chrome.
    pub next_area: PixelRect,
    /// The area this layer actually occupies within the space it was
    /// given.
    pub content_area: PixelRect,
}

/// One layer in the `KneeboardView` stack (bookmarks bar, header,
/// footer, tab content). Each layer is handed the area the layer
/// above it left over, reports how it subdivided that area, and
/// re-maps cursor events into its own content area before forwarding
/// them further down the stack.
pub trait IUILayer: Send + Sync {
    /// Computes this layer's metrics for the given available area,
    /// without drawing anything.
    fn get_metrics(&self, available: PixelRect) -> Metrics;

    /// Renders this layer's chrome/content into `rect` (normally the
    /// `content_area` from `get_metrics`) of `target`.
    fn render(
        &self,
        target_id: RenderTargetID,
        target: &RenderTarget,
        rect: PixelRect,
    ) -> Result<(), PageSourceError>;

    /// Handles a cursor event already mapped into this layer's
    /// content-area coordinate space. Layers that don't consume
    /// cursor input (most chrome) simply do nothing.
    fn post_cursor_event(&self, _event: CursorEvent) {}
}
