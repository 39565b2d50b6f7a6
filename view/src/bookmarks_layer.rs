//! The optional bookmarks bar: a vertical strip of bookmark
//! entries down one side, shown only when the view has at least one
//! bookmark and the caller has opted in.
use std::sync::atomic::{AtomicBool, Ordering};

use geometry::{PixelRect, PixelSize};
use pagesource::PageSourceError;
use render::RenderTarget;
use shm::RenderTargetID;

use crate::layer::{IUILayer, Metrics};

pub const BOOKMARKS_WIDTH_PX: i32 = 40;

pub struct BookmarksLayer {
    visible: AtomicBool,
}

impl BookmarksLayer {
    pub fn new() -> Self {
        BookmarksLayer {
            visible: AtomicBool::new(false),
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::SeqCst);
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }
}

impl Default for BookmarksLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl IUILayer for BookmarksLayer {
    fn get_metrics(&self, available: PixelRect) -> Metrics {
        if !self.is_visible() {
            return Metrics {
                preferred_size: PixelSize::new(0, available.size.height),
                next_area: available,
                content_area: PixelRect::from_xywh(available.origin.x, available.origin.y, 0, available.size.height),
            };
        }
        let width = BOOKMARKS_WIDTH_PX.min(available.size.width);
        let content_area =
            PixelRect::from_xywh(available.origin.x, available.origin.y, width, available.size.height);
        let next_area = PixelRect::from_xywh(
            available.origin.x + width,
            available.origin.y,
            available.size.width - width,
            available.size.height,
        );
        Metrics {
            preferred_size: PixelSize::new(width, available.size.height),
            next_area,
            content_area,
        }
    }

    fn render(
        &self,
        _target_id: RenderTargetID,
        _target: &RenderTarget,
        _rect: PixelRect,
    ) -> Result<(), PageSourceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_bar_claims_no_width() {
        let bar = BookmarksLayer::new();
        let metrics = bar.get_metrics(PixelRect::from_xywh(0, 0, 800, 600));
        assert_eq!(metrics.content_area.size.width, 0);
        assert_eq!(metrics.next_area.size.width, 800);
    }

    #[test]
    fn visible_bar_claims_fixed_width_from_the_left() {
        let bar = BookmarksLayer::new();
        bar.set_visible(true);
        let metrics = bar.get_metrics(PixelRect::from_xywh(0, 0, 800, 600));
        assert_eq!(metrics.content_area.size.width, BOOKMARKS_WIDTH_PX);
        assert_eq!(metrics.next_area.origin.x, BOOKMARKS_WIDTH_PX);
    }
}
