//! The tab-content layer: the bottom of the `KneeboardView`
//! stack, delegating to whatever a `TabView`'s active source renders
//! for its current page.
use std::sync::Arc;

use geometry::PixelRect;
use pagesource::{CursorEvent, PageSourceError};
use render::RenderTarget;
use shm::RenderTargetID;

use crate::layer::{IUILayer, Metrics};
use crate::tabview::TabView;

pub struct TabContentLayer {
    tab_view: Arc<TabView>,
}

impl TabContentLayer {
    pub fn new(tab_view: Arc<TabView>) -> Self {
        TabContentLayer { tab_view }
    }

    pub fn tab_view(&self) -> &Arc<TabView> {
        &self.tab_view
    }
}

impl IUILayer for TabContentLayer {
    fn get_metrics(&self, available: PixelRect) -> Metrics {
        let preferred = self
            .tab_view
            .active_source()
            .preferred_size(self.tab_view.current_page_id())
            .map(|p| p.pixel_size)
            .unwrap_or(available.size);
        let content_size = preferred.integer_scaled_to_fit(available.size, geometry::ScaleToFitMode::ShrinkOnly);
        // Center within the available area.
        let x = available.origin.x + (available.size.width - content_size.width) / 2;
        let y = available.origin.y + (available.size.height - content_size.height) / 2;
        let content_area = PixelRect::from_xywh(x, y, content_size.width, content_size.height);
        Metrics {
            preferred_size: preferred,
            next_area: PixelRect::from_xywh(available.origin.x, available.origin.y, 0, 0),
            content_area,
        }
    }

    fn render(
        &self,
        target_id: RenderTargetID,
        target: &RenderTarget,
        rect: PixelRect,
    ) -> Result<(), PageSourceError> {
        let source = self.tab_view.active_source();
        let page_id = self.tab_view.current_page_id();
        source.render_page(target_id, target, page_id, rect)
    }

    fn post_cursor_event(&self, event: CursorEvent) {
        let source = self.tab_view.active_source();
        let page_id = self.tab_view.current_page_id();
        if let Some(with_cursor) = source.as_cursor_events() {
            with_cursor.post_cursor_event(page_id, event);
        }
    }
}
