//! `KneeboardView`: composes the bookmarks/header/footer/
//! tab-content layer stack into one renderable view, and owns the
//! per-view `KneeboardViewID` and bookmark list.
use std::sync::Arc;

use geometry::PixelRect;
use pagesource::CursorEvent;
use render::RenderTarget;
use shm::{KneeboardViewID, RenderTargetID, KNEEBOARD_VIEW_IDS};

use crate::bookmark::BookmarkList;
use crate::bookmarks_layer::BookmarksLayer;
use crate::footer::FooterLayer;
use crate::header::HeaderLayer;
use crate::layer::IUILayer;
use crate::tabcontent::TabContentLayer;
use crate::tabview::TabView;

/// The fixed four-layer stack, top to bottom: bookmarks (optional),
/// header, footer, then the active tab's content.
pub struct KneeboardView {
    id: KneeboardViewID,
    bookmarks_layer: BookmarksLayer,
    header: HeaderLayer,
    footer: FooterLayer,
    content: TabContentLayer,
    bookmarks: BookmarkList,
}

impl KneeboardView {
    pub fn new(tab_view: Arc<TabView>) -> Self {
        KneeboardView {
            id: KNEEBOARD_VIEW_IDS.mint(),
            bookmarks_layer: BookmarksLayer::new(),
            header: HeaderLayer::new(),
            footer: FooterLayer::new(),
            content: TabContentLayer::new(tab_view),
            bookmarks: BookmarkList::new(),
        }
    }

    pub fn id(&self) -> KneeboardViewID {
        self.id
    }

    pub fn header(&self) -> &HeaderLayer {
        &self.header
    }

    pub fn footer(&self) -> &FooterLayer {
        &self.footer
    }

    pub fn bookmarks_layer(&self) -> &BookmarksLayer {
        &self.bookmarks_layer
    }

    pub fn bookmarks(&self) -> &BookmarkList {
        &self.bookmarks
    }

    pub fn bookmarks_mut(&mut self) -> &mut BookmarkList {
        &mut self.bookmarks
    }

    pub fn tab_view(&self) -> &Arc<TabView> {
        self.content.tab_view()
    }

    /// Lays out the stack top to bottom within `canvas`, returning the
    /// ordered `(layer, content_area)` pairs a caller can render or
    /// hit-test against. The bookmarks bar goes first (leftmost), then
    /// header (top), then footer (bottom), then whatever's left goes
    /// to the tab content.
    fn layout(&self, canvas: PixelRect) -> Vec<(&dyn IUILayer, PixelRect)> {
        let mut areas = Vec::with_capacity(4);
        let mut remaining = canvas;

        let bookmarks_metrics = self.bookmarks_layer.get_metrics(remaining);
        areas.push((&self.bookmarks_layer as &dyn IUILayer, bookmarks_metrics.content_area));
        remaining = bookmarks_metrics.next_area;

        let header_metrics = self.header.get_metrics(remaining);
        areas.push((&self.header as &dyn IUILayer, header_metrics.content_area));
        remaining = header_metrics.next_area;

        let footer_metrics = self.footer.get_metrics(remaining);
        areas.push((&self.footer as &dyn IUILayer, footer_metrics.content_area));
        remaining = footer_metrics.next_area;

        let content_metrics = self.content.get_metrics(remaining);
        areas.push((&self.content as &dyn IUILayer, content_metrics.content_area));

        areas
    }

    /// Renders every layer in the stack, in top-to-bottom order, into
    /// `target` within `canvas`.
    pub fn render(
        &self,
        target_id: RenderTargetID,
        target: &RenderTarget,
        canvas: PixelRect,
    ) -> Result<(), pagesource::PageSourceError> {
        for (layer, area) in self.layout(canvas) {
            if !area.is_empty() {
                layer.render(target_id, target, area)?;
            }
        }
        Ok(())
    }

    /// Re-maps `point` against the current layout and dispatches the
    /// cursor event to whichever layer's content area contains it.
    /// `event`'s position is expected in `canvas`-relative coordinates
    /// and is re-mapped to be relative to the hit layer's own content
    /// area before being forwarded.
    pub fn post_cursor_event(&self, canvas: PixelRect, event: CursorEvent) {
        for (layer, area) in self.layout(canvas) {
            if area.is_empty() {
                continue;
            }
            if point_in_rect(event.x, event.y, area) {
                let mut local = event;
                local.x -= area.origin.x as f32;
                local.y -= area.origin.y as f32;
                layer.post_cursor_event(local);
                return;
            }
        }
    }
}

fn point_in_rect(x: f32, y: f32, rect: PixelRect) -> bool {
    x >= rect.origin.x as f32
        && y >= rect.origin.y as f32
        && x < rect.right() as f32
        && y < rect.bottom() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::PixelSize;
    use pagesource::FolderPageSource;

    fn view() -> KneeboardView {
        let source = FolderPageSource::new(vec![PixelSize::new(200, 200)]);
        let tab_view = TabView::new(source);
        KneeboardView::new(tab_view)
    }

    #[test]
    fn distinct_views_get_distinct_ids() {
        assert_ne!(view().id(), view().id());
    }

    #[test]
    fn layout_stacks_header_above_footer_above_content() {
        let v = view();
        let canvas = PixelRect::from_xywh(0, 0, 800, 600);
        let areas = v.layout(canvas);
        assert_eq!(areas.len(), 4);
        let header_area = areas[1].1;
        let footer_area = areas[2].1;
        let content_area = areas[3].1;
        assert!(header_area.origin.y < footer_area.origin.y);
        assert!(content_area.origin.y >= header_area.bottom());
        assert!(content_area.bottom() <= footer_area.origin.y);
    }

    #[test]
    fn showing_bookmarks_bar_shrinks_everything_else_horizontally() {
        let v = view();
        let canvas = PixelRect::from_xywh(0, 0, 800, 600);
        let before = v.layout(canvas)[3].1;

        v.bookmarks_layer().set_visible(true);
        let after = v.layout(canvas)[3].1;

        assert!(after.size.width < before.size.width);
    }
}
