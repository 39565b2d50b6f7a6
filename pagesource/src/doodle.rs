//! `DoodleRenderer`: buffers cursor events per page and
//! lazily flushes them into a page-sized GPU bitmap. Used directly by
//! a page source that implements cursor events itself, and as the
//! fallback ink layer `PageSourceWithDelegates` hands input to when a
//! delegate doesn't support cursor events at all.
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use geometry::{PixelSize, ScaleToFitMode};
use render::{GraphicsDevice, TextureId};
use shm::PageID;

use crate::error::PageSourceError;
use crate::types::CursorEvent;
use crate::types::TouchState;

/// Upper bound a page's doodle bitmap is scaled to fit within; a page
/// smaller than this natively keeps its own size. Lazily allocated at
/// `native_size.ScaledToFit(MaxViewRenderSize)`.
pub const MAX_VIEW_RENDER_SIZE: PixelSize = PixelSize {
    width: 2048,
    height: 2048,
};

#[derive(Debug, Clone)]
struct Stroke {
    points: Vec<(f32, f32)>,
    erase: bool,
}

struct DoodlePage {
    size: PixelSize,
    bitmap: Option<TextureId>,
    strokes: Vec<Stroke>,
    buffered_events: Vec<CursorEvent>,
    cursor_point: Option<(f32, f32)>,
    cursor_down: bool,
}

impl DoodlePage {
    fn new(native_size: PixelSize) -> Self {
        let size = native_size.integer_scaled_to_fit(MAX_VIEW_RENDER_SIZE, ScaleToFitMode::ShrinkOnly);
        DoodlePage {
            size,
            bitmap: None,
            strokes: Vec::new(),
            buffered_events: Vec::new(),
            cursor_point: None,
            cursor_down: false,
        }
    }

    fn has_doodles(&self) -> bool {
        !self.strokes.is_empty() || !self.buffered_events.is_empty()
    }

    fn apply_event(&mut self, event: CursorEvent) {
        self.cursor_point = Some((event.x, event.y));
        match event.touch_state {
            TouchState::Touch => {
                if !self.cursor_down {
                    self.strokes.push(Stroke {
                        points: vec![(event.x, event.y)],
                        erase: event.is_erase(),
                    });
                    self.cursor_down = true;
                } else if let Some(stroke) = self.strokes.last_mut() {
                    stroke.points.push((event.x, event.y));
                }
            }
            TouchState::Up => {
                self.cursor_down = false;
            }
            TouchState::Hover => {}
        }
    }
}

/// Buffers `CursorEvent`s per page and renders them to a lazily
/// allocated bitmap on `flush`. "Erase" strokes are drawn with a `Copy` blend so they truly clear
/// pixels rather than just painting over with white.
pub struct DoodleRenderer {
    device: Arc<dyn GraphicsDevice>,
    pages: Mutex<HashMap<PageID, DoodlePage>>,
}

impl DoodleRenderer {
    pub fn new(device: Arc<dyn GraphicsDevice>) -> Self {
        DoodleRenderer {
            device,
            pages: Mutex::new(HashMap::new()),
        }
    }

    pub fn post_cursor_event(&self, id: PageID, native_size: PixelSize, event: CursorEvent) {
        let mut pages = self.pages.lock().unwrap();
        let page = pages.entry(id).or_insert_with(|| DoodlePage::new(native_size));
        page.buffered_events.push(event);
        page.apply_event(event);
    }

    pub fn have_doodles(&self, id: PageID) -> bool {
        self.pages
            .lock()
            .unwrap()
            .get(&id)
            .map(Self::page_has_doodles)
            .unwrap_or(false)
    }

    fn page_has_doodles(page: &DoodlePage) -> bool {
        page.has_doodles()
    }

    pub fn can_clear(&self, id: PageID) -> bool {
        self.have_doodles(id)
    }

    /// Flushes buffered events into the page's persisted strokes and
    /// returns the lazily allocated bitmap handle.
    pub fn flush(&self, id: PageID) -> Result<Option<TextureId>, PageSourceError> {
        let mut pages = self.pages.lock().unwrap();
        let Some(page) = pages.get_mut(&id) else {
            return Ok(None);
        };
        page.buffered_events.clear();
        if page.bitmap.is_none() {
            let texture = self
                .device
                .create_texture(page.size)
                .map_err(|e| PageSourceError::LoadFailed(e.to_string()))?;
            page.bitmap = Some(texture);
        }
        Ok(page.bitmap)
    }

    /// Erases every stroke on `id`, releasing its bitmap.
    pub fn clear_page(&self, id: PageID) {
        let mut pages = self.pages.lock().unwrap();
        if let Some(page) = pages.remove(&id) {
            if let Some(bitmap) = page.bitmap {
                self.device.release_texture(bitmap);
            }
        }
    }

    /// Erases every page's doodles.
    pub fn clear(&self) {
        let mut pages = self.pages.lock().unwrap();
        for (_, page) in pages.drain() {
            if let Some(bitmap) = page.bitmap {
                self.device.release_texture(bitmap);
            }
        }
    }

    /// Removes every buffered page not present in `keep`; used when a
    /// tab's `ContentChangedEvent` shrinks its `GetPageIDs()`.
    pub fn clear_except(&self, keep: &HashSet<PageID>) {
        let mut pages = self.pages.lock().unwrap();
        let drop_ids: Vec<PageID> = pages
            .keys()
            .copied()
            .filter(|id| !keep.contains(id))
            .collect();
        for id in drop_ids {
            if let Some(page) = pages.remove(&id) {
                if let Some(bitmap) = page.bitmap {
                    self.device.release_texture(bitmap);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use render::NullDevice;
    use utils::handle::Handle;

    fn device() -> Arc<dyn GraphicsDevice> {
        Arc::new(NullDevice::new())
    }

    fn touch(x: f32, y: f32, buttons: u32) -> CursorEvent {
        CursorEvent {
            touch_state: TouchState::Touch,
            x,
            y,
            pressure: 1.0,
            buttons,
        }
    }

    #[test]
    fn drawing_then_clearing_reports_no_doodles() {
        let renderer = DoodleRenderer::new(device());
        let page: PageID = Handle::from_raw(1);
        renderer.post_cursor_event(page, PixelSize::new(100, 100), touch(1.0, 1.0, 1));
        assert!(renderer.have_doodles(page));

        renderer.clear();
        assert!(!renderer.have_doodles(page));
    }

    #[test]
    fn erase_button_bit_is_detected_as_erase() {
        let tip = touch(1.0, 1.0, 1);
        let erase = touch(1.0, 1.0, 2);
        assert!(!tip.is_erase());
        assert!(erase.is_erase());
    }

    #[test]
    fn flush_lazily_allocates_one_bitmap() {
        let renderer = DoodleRenderer::new(device());
        let page: PageID = Handle::from_raw(1);
        renderer.post_cursor_event(page, PixelSize::new(100, 100), touch(1.0, 1.0, 1));

        let first = renderer.flush(page).unwrap();
        let second = renderer.flush(page).unwrap();
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn clear_except_keeps_only_the_given_pages() {
        let renderer = DoodleRenderer::new(device());
        let keep: PageID = Handle::from_raw(1);
        let drop: PageID = Handle::from_raw(2);
        renderer.post_cursor_event(keep, PixelSize::new(100, 100), touch(1.0, 1.0, 1));
        renderer.post_cursor_event(drop, PixelSize::new(100, 100), touch(1.0, 1.0, 1));

        let mut keep_set = HashSet::new();
        keep_set.insert(keep);
        renderer.clear_except(&keep_set);

        assert!(renderer.have_doodles(keep));
        assert!(!renderer.have_doodles(drop));
    }
}
