//! A minimal concrete `IPageSource`: a fixed-order list of
//! synthetic, constant-colour pages. Grounded on the original
//! source's `FolderPageSource` (a directory of images turned into one
//! page per file) but without any real image decoding - each "page"
//! here is just a declared pixel size, enough to exercise navigation,
//! caching and placement without decoding real image files.
use std::sync::{Arc, Mutex};

use event::Event;
use geometry::{PixelRect, PixelSize};
use render::RenderTarget;
use shm::{PageID, RenderTargetID, PAGE_IDS};

use crate::error::PageSourceError;
use crate::source::PageSource;
use crate::types::PreferredSize;

#[derive(Clone)]
struct Page {
    id: PageID,
    size: PixelSize,
}

/// A fixed list of pages each with a declared native size,
/// appendable at runtime (tabs grow when the folder they watch gains
/// a file).
pub struct FolderPageSource {
    pages: Mutex<Vec<Page>>,
    needs_repaint: Arc<Event<()>>,
    page_appended: Arc<Event<PageID>>,
    content_changed: Arc<Event<()>>,
}

impl FolderPageSource {
    pub fn new(sizes: Vec<PixelSize>) -> Arc<Self> {
        let pages = sizes
            .into_iter()
            .map(|size| Page {
                id: PAGE_IDS.mint(),
                size,
            })
            .collect();
        Arc::new(FolderPageSource {
            pages: Mutex::new(pages),
            needs_repaint: Event::new(),
            page_appended: Event::new(),
            content_changed: Event::new(),
        })
    }

    /// Adds a page at the end, as if a new file appeared in the
    /// watched folder, and emits `evPageAppended`.
    pub fn append_page(&self, size: PixelSize) -> PageID {
        let id = PAGE_IDS.mint();
        self.pages.lock().unwrap().push(Page { id, size });
        self.page_appended.emit(id);
        id
    }
}

impl PageSource for FolderPageSource {
    fn page_count(&self) -> usize {
        self.pages.lock().unwrap().len()
    }

    fn page_ids(&self) -> Vec<PageID> {
        self.pages.lock().unwrap().iter().map(|p| p.id).collect()
    }

    fn preferred_size(&self, id: PageID) -> Option<PreferredSize> {
        self.pages
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .map(|p| PreferredSize::bitmap(p.size))
    }

    fn render_page(
        &self,
        _target_id: RenderTargetID,
        _target: &RenderTarget,
        id: PageID,
        _rect: PixelRect,
    ) -> Result<(), PageSourceError> {
        if !self.pages.lock().unwrap().iter().any(|p| p.id == id) {
            return Err(PageSourceError::UnknownPage(id));
        }
        // No real pixels to draw; existing as a page is enough to
        // exercise navigation, caching and placement above this layer.
        Ok(())
    }

    fn needs_repaint(&self) -> &Arc<Event<()>> {
        &self.needs_repaint
    }

    fn page_appended(&self) -> &Arc<Event<PageID>> {
        &self.page_appended
    }

    fn content_changed(&self) -> &Arc<Event<()>> {
        &self.content_changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(n: usize) -> Vec<PixelSize> {
        (0..n).map(|_| PixelSize::new(100, 100)).collect()
    }

    #[test]
    fn folder_over_three_images_reports_three_pages() {
        let source = FolderPageSource::new(sizes(3));
        assert_eq!(source.page_count(), 3);
        assert_eq!(source.page_ids().len(), 3);
    }

    #[test]
    fn appending_a_page_increases_count_and_emits_event() {
        let source = FolderPageSource::new(sizes(2));
        let seen = Arc::new(Mutex::new(None));
        let captured = Arc::clone(&seen);
        let receiver = event::EventReceiver::new();
        source
            .page_appended()
            .add_handler(&receiver, move |id| *captured.lock().unwrap() = Some(id));

        let new_id = source.append_page(PixelSize::new(50, 50));
        assert_eq!(source.page_count(), 3);
        assert_eq!(*seen.lock().unwrap(), Some(new_id));
    }
}
