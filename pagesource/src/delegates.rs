//! `PageSourceWithDelegates`: the reusable composite that
//! concatenates zero-or-more child page sources into one, routing
//! cursor input and caching on their behalf.
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use event::{Event, EventReceiver};
use geometry::PixelRect;
use render::{CachedLayer, GraphicsDevice, RenderError, RenderTarget};
use shm::{PageID, RenderTargetID};

use crate::doodle::DoodleRenderer;
use crate::error::PageSourceError;
use crate::source::PageSource;
use crate::types::{CursorEvent, PreferredSize};

/// Concatenates `delegates` in order, maintaining a `page_id ->
/// delegate index` map that is rebuilt whenever any delegate's
/// `evContentChanged` fires.
pub struct PageSourceWithDelegates {
    delegates: Vec<Arc<dyn PageSource>>,
    index: Arc<RwLock<HashMap<PageID, usize>>>,
    doodles: DoodleRenderer,
    content_cache: CachedLayer,
    needs_repaint: Arc<Event<()>>,
    page_appended: Arc<Event<PageID>>,
    content_changed: Arc<Event<()>>,
    _receiver: EventReceiver,
}

impl PageSourceWithDelegates {
    pub fn new(delegates: Vec<Arc<dyn PageSource>>, device: Arc<dyn GraphicsDevice>) -> Arc<Self> {
        let needs_repaint = Event::new();
        let page_appended = Event::new();
        let content_changed = Event::new();
        let index: Arc<RwLock<HashMap<PageID, usize>>> = Arc::new(RwLock::new(HashMap::new()));
        let receiver = EventReceiver::new();

        rebuild_index(&delegates, &index);

        for delegate in &delegates {
            let repaint_fwd = Arc::clone(&needs_repaint);
            delegate
                .needs_repaint()
                .add_handler(&receiver, move |_| repaint_fwd.emit(()));

            let append_fwd = Arc::clone(&page_appended);
            delegate
                .page_appended()
                .add_handler(&receiver, move |id| append_fwd.emit(id));
        }

        let composite = Arc::new(PageSourceWithDelegates {
            delegates,
            index,
            doodles: DoodleRenderer::new(Arc::clone(&device)),
            content_cache: CachedLayer::new(device),
            needs_repaint,
            page_appended,
            content_changed,
            _receiver: receiver,
        });

        for delegate in &composite.delegates {
            let composite = Arc::clone(&composite);
            delegate
                .content_changed()
                .add_handler(&composite._receiver, move |_| composite.on_delegate_content_changed());
        }

        composite
    }

    fn on_delegate_content_changed(&self) {
        rebuild_index(&self.delegates, &self.index);
        self.content_cache.invalidate_all();
        let keep: HashSet<PageID> = self.index.read().unwrap().keys().copied().collect();
        self.doodles.clear_except(&keep);
        self.content_changed.emit(());
    }

    fn delegate_for(&self, id: PageID) -> Option<Arc<dyn PageSource>> {
        let index = self.index.read().unwrap();
        index.get(&id).map(|&i| Arc::clone(&self.delegates[i]))
    }
}

fn rebuild_index(delegates: &[Arc<dyn PageSource>], index: &Arc<RwLock<HashMap<PageID, usize>>>) {
    let mut index = index.write().unwrap();
    index.clear();
    for (delegate_index, delegate) in delegates.iter().enumerate() {
        for page_id in delegate.page_ids() {
            index.insert(page_id, delegate_index);
        }
    }
}

impl PageSource for PageSourceWithDelegates {
    fn page_count(&self) -> usize {
        self.delegates.iter().map(|d| d.page_count()).sum()
    }

    fn page_ids(&self) -> Vec<PageID> {
        self.delegates.iter().flat_map(|d| d.page_ids()).collect()
    }

    fn preferred_size(&self, id: PageID) -> Option<PreferredSize> {
        self.delegate_for(id)?.preferred_size(id)
    }

    fn render_page(
        &self,
        target_id: RenderTargetID,
        target: &RenderTarget,
        id: PageID,
        rect: PixelRect,
    ) -> Result<(), PageSourceError> {
        let delegate = self
            .delegate_for(id)
            .ok_or(PageSourceError::UnknownPage(id))?;

        if delegate.has_internal_caching() {
            return delegate.render_page(target_id, target, id, rect);
        }

        // `CachedLayer::render`'s producer closure is bound to
        // `RenderError`; stash the real `PageSourceError` (if any) so
        // the caller sees the delegate's actual failure rather than a
        // generic cache miss.
        let failure: std::cell::RefCell<Option<PageSourceError>> = std::cell::RefCell::new(None);
        self.content_cache
            .render(target_id, id.raw(), rect.size, |_texture, _size| {
                delegate.render_page(target_id, target, id, rect).map_err(|e| {
                    *failure.borrow_mut() = Some(e);
                    RenderError::NoProducer(id.raw())
                })
            })
            .map(|_| ())
            .map_err(|e| {
                failure
                    .into_inner()
                    .unwrap_or_else(|| PageSourceError::LoadFailed(e.to_string()))
            })
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

    fn has_internal_caching(&self) -> bool {
        // The composite itself always caches externally via its own
        // `content_cache`, for delegates that don't cache internally.
        true
    }
}

impl PageSourceWithDelegates {
    /// Forwards a cursor event to the delegate owning `id`. Delegates
    /// without cursor support fall back to the shared doodle layer
    ///.
    pub fn post_cursor_event(&self, id: PageID, event: CursorEvent) {
        let Some(delegate) = self.delegate_for(id) else {
            return;
        };
        if let Some(with_cursor) = delegate.as_cursor_events() {
            with_cursor.post_cursor_event(id, event);
            return;
        }
        let native_size = delegate
            .preferred_size(id)
            .map(|p| p.pixel_size)
            .unwrap_or(geometry::PixelSize::new(1, 1));
        self.doodles.post_cursor_event(id, native_size, event);
    }

    pub fn doodles(&self) -> &DoodleRenderer {
        &self.doodles
    }
}
