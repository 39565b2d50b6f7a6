//! `TabView`: navigation state for one root tab, with
//! optional sub-tab ("Navigation mode", e.g. a PDF's table of
//! contents opened as its own browsable source) layered on top.
use std::sync::{Arc, Mutex};

use event::{Event, EventReceiver};
use pagesource::PageSource;
use shm::PageID;

/// A tab is either showing its own pages (`Normal`) or a sub-tab
/// opened on top of it (`Navigation`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabMode {
    Normal,
    Navigation,
}

struct State {
    sub_tab: Option<Arc<dyn PageSource>>,
    current_page: PageID,
    mode: TabMode,
    /// The root tab's page, saved when a sub-tab is set, so leaving
    /// Navigation mode returns to where the user was.
    saved_root_page: Option<PageID>,
}

/// One tab's navigation state: which page is current, and whether a
/// sub-tab (e.g. a navigation/table-of-contents source) is currently
/// overriding the root tab's own pages.
pub struct TabView {
    root_tab: Arc<dyn PageSource>,
    state: Mutex<State>,
    page_changed: Arc<Event<PageID>>,
    /// Subscriptions to the root tab's own events; live for the whole
    /// lifetime of the `TabView`.
    _root_receiver: EventReceiver,
    /// Subscriptions to whichever sub-tab is currently set; replaced
    /// wholesale whenever the sub-tab changes.
    sub_receiver: Mutex<EventReceiver>,
}

impl TabView {
    pub fn new(root_tab: Arc<dyn PageSource>) -> Arc<Self> {
        let first_page = root_tab.page_ids().first().copied().unwrap_or(PageID::NULL);
        let root_receiver = EventReceiver::new();

        let view = Arc::new(TabView {
            root_tab: Arc::clone(&root_tab),
            state: Mutex::new(State {
                sub_tab: None,
                current_page: first_page,
                mode: TabMode::Normal,
                saved_root_page: None,
            }),
            page_changed: Event::new(),
            _root_receiver: root_receiver,
            sub_receiver: Mutex::new(EventReceiver::new()),
        });

        {
            let weak = Arc::downgrade(&view);
            root_tab
                .page_appended()
                .add_handler(&view._root_receiver, move |new_id| {
                    if let Some(view) = weak.upgrade() {
                        view.on_root_page_appended(new_id);
                    }
                });
        }
        {
            let weak = Arc::downgrade(&view);
            root_tab
                .content_changed()
                .add_handler(&view._root_receiver, move |()| {
                    if let Some(view) = weak.upgrade() {
                        view.on_active_content_changed();
                    }
                });
        }

        view
    }

    pub fn root_tab(&self) -> &Arc<dyn PageSource> {
        &self.root_tab
    }

    pub fn mode(&self) -> TabMode {
        self.state.lock().unwrap().mode
    }

    /// The source whose pages `current_page_id` indexes into: the
    /// sub-tab while in Navigation mode, the root tab otherwise.
    pub fn active_source(&self) -> Arc<dyn PageSource> {
        let state = self.state.lock().unwrap();
        match &state.sub_tab {
            Some(sub) if state.mode == TabMode::Navigation => Arc::clone(sub),
            _ => Arc::clone(&self.root_tab),
        }
    }

    pub fn current_page_id(&self) -> PageID {
        self.state.lock().unwrap().current_page
    }

    pub fn page_changed(&self) -> &Arc<Event<PageID>> {
        &self.page_changed
    }

    /// Sets the current page within the active source. A `page_id`
    /// not present in the active source's `page_ids()` is ignored
    /// (returns `false`).
    pub fn set_page_id(self: &Arc<Self>, page_id: PageID) -> bool {
        let active = self.active_source();
        if !active.page_ids().contains(&page_id) {
            return false;
        }
        self.state.lock().unwrap().current_page = page_id;
        self.page_changed.emit(page_id);
        true
    }

    /// Moves to the prior page in the active source, clamping at the
    /// first page.
    pub fn previous_page(self: &Arc<Self>) {
        self.step_page(-1);
    }

    /// Moves to the next page, clamping at the last.
    pub fn next_page(self: &Arc<Self>) {
        self.step_page(1);
    }

    fn step_page(self: &Arc<Self>, delta: isize) {
        let active = self.active_source();
        let ids = active.page_ids();
        if ids.is_empty() {
            return;
        }
        let current = self.state.lock().unwrap().current_page;
        let index = ids.iter().position(|&id| id == current).unwrap_or(0);
        let next_index = (index as isize + delta).clamp(0, ids.len() as isize - 1) as usize;
        let next_id = ids[next_index];
        self.state.lock().unwrap().current_page = next_id;
        self.page_changed.emit(next_id);
    }

    /// Enters Navigation mode over `sub_tab`, saving the current
    /// root-tab page so `clear_sub_tab` can return to it.
    pub fn set_sub_tab(self: &Arc<Self>, sub_tab: Arc<dyn PageSource>) {
        let first_page = sub_tab.page_ids().first().copied().unwrap_or(PageID::NULL);

        {
            let mut state = self.state.lock().unwrap();
            if state.mode == TabMode::Normal {
                state.saved_root_page = Some(state.current_page);
            }
            state.sub_tab = Some(Arc::clone(&sub_tab));
            state.mode = TabMode::Navigation;
            state.current_page = first_page;
        }

        let mut sub_receiver = self.sub_receiver.lock().unwrap();
        *sub_receiver = EventReceiver::new();
        let weak = Arc::downgrade(self);
        sub_tab
            .content_changed()
            .add_handler(&sub_receiver, move |()| {
                if let Some(view) = weak.upgrade() {
                    view.on_active_content_changed();
                }
            });

        self.page_changed.emit(first_page);
    }

    /// Leaves Navigation mode, restoring the root tab's page as it was
    /// before `set_sub_tab`.
    pub fn clear_sub_tab(self: &Arc<Self>) {
        let restored = {
            let mut state = self.state.lock().unwrap();
            if state.sub_tab.is_none() {
                return;
            }
            state.sub_tab = None;
            state.mode = TabMode::Normal;
            let restored = state
                .saved_root_page
                .take()
                .unwrap_or_else(|| self.root_tab.page_ids().first().copied().unwrap_or(PageID::NULL));
            state.current_page = restored;
            restored
        };
        *self.sub_receiver.lock().unwrap() = EventReceiver::new();
        self.page_changed.emit(restored);
    }

    /// On `evPageAppended` from the root tab: if the user was on the
    /// last page, advance; otherwise stay. Only applies while the root
    /// tab is the active source.
    fn on_root_page_appended(self: &Arc<Self>, new_page_id: PageID) {
        let mut state = self.state.lock().unwrap();
        if state.mode != TabMode::Normal {
            return;
        }
        let ids = self.root_tab.page_ids();
        // `ids` already includes the newly appended page; the user
        // was on the last page before the append iff their current
        // page is the second-to-last entry now (or the append grew a
        // previously-empty tab to one page while pointed at NULL).
        let was_on_last_before_append = if ids.len() >= 2 {
            state.current_page == ids[ids.len() - 2]
        } else {
            state.current_page == PageID::NULL
        };
        if was_on_last_before_append {
            state.current_page = new_page_id;
            drop(state);
            self.page_changed.emit(new_page_id);
        }
    }

    /// On `evContentChanged`: if current page is still present, keep
    /// it; otherwise fall back to the first page.
    fn on_active_content_changed(self: &Arc<Self>) {
        let active = self.active_source();
        let ids = active.page_ids();
        let mut state = self.state.lock().unwrap();
        if ids.contains(&state.current_page) {
            return;
        }
        let fallback = ids.first().copied().unwrap_or(PageID::NULL);
        state.current_page = fallback;
        drop(state);
        self.page_changed.emit(fallback);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagesource::FolderPageSource;
    use geometry::PixelSize;

    fn sizes(n: usize) -> Vec<PixelSize> {
        (0..n).map(|_| PixelSize::new(100, 100)).collect()
    }

    #[test]
    fn s1_navigation_clamps_at_last_page() {
        let source = FolderPageSource::new(sizes(3));
        let view = TabView::new(source);
        let ids = view.active_source().page_ids();

        assert_eq!(view.current_page_id(), ids[0]);
        view.next_page();
        view.next_page();
        assert_eq!(view.current_page_id(), ids[2]);
        view.next_page();
        assert_eq!(view.current_page_id(), ids[2]);
    }

    #[test]
    fn s2_append_behavior() {
        let source = FolderPageSource::new(sizes(2));
        let view = TabView::new(Arc::clone(&source) as Arc<dyn PageSource>);
        let first_page = view.current_page_id();

        source.append_page(PixelSize::new(10, 10));
        // was on the first page, not the last: stays put.
        assert_eq!(view.current_page_id(), first_page);

        view.next_page();
        let last_before = view.current_page_id();
        assert_ne!(last_before, first_page);

        let new_id = source.append_page(PixelSize::new(10, 10));
        // was on the (former) last page: advances to the new one.
        assert_eq!(view.current_page_id(), new_id);
    }

    #[test]
    fn content_changed_falls_back_to_first_page_when_current_is_gone() {
        use std::sync::Mutex as StdMutex;
        use event::Event;
        use geometry::PixelRect;
        use render::RenderTarget;
        use pagesource::{PageSourceError, PreferredSize};
        use shm::RenderTargetID;

        struct MockSource {
            pages: StdMutex<Vec<PageID>>,
            needs_repaint: Arc<Event<()>>,
            page_appended: Arc<Event<PageID>>,
            content_changed: Arc<Event<()>>,
        }
        impl PageSource for MockSource {
            fn page_count(&self) -> usize {
                self.pages.lock().unwrap().len()
            }
            fn page_ids(&self) -> Vec<PageID> {
                self.pages.lock().unwrap().clone()
            }
            fn preferred_size(&self, _id: PageID) -> Option<PreferredSize> {
                None
            }
            fn render_page(
                &self,
                _t: RenderTargetID,
                _rt: &RenderTarget,
                _id: PageID,
                _r: PixelRect,
            ) -> Result<(), PageSourceError> {
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

        let page_a = shm::PAGE_IDS.mint();
        let page_b = shm::PAGE_IDS.mint();
        let source = Arc::new(MockSource {
            pages: StdMutex::new(vec![page_a, page_b]),
            needs_repaint: Event::new(),
            page_appended: Event::new(),
            content_changed: Event::new(),
        });
        let view = TabView::new(Arc::clone(&source) as Arc<dyn PageSource>);

        view.set_page_id(page_b);
        assert_eq!(view.current_page_id(), page_b);

        // Drop page_b from the source's page list, then fire
        // content-changed as the source would after reloading.
        *source.pages.lock().unwrap() = vec![page_a];
        source.content_changed.emit(());

        assert_eq!(view.current_page_id(), page_a);
    }

    #[test]
    fn sub_tab_navigation_saves_and_restores_root_page() {
        let root = FolderPageSource::new(sizes(3));
        let view = TabView::new(Arc::clone(&root) as Arc<dyn PageSource>);
        view.next_page();
        let root_page = view.current_page_id();

        let sub = FolderPageSource::new(sizes(2));
        let sub_first = sub.page_ids()[0];
        view.set_sub_tab(Arc::clone(&sub) as Arc<dyn PageSource>);
        assert_eq!(view.mode(), TabMode::Navigation);
        assert_eq!(view.current_page_id(), sub_first);

        view.clear_sub_tab();
        assert_eq!(view.mode(), TabMode::Normal);
        assert_eq!(view.current_page_id(), root_page);
    }
}
