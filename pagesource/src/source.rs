//! `IPageSource` and its optional capability mixins.
//!
//! The original engine queries capabilities via `std::dynamic_pointer_
//! cast` against a handful of marker interfaces. Rust trait objects
//! can't be downcast to a sibling trait without `Any`, so instead each
//! capability is exposed through an `as_*` default method on
//! `PageSource` itself that a concrete source overrides to return
//! `Some(self)` - the same "ask the object what it supports" shape,
//! without reaching for `Any`.
use std::sync::Arc;

use event::Event;
use geometry::PixelRect;
use render::RenderTarget;
use shm::{PageID, RenderTargetID};

use crate::error::PageSourceError;
use crate::types::{CursorEvent, NavigationEntry, PreferredSize};

/// The base page-source interface.
pub trait PageSource: Send + Sync {
    fn page_count(&self) -> usize;
    fn page_ids(&self) -> Vec<PageID>;
    fn preferred_size(&self, id: PageID) -> Option<PreferredSize>;

    /// Renders `id`'s content into `rect` of `target`, which is
    /// logically identified as `target_id` for caching purposes - the
    /// original's `RenderPage(context, id, rect)` folds this identity
    /// into its opaque `context` parameter; we keep it explicit.
    /// Synchronous: unlike the original's coroutine-based `task<void>`,
    /// GPU command submission here is already asynchronous at the
    /// driver queue level, so there is nothing for a Rust caller to
    /// suspend on - see DESIGN.md.
    fn render_page(
        &self,
        target_id: RenderTargetID,
        target: &RenderTarget,
        id: PageID,
        rect: PixelRect,
    ) -> Result<(), PageSourceError>;

    fn needs_repaint(&self) -> &Arc<Event<()>>;
    fn page_appended(&self) -> &Arc<Event<PageID>>;
    fn content_changed(&self) -> &Arc<Event<()>>;

    fn as_cursor_events(&self) -> Option<&dyn PageSourceWithCursorEvents> {
        None
    }
    fn as_navigation(&self) -> Option<&dyn PageSourceWithNavigation> {
        None
    }
    fn as_developer_tools(&self) -> Option<&dyn PageSourceWithDeveloperTools> {
        None
    }

    /// Opt-out from `PageSourceWithDelegates`'s external `CachedLayer`
    ///: a source overrides this to `true` when it already
    /// caches its own renders internally.
    fn has_internal_caching(&self) -> bool {
        false
    }
}

pub trait PageSourceWithCursorEvents: PageSource {
    fn post_cursor_event(&self, id: PageID, event: CursorEvent);
    fn clear_user_input(&self, id: PageID);
    fn can_clear_user_input(&self, id: PageID) -> bool;
}

pub trait PageSourceWithNavigation: PageSource {
    fn navigation_entries(&self) -> Vec<NavigationEntry>;
    fn is_navigation_available(&self) -> bool;
}

pub trait PageSourceWithDeveloperTools: PageSource {
    fn has_developer_tools(&self) -> bool;
    fn open_developer_tools_window(&self);
}
