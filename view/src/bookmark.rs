//! `Bookmark`: a saved `(tab, page)` pair, optionally titled,
//! stored both on the view (the global bookmark bar order) and on the
//! owning root tab (so re-opening that tab elsewhere still has its
//! own bookmarks).
use serde::{Deserialize, Serialize};

use shm::PageID;

/// An opaque tab identity a `Bookmark` refers back to. Root tabs don't
/// have a dedicated handle type of their own (they're addressed by
/// name/index in the APIEvent builtins instead), so bookmarks key on
/// the same `Handle<Tag>` family via this crate-local tag, minted once
/// per root tab the orchestrator registers.
pub use shm::RenderTargetID as TabID;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub tab_id: TabID,
    pub page_id: PageID,
    pub title: Option<String>,
}

impl Bookmark {
    pub fn new(tab_id: TabID, page_id: PageID) -> Self {
        Bookmark {
            tab_id,
            page_id,
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// An ordered list of bookmarks with the add/remove/toggle/cycle
/// operations `UserAction::{Previous,Next,Toggle}Bookmark` need.
#[derive(Debug, Default)]
pub struct BookmarkList {
    entries: Vec<Bookmark>,
}

impl BookmarkList {
    pub fn new() -> Self {
        BookmarkList::default()
    }

    pub fn entries(&self) -> &[Bookmark] {
        &self.entries
    }

    pub fn contains(&self, tab_id: TabID, page_id: PageID) -> bool {
        self.entries
            .iter()
            .any(|b| b.tab_id == tab_id && b.page_id == page_id)
    }

    /// Adds a bookmark for `(tab_id, page_id)` unless one already
    /// exists. Returns `true` if a new entry was added.
    pub fn add(&mut self, bookmark: Bookmark) -> bool {
        if self.contains(bookmark.tab_id, bookmark.page_id) {
            return false;
        }
        self.entries.push(bookmark);
        true
    }

    /// Removes the bookmark for `(tab_id, page_id)` if present.
    /// Returns `true` if an entry was removed.
    pub fn remove(&mut self, tab_id: TabID, page_id: PageID) -> bool {
        let before = self.entries.len();
        self.entries.retain(|b| !(b.tab_id == tab_id && b.page_id == page_id));
        self.entries.len() != before
    }

    /// `UserAction::ToggleBookmark`: adds if absent, removes if
    /// present.
    pub fn toggle(&mut self, bookmark: Bookmark) -> bool {
        if self.remove(bookmark.tab_id, bookmark.page_id) {
            false
        } else {
            self.add(bookmark);
            true
        }
    }

    /// The bookmark immediately before `(tab_id, page_id)` in bar
    /// order, wrapping to the end. `None` if the list is empty.
    pub fn previous(&self, tab_id: TabID, page_id: PageID) -> Option<&Bookmark> {
        self.step(tab_id, page_id, -1)
    }

    /// The bookmark immediately after `(tab_id, page_id)`, wrapping to
    /// the start.
    pub fn next(&self, tab_id: TabID, page_id: PageID) -> Option<&Bookmark> {
        self.step(tab_id, page_id, 1)
    }

    fn step(&self, tab_id: TabID, page_id: PageID, delta: isize) -> Option<&Bookmark> {
        if self.entries.is_empty() {
            return None;
        }
        let current = self
            .entries
            .iter()
            .position(|b| b.tab_id == tab_id && b.page_id == page_id);
        let len = self.entries.len() as isize;
        let next_index = match current {
            Some(i) => (i as isize + delta).rem_euclid(len),
            // Not currently on a bookmark: Next starts at the first
            // entry, Previous at the last.
            None => if delta >= 0 { 0 } else { len - 1 },
        };
        self.entries.get(next_index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utils::handle::Handle;

    fn tab(n: u64) -> TabID {
        Handle::from_raw(n)
    }
    fn page(n: u64) -> PageID {
        Handle::from_raw(n)
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut list = BookmarkList::new();
        let b = Bookmark::new(tab(1), page(1));
        assert!(list.toggle(b.clone()));
        assert!(list.contains(tab(1), page(1)));
        assert!(!list.toggle(b));
        assert!(!list.contains(tab(1), page(1)));
    }

    #[test]
    fn next_and_previous_wrap_around() {
        let mut list = BookmarkList::new();
        list.add(Bookmark::new(tab(1), page(1)));
        list.add(Bookmark::new(tab(1), page(2)));
        list.add(Bookmark::new(tab(1), page(3)));

        let n = list.next(tab(1), page(3)).unwrap();
        assert_eq!(n.page_id, page(1));

        let p = list.previous(tab(1), page(1)).unwrap();
        assert_eq!(p.page_id, page(3));
    }
}
