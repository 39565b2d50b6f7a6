//! The orchestrator's tab list: a named, ordered sequence of
//! root tabs, addressable by id, name, or index the way `SetTabByID`/
//! `SetTabByName`/`SetTabByIndex` APIEvents require.
use std::sync::Arc;

use view::{TabID, TabView};

use crate::error::StateError;

pub struct TabEntry {
    pub id: TabID,
    pub name: String,
    pub view: Arc<TabView>,
}

/// Mints a fresh, never-reused `TabID` for a newly registered root
/// tab. Root tabs have no dedicated handle type of their own (they're
/// addressed by name/index in the APIEvent builtins), so this reuses
/// the `RenderTargetID` allocator the same way `view::bookmark::TabID`
/// reuses the type.
fn mint_tab_id() -> TabID {
    shm::RENDER_TARGET_IDS.mint()
}

#[derive(Default)]
pub struct TabList {
    entries: Vec<TabEntry>,
}

impl TabList {
    pub fn new() -> Self {
        TabList::default()
    }

    /// Registers a new root tab under `name`, minting a fresh `TabID`
    /// for it.
    pub fn add(&mut self, name: impl Into<String>, view: Arc<TabView>) -> TabID {
        let id = mint_tab_id();
        self.entries.push(TabEntry {
            id,
            name: name.into(),
            view,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TabEntry] {
        &self.entries
    }

    pub fn index_of(&self, id: TabID) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn by_id(&self, id: TabID) -> Result<&TabEntry, StateError> {
        self.entries
            .iter()
            .find(|e| e.id == id)
            .ok_or(StateError::UnknownTabId(id))
    }

    pub fn by_name(&self, name: &str) -> Result<&TabEntry, StateError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| StateError::UnknownTabName(name.to_string()))
    }

    pub fn by_index(&self, index: u32) -> Result<&TabEntry, StateError> {
        self.entries
            .get(index as usize)
            .ok_or(StateError::UnknownTabIndex(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geometry::PixelSize;
    use pagesource::FolderPageSource;

    fn sample_view() -> Arc<TabView> {
        TabView::new(FolderPageSource::new(vec![PixelSize::new(800, 600)]))
    }

    #[test]
    fn lookup_by_id_name_and_index_agree() {
        let mut tabs = TabList::new();
        let id = tabs.add("Checklist", sample_view());
        tabs.add("Charts", sample_view());

        assert_eq!(tabs.by_id(id).unwrap().name, "Checklist");
        assert_eq!(tabs.by_name("Charts").unwrap().name, "Charts");
        assert_eq!(tabs.by_index(1).unwrap().name, "Charts");
        assert_eq!(tabs.index_of(id), Some(0));
    }

    #[test]
    fn unknown_lookups_are_errors_not_panics() {
        let tabs = TabList::new();
        assert!(matches!(tabs.by_name("Nope"), Err(StateError::UnknownTabName(_))));
        assert!(matches!(tabs.by_index(0), Err(StateError::UnknownTabIndex(0))));
    }
}
