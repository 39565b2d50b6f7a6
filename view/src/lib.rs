//! View / TabView layers: navigation, bookmarks,
//! header/footer chrome, and page-id lifecycle, composed into the
//! `KneeboardView` layer stack the VR engine and SHM writer render
//! through.
pub mod bookmark;
pub mod bookmarks_layer;
pub mod footer;
pub mod header;
pub mod kneeboardview;
pub mod layer;
pub mod tabcontent;
pub mod tabview;

pub use bookmark::{Bookmark, BookmarkList, TabID};
pub use bookmarks_layer::BookmarksLayer;
pub use footer::FooterLayer;
pub use header::HeaderLayer;
pub use kneeboardview::KneeboardView;
pub use layer::{IUILayer, Metrics};
pub use tabcontent::TabContentLayer;
pub use tabview::{TabMode, TabView};
