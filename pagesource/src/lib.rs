//! PageSource model: the tree of page sources a
//! `TabView` renders through, with doodle/cursor/cache delegation.
pub mod delegates;
pub mod doodle;
pub mod error;
pub mod folder;
pub mod source;
pub mod types;

pub use delegates::PageSourceWithDelegates;
pub use doodle::DoodleRenderer;
pub use error::PageSourceError;
pub use folder::FolderPageSource;
pub use source::{
    PageSource, PageSourceWithCursorEvents, PageSourceWithDeveloperTools, PageSourceWithNavigation,
};
pub use types::{
    CursorEvent, NavigationEntry, PhysicalSize, PhysicalSizeDirection, PreferredSize, ScalingKind,
    TouchState, TIP_BUTTON_BIT,
};
