//! The SHM pipeline: a lock-free-in-spirit, versioned shared-memory
//! channel publishing rendered frames from the application process to
//! an arbitrary number of in-game injected clients.
//!
//! Single-writer only; no cross-machine transport; no dynamic
//! resizing of the region after creation; no guaranteed delivery of
//! every frame (clients consume the latest; loss under producer
//! overrun is acceptable).
pub mod client_device;
pub mod handle_os;
pub mod reader;
pub mod types;
pub mod writer;

pub use client_device::{ClientDevice, ClientDeviceError, ClientTextureId, NullClientDevice};
#[cfg(windows)]
pub use client_device::D3D11ClientDevice;
pub use handle_os::{DuplicateError, OwnedHandle};
pub use reader::{CachedReader, Snapshot};
pub use types::{
    shm_region_name, DisplayArea, KneeboardViewID, LayerID, Opacity, PageID, RenderTargetID,
    SHMHeader, SHMLayer, VRPose, VRSettings, KNEEBOARD_VIEW_IDS, LAYER_IDS, MAX_VIEW_COUNT,
    PAGE_IDS, RENDER_TARGET_IDS, SWAPCHAIN_LENGTH,
};
pub use writer::{ClientBroadcastTable, PublishTransaction, ShmError, ShmWriter};
