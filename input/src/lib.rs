//! Input adapters: DirectInput/XInput gamepads
//! and the keyboard, a Wintab-backed tablet, and an OpenTabletDriver
//! IPC client, all funneling into the shared `UserInputDevice`
//! binding-match model.
pub mod device;
pub mod directinput;
pub mod error;
pub mod otdipc;
pub mod tablet;

pub use device::UserInputDevice;
pub use directinput::{DirectInputAdapter, RawInputSource, TestInputSource};
pub use error::InputError;
pub use otdipc::{OTDIPCClient, OtdMessage, PipeTransport, OTD_PIPE_NAME};
pub use tablet::{PenSource, RawPenPacket, TabletInputAdapter};

#[cfg(windows)]
pub use directinput::platform::{KeyboardSource, XInputGamepadSource};
#[cfg(windows)]
pub use tablet::load_wintab;
