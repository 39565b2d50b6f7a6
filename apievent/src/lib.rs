//! The APIEvent transport: external tools talk to the running
//! application over a length-prefixed packet protocol delivered
//! through a named mailslot, dispatched in strict enqueue order.
pub mod builtin;
pub mod mailslot;
pub mod protocol;
pub mod queue;
pub mod useraction;

pub use builtin::{
    decode_builtin, decode_multi_event, encode_multi_remote_action, BrightnessMode, BuiltinDecodeError,
    BuiltinEvent, PluginTabCustomAction, SetBrightness, SetTabByID, SetTabByIndex, SetTabByName,
};
pub use mailslot::{run_receive_loop, send, PlatformMailslot, MAILSLOT_NAME};
pub use protocol::{APIEvent, ApiEventError, EVT_MULTI_EVENT, MAX_PACKET_BYTES};
pub use queue::{EnqueueError, EventQueue};
pub use useraction::UserAction;
