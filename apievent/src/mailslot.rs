//! The inbound named-mailslot transport: external tools
//! (CLI remotes, DCS exporters, plugins) write length-prefixed
//! `APIEvent` packets to a well-known mailslot; this module owns the
//! receive loop that turns those packets into `EventQueue` entries.
use std::sync::Arc;

use task::StopToken;
use utils::log;

use crate::protocol::{APIEvent, ApiEventError, MAX_PACKET_BYTES};
use crate::queue::EventQueue;

pub const MAILSLOT_NAME: &str = r"\\.\mailslot\com.openkneeboard.events.v1";

#[cfg(windows)]
mod platform {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
    use windows::Win32::Storage::FileSystem::ReadFile;
    use windows::Win32::System::Mailslots::CreateMailslotW;

    use super::MAILSLOT_NAME;
    use crate::protocol::MAX_PACKET_BYTES;

    /// The real OS mailslot. `ReadFile` blocks until a writer deposits
    /// a message or the handle is closed from another thread.
    pub struct PlatformMailslot(HANDLE);

    impl PlatformMailslot {
        pub fn create() -> windows::core::Result<Self> {
            let mut name: Vec<u16> = MAILSLOT_NAME.encode_utf16().collect();
            name.push(0);
            let handle = unsafe {
                CreateMailslotW(PCWSTR(name.as_ptr()), MAX_PACKET_BYTES as u32, 0, None)?
            };
            Ok(PlatformMailslot(handle))
        }

        pub fn recv(&self) -> windows::core::Result<Vec<u8>> {
            let mut buf = vec![0u8; MAX_PACKET_BYTES];
            let mut read = 0u32;
            unsafe {
                ReadFile(self.0, Some(buf.as_mut_slice()), Some(&mut read), None)?;
            }
            buf.truncate(read as usize);
            Ok(buf)
        }
    }

    impl Drop for PlatformMailslot {
        fn drop(&mut self) {
            if self.0 != INVALID_HANDLE_VALUE {
                unsafe {
                    let _ = CloseHandle(self.0);
                }
            }
        }
    }

    unsafe impl Send for PlatformMailslot {}

    /// Opens the server's already-created mailslot for writing and
    /// deposits one packet. Unlike the
    /// server side, a remote never creates the mailslot - if it
    /// doesn't exist yet, `CreateFileW` fails and the remote should
    /// report that the application isn't running.
    pub fn send(packet: &[u8]) -> windows::core::Result<()> {
        use windows::Win32::Storage::FileSystem::{
            CreateFileW, WriteFile, FILE_FLAGS_AND_ATTRIBUTES, FILE_GENERIC_WRITE, FILE_SHARE_MODE,
            OPEN_EXISTING,
        };

        let mut name: Vec<u16> = MAILSLOT_NAME.encode_utf16().collect();
        name.push(0);
        unsafe {
            let handle = CreateFileW(
                PCWSTR(name.as_ptr()),
                FILE_GENERIC_WRITE.0,
                FILE_SHARE_MODE(0),
                None,
                OPEN_EXISTING,
                FILE_FLAGS_AND_ATTRIBUTES(0),
                None,
            )?;
            let result = WriteFile(handle, Some(packet), None, None);
            let _ = CloseHandle(handle);
            result
        }
    }
}

/// Off Windows there is no mailslot to connect to; a remote always
/// fails with "not supported", which is the honest answer rather than
/// a silent no-op success.
#[cfg(not(windows))]
pub fn send(_packet: &[u8]) -> Result<(), std::io::Error> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "APIEvent mailslot transport is only available on Windows",
    ))
}

#[cfg(windows)]
pub use platform::send;

/// Portable stand-in used off Windows (and in unit tests): an
/// in-process channel plays the role of the mailslot so the receive
/// loop and dispatch logic below are exercised without a real kernel
/// object.
#[cfg(not(windows))]
mod platform {
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::sync::Mutex;

    pub struct PlatformMailslot(Mutex<Receiver<Vec<u8>>>);

    pub struct TestSender(Sender<Vec<u8>>);

    impl TestSender {
        pub fn send(&self, packet: &str) {
            let _ = self.0.send(packet.as_bytes().to_vec());
        }
    }

    impl PlatformMailslot {
        pub fn create_for_test() -> (Self, TestSender) {
            let (tx, rx) = mpsc::channel();
            (PlatformMailslot(Mutex::new(rx)), TestSender(tx))
        }

        pub fn recv(&self) -> Result<Vec<u8>, mpsc::RecvError> {
            self.0.lock().unwrap().recv()
        }
    }
}

pub use platform::PlatformMailslot;
#[cfg(not(windows))]
pub use platform::TestSender;

/// Runs the mailslot receive loop on the calling thread until
/// `stop_token` is cancelled, pushing each successfully-parsed packet
/// into `queue`. Malformed packets are logged and dropped; the loop
/// never panics on attacker- or bug-controlled input.
pub fn run_receive_loop(mailslot: &PlatformMailslot, queue: &Arc<EventQueue>, stop_token: &StopToken) {
    while !stop_token.is_cancelled() {
        let bytes = match mailslot.recv() {
            Ok(bytes) => bytes,
            Err(_) => break,
        };
        let Ok(packet) = std::str::from_utf8(&bytes) else {
            log::error!("received non-UTF8 mailslot packet");
            continue;
        };
        match APIEvent::deserialize(packet) {
            Ok(event) => {
                if let Err(e) = queue.enqueue(event) {
                    log::error!("rejecting malformed packet: {e}");
                }
            }
            Err(e) => log_decode_error(e),
        }
    }
}

fn log_decode_error(e: ApiEventError) {
    log::error!("dropping malformed packet: {e}");
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use task::StopSource;

    #[test]
    fn receive_loop_enqueues_well_formed_packets_and_stops_cleanly() {
        let (mailslot, sender) = PlatformMailslot::create_for_test();
        let queue = Arc::new(EventQueue::new());
        let stop = StopSource::new();

        let event = APIEvent::new("NextPage", "");
        sender.send(&event.serialize());
        drop(sender);

        run_receive_loop(&mailslot, &queue, &stop.token());

        assert_eq!(queue.pop_front(), Some(event));
    }

    #[test]
    fn receive_loop_drops_malformed_packets_without_panicking() {
        let (mailslot, sender) = PlatformMailslot::create_for_test();
        let queue = Arc::new(EventQueue::new());
        let stop = StopSource::new();

        sender.send("not a valid packet");
        sender.send(&APIEvent::new("NextTab", "").serialize());
        drop(sender);

        run_receive_loop(&mailslot, &queue, &stop.token());

        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pop_front().unwrap().name, "NextTab");
    }
}
