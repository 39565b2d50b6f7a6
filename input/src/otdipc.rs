//! `OTDIPCClient`: a client for the external OpenTabletDriver
//! IPC pipe. OTD publishes a JSON-lines protocol over a named pipe
//! rather than the Wintab WndProc route, so this adapter parses
//! `{DeviceInfo, State, Ping}` messages directly instead of going
//! through Wintab.
use std::time::{Duration, Instant};

use serde::Deserialize;

use pagesource::{CursorEvent, TouchState};
use task::StopToken;

use crate::error::InputError;

pub const OTD_PIPE_NAME: &str = r"\\.\pipe\otd-ipc";

/// Drivers that never report proximity (Huion-likes) are treated as
/// "no longer in proximity" if this much time passes without a new
/// `State` message.
pub const NO_PROXIMITY_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum OtdMessage {
    DeviceInfo {
        name: String,
        max_x: f32,
        max_y: f32,
    },
    State {
        x: f32,
        y: f32,
        pressure: f32,
        buttons: u32,
        #[serde(default)]
        proximity: Option<bool>,
    },
    Ping,
}

pub fn decode_message(line: &str) -> Result<OtdMessage, InputError> {
    Ok(serde_json::from_str(line)?)
}

/// Something that can hand back the next line of the IPC stream.
/// Implemented for a real named-pipe connection under `cfg(windows)`
/// and an in-process stand-in for tests.
pub trait PipeTransport: Send {
    fn read_line(&mut self) -> Option<String>;
}

#[cfg(windows)]
pub mod platform {
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
    use windows::Win32::Storage::FileSystem::{CreateFileW, ReadFile, FILE_GENERIC_READ, OPEN_EXISTING};

    use super::{PipeTransport, OTD_PIPE_NAME};
    use crate::error::InputError;

    pub struct NamedPipeTransport(HANDLE, Vec<u8>);

    impl NamedPipeTransport {
        pub fn connect() -> Result<Self, InputError> {
            let mut name: Vec<u16> = OTD_PIPE_NAME.encode_utf16().collect();
            name.push(0);
            let handle = unsafe {
                CreateFileW(
                    PCWSTR(name.as_ptr()),
                    FILE_GENERIC_READ.0,
                    windows::Win32::Storage::FileSystem::FILE_SHARE_MODE(0),
                    None,
                    OPEN_EXISTING,
                    windows::Win32::Storage::FileSystem::FILE_FLAGS_AND_ATTRIBUTES(0),
                    None,
                )
            }
            .map_err(|e| InputError::PipeUnavailable(e.to_string()))?;
            Ok(NamedPipeTransport(handle, Vec::new()))
        }
    }

    impl PipeTransport for NamedPipeTransport {
        fn read_line(&mut self) -> Option<String> {
            loop {
                if let Some(pos) = self.1.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = self.1.drain(..=pos).collect();
                    return String::from_utf8(line[..line.len() - 1].to_vec()).ok();
                }
                let mut buf = [0u8; 4096];
                let mut read = 0u32;
                let ok = unsafe { ReadFile(self.0, Some(&mut buf), Some(&mut read), None) }.is_ok();
                if !ok || read == 0 {
                    return None;
                }
                self.1.extend_from_slice(&buf[..read as usize]);
            }
        }
    }

    impl Drop for NamedPipeTransport {
        fn drop(&mut self) {
            if self.0 != INVALID_HANDLE_VALUE {
                unsafe {
                    let _ = CloseHandle(self.0);
                }
            }
        }
    }

    unsafe impl Send for NamedPipeTransport {}
}

/// A scriptable stand-in: lines queued with `push` are replayed in
/// order, then `read_line` returns `None`.
pub struct TestPipeTransport {
    lines: std::collections::VecDeque<String>,
}

impl TestPipeTransport {
    pub fn new(lines: impl IntoIterator<Item = impl Into<String>>) -> Self {
        TestPipeTransport {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl PipeTransport for TestPipeTransport {
    fn read_line(&mut self) -> Option<String> {
        self.lines.pop_front()
    }
}

/// Tracks one tablet's last-known pointer state and whether it's
/// within the no-proximity timeout, decoding `OtdMessage`s off a
/// `PipeTransport` into `CursorEvent`s.
pub struct OTDIPCClient {
    transport: Box<dyn PipeTransport>,
    last_state_at: Option<Instant>,
    reports_proximity: bool,
}

impl OTDIPCClient {
    pub fn new(transport: Box<dyn PipeTransport>) -> Self {
        OTDIPCClient {
            transport,
            last_state_at: None,
            reports_proximity: true,
        }
    }

    /// Given the time `now`, whether the timeout has elapsed since the
    /// last `State` message without the driver ever reporting
    /// proximity explicitly. Exposed separately from `run` so the
    /// timeout logic is testable without a real clock-driven loop.
    pub fn is_proximity_timed_out(&self, now: Instant) -> bool {
        if self.reports_proximity {
            return false;
        }
        match self.last_state_at {
            Some(last) => now.duration_since(last) >= NO_PROXIMITY_TIMEOUT,
            None => true,
        }
    }

    /// Decodes one transport line and, for a `State` message, returns
    /// the `CursorEvent` it represents.
    pub fn handle_line(&mut self, line: &str) -> Result<Option<CursorEvent>, InputError> {
        match decode_message(line)? {
            OtdMessage::Ping | OtdMessage::DeviceInfo { .. } => Ok(None),
            OtdMessage::State {
                x,
                y,
                pressure,
                buttons,
                proximity,
            } => {
                self.last_state_at = Some(Instant::now());
                let touch_state = match proximity {
                    Some(true) => {
                        self.reports_proximity = true;
                        TouchState::Hover
                    }
                    Some(false) => {
                        self.reports_proximity = true;
                        TouchState::Up
                    }
                    None => {
                        self.reports_proximity = false;
                        if buttons != 0 {
                            TouchState::Touch
                        } else {
                            TouchState::Hover
                        }
                    }
                };
                Ok(Some(CursorEvent {
                    touch_state,
                    x,
                    y,
                    pressure,
                    buttons,
                }))
            }
        }
    }

    pub fn run(&mut self, stop_token: &StopToken, mut on_event: impl FnMut(CursorEvent)) {
        while !stop_token.is_cancelled() {
            let Some(line) = self.transport.read_line() else { break };
            match self.handle_line(&line) {
                Ok(Some(event)) => on_event(event),
                Ok(None) => {}
                Err(e) => utils::log::error!("dropping malformed OTD IPC message: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_info_and_ping_produce_no_cursor_event() {
        let mut client = OTDIPCClient::new(Box::new(TestPipeTransport::new(Vec::<String>::new())));
        assert_eq!(
            client
                .handle_line(r#"{"type":"DeviceInfo","name":"Huion H640P","max_x":10000,"max_y":6000}"#)
                .unwrap(),
            None
        );
        assert_eq!(client.handle_line(r#"{"type":"Ping"}"#).unwrap(), None);
    }

    #[test]
    fn state_with_explicit_proximity_maps_touch_state_directly() {
        let mut client = OTDIPCClient::new(Box::new(TestPipeTransport::new(Vec::<String>::new())));
        let event = client
            .handle_line(r#"{"type":"State","x":1.0,"y":2.0,"pressure":0.5,"buttons":0,"proximity":true}"#)
            .unwrap()
            .unwrap();
        assert_eq!(event.touch_state, TouchState::Hover);
    }

    #[test]
    fn malformed_line_is_a_decode_error_not_a_panic() {
        let mut client = OTDIPCClient::new(Box::new(TestPipeTransport::new(Vec::<String>::new())));
        assert!(client.handle_line("not json").is_err());
    }

    #[test]
    fn no_proximity_driver_times_out_after_100ms_of_silence() {
        let mut client = OTDIPCClient::new(Box::new(TestPipeTransport::new(Vec::<String>::new())));
        // No State message observed yet at all: treated as timed out.
        assert!(client.is_proximity_timed_out(Instant::now()));

        client
            .handle_line(r#"{"type":"State","x":0.0,"y":0.0,"pressure":1.0,"buttons":1}"#)
            .unwrap();
        assert!(!client.is_proximity_timed_out(Instant::now()));
        assert!(client.is_proximity_timed_out(Instant::now() + NO_PROXIMITY_TIMEOUT));
    }

    #[test]
    fn run_delivers_state_events_until_the_transport_is_dry() {
        let transport = TestPipeTransport::new(vec![
            r#"{"type":"Ping"}"#,
            r#"{"type":"State","x":1.0,"y":1.0,"pressure":1.0,"buttons":1,"proximity":true}"#,
        ]);
        let mut client = OTDIPCClient::new(Box::new(transport));
        let stop = task::StopSource::new();

        let mut seen = Vec::new();
        client.run(&stop.token(), |event| seen.push(event.touch_state));
        assert_eq!(seen, vec![TouchState::Hover]);
    }
}
