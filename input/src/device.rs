//! `UserInputDevice`: the base every concrete adapter
//! (`DirectInputAdapter`'s per-device listeners, the tablet express
//! keys) builds on. It owns one device's current button-chord state
//! and the bindings loaded for it, and decides when a chord exactly
//! matches a binding closely enough to fire the bound `UserAction`.
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use apievent::UserAction;
use event::{Event, EventReceiver};
use settings::{Binding, InputSettings};

/// One device's current bindings and held-button state.
pub struct UserInputDevice {
    device_id: String,
    bindings: Mutex<HashMap<UserAction, BTreeSet<u32>>>,
    active_buttons: Mutex<BTreeSet<u32>>,
    /// The action that fired for the chord currently held down, if
    /// any. Cleared once every button in the chord has been released,
    /// so re-pressing the same chord fires again.
    fired_for_chord: Mutex<Option<UserAction>>,
    pub action_fired: Arc<Event<UserAction>>,
    _receiver: EventReceiver,
}

impl UserInputDevice {
    pub fn new(device_id: impl Into<String>) -> Arc<Self> {
        Arc::new(UserInputDevice {
            device_id: device_id.into(),
            bindings: Mutex::new(HashMap::new()),
            active_buttons: Mutex::new(BTreeSet::new()),
            fired_for_chord: Mutex::new(None),
            action_fired: Event::new(),
            _receiver: EventReceiver::new(),
        })
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Binds `action` to the exact set of simultaneously-held
    /// `buttons`. Re-binding the same action replaces its previous
    /// chord.
    pub fn bind(&self, action: UserAction, buttons: impl IntoIterator<Item = u32>) {
        self.bindings
            .lock()
            .unwrap()
            .insert(action, buttons.into_iter().collect());
    }

    pub fn clear_bindings(&self) {
        self.bindings.lock().unwrap().clear();
    }

    /// Loads every `Binding` in `settings` whose `device_name` matches
    /// this device, translating each `BindingButton` to a chord
    /// member via `to_code`. Adapters pass in the projection that
    /// knows how to turn their own `BindingButton` variant (`Gamepad`,
    /// `Keyboard`, `TabletExpressKey`) into a button code; bindings
    /// for a different variant are ignored, so the same
    /// `InputSettings` can be handed to every adapter in turn.
    pub fn load_bindings(&self, settings: &InputSettings, to_code: impl Fn(&Binding) -> Option<u32>) {
        self.clear_bindings();
        for action in UserAction::ALL {
            let chord: BTreeSet<u32> = settings
                .bindings_for(*action)
                .iter()
                .filter(|b| b.device_name == self.device_id)
                .filter_map(&to_code)
                .collect();
            if !chord.is_empty() {
                self.bindings.lock().unwrap().insert(*action, chord);
            }
        }
    }

    pub fn active_buttons(&self) -> BTreeSet<u32> {
        self.active_buttons.lock().unwrap().clone()
    }

    /// A button went down. If the resulting chord exactly matches a
    /// binding and isn't the one already firing for this chord, emits
    /// the bound action. A chord that grows to match a second,
    /// superset binding supersedes (cancels) whatever fired for the
    /// smaller chord - `fired_for_chord` is simply overwritten, so the
    /// smaller binding's action won't fire again until every button in
    /// the chord is released and re-pressed from scratch.
    pub fn on_button_down(&self, button: u32) {
        let chord = {
            let mut active = self.active_buttons.lock().unwrap();
            active.insert(button);
            active.clone()
        };
        let matched = self
            .bindings
            .lock()
            .unwrap()
            .iter()
            .find(|(_, required)| **required == chord)
            .map(|(action, _)| *action);
        let Some(action) = matched else { return };
        let mut fired = self.fired_for_chord.lock().unwrap();
        if *fired == Some(action) {
            return;
        }
        *fired = Some(action);
        drop(fired);
        self.action_fired.emit(action);
    }

    /// A button went up. Once the chord is fully released, forgets
    /// which action last fired for it.
    pub fn on_button_up(&self, button: u32) {
        let mut active = self.active_buttons.lock().unwrap();
        active.remove(&button);
        if active.is_empty() {
            *self.fired_for_chord.lock().unwrap() = None;
        }
    }

    /// Reconciles a full snapshot of currently-pressed buttons against
    /// the device's previous state, firing the same down/up
    /// transitions `on_button_down`/`on_button_up` would have seen.
    /// Used by poll-based adapters (gamepad, tablet express keys) that
    /// only ever observe the current state rather than edge events.
    pub fn reconcile(&self, pressed: &BTreeSet<u32>) {
        let previous = self.active_buttons();
        for &button in pressed.difference(&previous) {
            self.on_button_down(button);
        }
        for &button in previous.difference(pressed) {
            self.on_button_up(button);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn captured(device: &Arc<UserInputDevice>) -> Arc<Mutex<Vec<UserAction>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        device
            .action_fired
            .add_handler(&device._receiver, move |action| captured.lock().unwrap().push(action));
        seen
    }

    #[test]
    fn exact_match_fires_once_per_press() {
        let device = UserInputDevice::new("stick-1");
        device.bind(UserAction::NextPage, [3]);
        let seen = captured(&device);

        device.on_button_down(3);
        device.on_button_down(3);
        assert_eq!(*seen.lock().unwrap(), vec![UserAction::NextPage]);
    }

    #[test]
    fn release_and_repress_fires_again() {
        let device = UserInputDevice::new("stick-1");
        device.bind(UserAction::NextPage, [3]);
        let seen = captured(&device);

        device.on_button_down(3);
        device.on_button_up(3);
        device.on_button_down(3);
        assert_eq!(*seen.lock().unwrap(), vec![UserAction::NextPage, UserAction::NextPage]);
    }

    #[test]
    fn superset_chord_supersedes_the_smaller_bindings_action() {
        let device = UserInputDevice::new("stick-1");
        device.bind(UserAction::NextPage, [3]);
        device.bind(UserAction::PreviousPage, [3, 4]);
        let seen = captured(&device);

        device.on_button_down(3);
        device.on_button_down(4);
        // Both bindings matched in turn, but nothing else is pressed
        // or released in between.
        assert_eq!(
            *seen.lock().unwrap(),
            vec![UserAction::NextPage, UserAction::PreviousPage]
        );

        // Releasing back down to the smaller chord must not re-fire
        // NextPage a second time until the whole chord is released.
        device.on_button_up(4);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn reconcile_emits_the_same_transitions_as_explicit_up_down() {
        let device = UserInputDevice::new("pad-1");
        device.bind(UserAction::ToggleVisibility, [7]);
        let seen = captured(&device);

        let mut pressed = BTreeSet::new();
        pressed.insert(7);
        device.reconcile(&pressed);
        assert_eq!(*seen.lock().unwrap(), vec![UserAction::ToggleVisibility]);

        pressed.clear();
        device.reconcile(&pressed);
        pressed.insert(7);
        device.reconcile(&pressed);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![UserAction::ToggleVisibility, UserAction::ToggleVisibility]
        );
    }

    #[test]
    fn load_bindings_filters_by_device_name_and_projection() {
        let device = UserInputDevice::new("Throttle");
        let mut settings = InputSettings::default();
        settings.bind(
            UserAction::NextTab,
            Binding {
                device_name: "Throttle".into(),
                button: settings::BindingButton::Gamepad(5),
            },
        );
        settings.bind(
            UserAction::PreviousTab,
            Binding {
                device_name: "Other Device".into(),
                button: settings::BindingButton::Gamepad(1),
            },
        );

        device.load_bindings(&settings, |b| match b.button {
            settings::BindingButton::Gamepad(code) => Some(code),
            _ => None,
        });

        let seen = captured(&device);
        device.on_button_down(5);
        assert_eq!(*seen.lock().unwrap(), vec![UserAction::NextTab]);

        device.on_button_up(5);
        device.on_button_down(1);
        assert!(seen.lock().unwrap().len() == 1);
    }
}
