//! Input bindings. Each `UserAction` maps to zero or more bindings,
//! any one of which triggers it.
use std::collections::HashMap;

use apievent::UserAction;
use serde::{Deserialize, Serialize};

/// A single physical control bound to a `UserAction`. Device
/// identity is kept as a display-stable string (the name surfaced by
/// DirectInput/Wintab enumeration) rather than a runtime handle, since
/// devices are re-enumerated and may reconnect under a new handle
/// every session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub device_name: String,
    pub button: BindingButton,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingButton {
    Gamepad(u32),
    Keyboard(u32),
    TabletExpressKey(u32),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputSettings {
    #[serde(default)]
    pub bindings: HashMap<UserAction, Vec<Binding>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl InputSettings {
    /// All bindings registered for `action`, or an empty slice if none.
    pub fn bindings_for(&self, action: UserAction) -> &[Binding] {
        self.bindings.get(&action).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn bind(&mut self, action: UserAction, binding: Binding) {
        self.bindings.entry(action).or_default().push(binding);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unbound_action_has_no_bindings() {
        let settings = InputSettings::default();
        assert!(settings.bindings_for(UserAction::NextTab).is_empty());
    }

    #[test]
    fn bind_then_roundtrip_through_json() {
        let mut settings = InputSettings::default();
        settings.bind(
            UserAction::NextTab,
            Binding {
                device_name: "Throttle".into(),
                button: BindingButton::Gamepad(3),
            },
        );
        let value = serde_json::to_value(&settings).unwrap();
        let restored: InputSettings = serde_json::from_value(value).unwrap();
        assert_eq!(restored.bindings_for(UserAction::NextTab).len(), 1);
    }
}
