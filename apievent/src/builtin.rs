//! Builtin event payload shapes recognised by the orchestrator.
use serde::{Deserialize, Serialize};

use crate::protocol::{APIEvent, EVT_MULTI_EVENT};
use crate::useraction::UserAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTabByID {
    pub id: u64,
    #[serde(default, rename = "pageNumber")]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub kneeboard: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTabByName {
    pub name: String,
    #[serde(default, rename = "pageNumber")]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub kneeboard: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTabByIndex {
    pub index: u32,
    #[serde(default, rename = "pageNumber")]
    pub page_number: Option<u32>,
    #[serde(default)]
    pub kneeboard: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum BrightnessMode {
    Absolute,
    Relative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetBrightness {
    pub brightness: f32,
    pub mode: BrightnessMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PluginTabCustomAction {
    #[serde(rename = "actionID")]
    pub action_id: String,
    #[serde(default, rename = "extraData")]
    pub extra_data: Option<String>,
}

/// A decoded builtin event, or a pass-through for names the
/// orchestrator doesn't specifically recognise (plugin-defined
/// events, future additions) - unrecognised names are still emitted
/// as-is on the event bus rather than rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum BuiltinEvent {
    SetTabByID(SetTabByID),
    SetTabByName(SetTabByName),
    SetTabByIndex(SetTabByIndex),
    SetProfileByGUID(String),
    SetProfileByName(String),
    SetBrightness(SetBrightness),
    RemoteUserAction(UserAction),
    PluginTabCustomAction(PluginTabCustomAction),
    Other(APIEvent),
}

#[derive(Debug, thiserror::Error)]
pub enum BuiltinDecodeError {
    #[error("malformed JSON payload for '{name}': {source}")]
    Json {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("unrecognised RemoteUserAction '{0}'")]
    UnknownUserAction(String),
}

/// Decodes a single (non-`MultiEvent`) `APIEvent` into its builtin
/// shape.
pub fn decode_builtin(event: &APIEvent) -> Result<BuiltinEvent, BuiltinDecodeError> {
    let json_err = |source| BuiltinDecodeError::Json {
        name: event.name.clone(),
        source,
    };
    match event.name.as_str() {
        "SetTabByID" => Ok(BuiltinEvent::SetTabByID(
            serde_json::from_str(&event.value).map_err(json_err)?,
        )),
        "SetTabByName" => Ok(BuiltinEvent::SetTabByName(
            serde_json::from_str(&event.value).map_err(json_err)?,
        )),
        "SetTabByIndex" => Ok(BuiltinEvent::SetTabByIndex(
            serde_json::from_str(&event.value).map_err(json_err)?,
        )),
        "SetProfileByGUID" => Ok(BuiltinEvent::SetProfileByGUID(event.value.clone())),
        "SetProfileByName" => Ok(BuiltinEvent::SetProfileByName(event.value.clone())),
        "SetBrightness" => Ok(BuiltinEvent::SetBrightness(
            serde_json::from_str(&event.value).map_err(json_err)?,
        )),
        "RemoteUserAction" => UserAction::from_name(event.value.trim())
            .map(BuiltinEvent::RemoteUserAction)
            .ok_or_else(|| BuiltinDecodeError::UnknownUserAction(event.value.clone())),
        "PluginTabCustomAction" => Ok(BuiltinEvent::PluginTabCustomAction(
            serde_json::from_str(&event.value).map_err(json_err)?,
        )),
        _ => Ok(BuiltinEvent::Other(event.clone())),
    }
}

/// Decodes a `MultiEvent` payload - a JSON array of `[name, value]`
/// pairs - into the individual `APIEvent`s it represents.
pub fn decode_multi_event(payload: &str) -> Result<Vec<APIEvent>, BuiltinDecodeError> {
    let pairs: Vec<(String, String)> =
        serde_json::from_str(payload).map_err(|source| BuiltinDecodeError::Json {
            name: EVT_MULTI_EVENT.to_string(),
            source,
        })?;
    Ok(pairs
        .into_iter()
        .map(|(name, value)| APIEvent::new(name, value))
        .collect())
}

/// Encodes a `MultiEvent` `APIEvent` containing `count` copies of
/// `RemoteUserAction(action)`.
pub fn encode_multi_remote_action(action: UserAction, count: u32) -> APIEvent {
    let pairs: Vec<(&str, &str)> = (0..count).map(|_| ("RemoteUserAction", action.name())).collect();
    let payload = serde_json::to_string(&pairs).expect("tuple vec always serializes");
    APIEvent::new(EVT_MULTI_EVENT, payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_set_tab_by_id() {
        let event = APIEvent::new("SetTabByID", r#"{"id":7,"pageNumber":2}"#);
        let decoded = decode_builtin(&event).unwrap();
        assert_eq!(
            decoded,
            BuiltinEvent::SetTabByID(SetTabByID {
                id: 7,
                page_number: Some(2),
                kneeboard: None,
            })
        );
    }

    #[test]
    fn decodes_remote_user_action() {
        let event = APIEvent::new("RemoteUserAction", "NextPage");
        assert_eq!(
            decode_builtin(&event).unwrap(),
            BuiltinEvent::RemoteUserAction(UserAction::NextPage)
        );
    }

    #[test]
    fn unknown_user_action_is_an_error_not_a_panic() {
        let event = APIEvent::new("RemoteUserAction", "Nonexistent");
        assert!(matches!(
            decode_builtin(&event),
            Err(BuiltinDecodeError::UnknownUserAction(_))
        ));
    }

    #[test]
    fn unrecognised_event_name_passes_through() {
        let event = APIEvent::new("SomePluginEvent", "whatever");
        assert_eq!(
            decode_builtin(&event).unwrap(),
            BuiltinEvent::Other(event)
        );
    }

    #[test]
    fn multi_event_decodes_in_order() {
        // A MultiEvent payload decodes to its constituent events, in order.
        let payload = r#"[["RemoteUserAction","NextPage"],["RemoteUserAction","NextPage"]]"#;
        let events = decode_multi_event(payload).unwrap();
        assert_eq!(events.len(), 2);
        for e in &events {
            assert_eq!(e.name, "RemoteUserAction");
            assert_eq!(e.value, "NextPage");
        }
    }

    #[test]
    fn encode_multi_remote_action_round_trips() {
        let event = encode_multi_remote_action(UserAction::NextTab, 3);
        assert_eq!(event.name, EVT_MULTI_EVENT);
        let decoded = decode_multi_event(&event.value).unwrap();
        assert_eq!(decoded.len(), 3);
        assert!(decoded.iter().all(|e| e.value == "NextTab"));
    }
}
