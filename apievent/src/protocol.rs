//! The `APIEvent` wire format:
//! `"{:08x}!{name}!{:08x}!{value}!"`, where the two hex fields are the
//! byte lengths of `name` and `value`. A packet not ending with `!`
//! is rejected.
use std::fmt;

pub const MAX_PACKET_BYTES: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct APIEvent {
    pub name: String,
    pub value: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ApiEventError {
    #[error("packet does not end with '!'")]
    MissingTerminator,
    #[error("packet too large: {0} bytes exceeds {MAX_PACKET_BYTES}")]
    TooLarge(usize),
    #[error("malformed length-prefixed field")]
    MalformedField,
    #[error("declared length does not match actual field length")]
    LengthMismatch,
}

impl APIEvent {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        APIEvent {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Round-trips through `Unserialize`: `Unserialize(e.Serialize()) == e`.
    pub fn serialize(&self) -> String {
        format!(
            "{:08x}!{}!{:08x}!{}!",
            self.name.len(),
            self.name,
            self.value.len(),
            self.value
        )
    }

    /// Never panics on a malformed packet: returns
    /// `Err` instead.
    pub fn deserialize(packet: &str) -> Result<APIEvent, ApiEventError> {
        if packet.len() > MAX_PACKET_BYTES {
            return Err(ApiEventError::TooLarge(packet.len()));
        }
        if !packet.ends_with('!') {
            return Err(ApiEventError::MissingTerminator);
        }

        let (name_len_str, rest) = packet.split_once('!').ok_or(ApiEventError::MalformedField)?;
        let name_len =
            usize::from_str_radix(name_len_str, 16).map_err(|_| ApiEventError::MalformedField)?;
        if rest.len() < name_len {
            return Err(ApiEventError::LengthMismatch);
        }
        let (name, rest) = rest.split_at(name_len);
        let rest = rest
            .strip_prefix('!')
            .ok_or(ApiEventError::MalformedField)?;

        let (value_len_str, rest) = rest.split_once('!').ok_or(ApiEventError::MalformedField)?;
        let value_len =
            usize::from_str_radix(value_len_str, 16).map_err(|_| ApiEventError::MalformedField)?;
        if rest.len() < value_len + 1 {
            return Err(ApiEventError::LengthMismatch);
        }
        let (value, terminator) = rest.split_at(value_len);
        if terminator != "!" {
            return Err(ApiEventError::LengthMismatch);
        }

        Ok(APIEvent {
            name: name.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for APIEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "APIEvent({}={})", self.name, self.value)
    }
}

pub const EVT_MULTI_EVENT: &str = "MultiEvent";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_well_formed_events() {
        let cases = [
            APIEvent::new("NextPage", ""),
            APIEvent::new("SetBrightness", r#"{"brightness":0.5}"#),
            APIEvent::new("", ""),
            APIEvent::new("name!with!bangs", "value!with!bangs!too"),
        ];
        for event in cases {
            let wire = event.serialize();
            assert!(wire.ends_with('!'));
            let parsed = APIEvent::deserialize(&wire).unwrap();
            assert_eq!(parsed, event);
        }
    }

    #[test]
    fn rejects_packet_without_terminator() {
        assert_eq!(
            APIEvent::deserialize("00000004!NextPage!"),
            Err(ApiEventError::MissingTerminator)
        );
    }

    #[test]
    fn rejects_truncated_packet_without_panicking() {
        let cases = [
            "",
            "!",
            "garbage",
            "zzzzzzzz!name!00000000!!",
            "00000004!Next!00000099!short!",
        ];
        for packet in cases {
            assert!(APIEvent::deserialize(packet).is_err());
        }
    }

    #[test]
    fn oversized_packet_is_rejected() {
        let huge = "a".repeat(MAX_PACKET_BYTES + 1);
        assert!(matches!(
            APIEvent::deserialize(&huge),
            Err(ApiEventError::TooLarge(_))
        ));
    }
}
