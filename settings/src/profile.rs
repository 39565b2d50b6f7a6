//! Profile list and the active profile.
//!
//! A profile without an explicit parent inherits from the always-
//! present `"Default"` profile; `KneeboardSettings::save_diff` walks
//! that chain to decide what a profile's own files actually need to
//! contain.
use serde::{Deserialize, Serialize};

pub const DEFAULT_PROFILE_NAME: &str = "Default";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub name: String,
    /// `None` for the default profile and for a profile that
    /// explicitly inherits from it; any other profile name otherwise.
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSettings {
    pub active_profile: String,
    pub profiles: Vec<ProfileEntry>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for ProfileSettings {
    fn default() -> Self {
        ProfileSettings {
            active_profile: DEFAULT_PROFILE_NAME.to_string(),
            profiles: vec![ProfileEntry {
                name: DEFAULT_PROFILE_NAME.to_string(),
                parent: None,
            }],
            extra: serde_json::Map::new(),
        }
    }
}

impl ProfileSettings {
    pub fn parent_of(&self, profile_name: &str) -> Option<&str> {
        self.profiles
            .iter()
            .find(|p| p.name == profile_name)
            .and_then(|p| p.parent.as_deref())
            .or(if profile_name == DEFAULT_PROFILE_NAME {
                None
            } else {
                Some(DEFAULT_PROFILE_NAME)
            })
    }
}
