//! Per-`KneeboardView` configuration.
//!
//! Views are identified here by a persisted string id rather than the
//! runtime `KneeboardViewID` handle, since handles are minted fresh
//! every run and are never persisted.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    pub id: String,
    pub name: String,
    #[serde(default = "default_true")]
    pub header_enabled: bool,
    #[serde(default = "default_true")]
    pub footer_enabled: bool,
    #[serde(default)]
    pub bookmarks_enabled: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewsSettings {
    #[serde(default)]
    pub views: Vec<ViewSettings>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_default_to_empty_list() {
        assert!(ViewsSettings::default().views.is_empty());
    }

    #[test]
    fn a_view_without_explicit_chrome_flags_defaults_chrome_on() {
        let value = serde_json::json!({"id": "primary", "name": "Primary"});
        let view: ViewSettings = serde_json::from_value(value).unwrap();
        assert!(view.header_enabled);
        assert!(view.footer_enabled);
        assert!(!view.bookmarks_enabled);
    }
}
