//! General application settings.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_true")]
    pub auto_update_check: bool,
    #[serde(default)]
    pub start_minimized: bool,
    #[serde(default)]
    pub dual_kneeboards_enabled: bool,
    /// Unknown keys from a newer/older binary's copy of this file,
    /// preserved verbatim across a load/save roundtrip.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            auto_update_check: true,
            start_minimized: false,
            dual_kneeboards_enabled: false,
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_roundtrip_through_extra() {
        let value = serde_json::json!({
            "auto_update_check": false,
            "some_future_field": "kept",
        });
        let settings: AppSettings = serde_json::from_value(value.clone()).unwrap();
        assert!(!settings.auto_update_check);
        assert_eq!(
            settings.extra.get("some_future_field"),
            Some(&serde_json::Value::String("kept".into()))
        );

        let roundtripped = serde_json::to_value(&settings).unwrap();
        assert_eq!(roundtripped, value);
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let settings = AppSettings::default();
        assert!(settings.auto_update_check);
        assert!(!settings.start_minimized);
    }
}
