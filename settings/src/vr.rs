//! Persisted VR configuration.
//!
//! This is the on-disk counterpart of the per-frame `shm::VRSettings`
//! wire struct published in the SHM header; `KneeboardState` seeds the
//! wire struct's mutable fields (`force_zoom`, `gaze_input_focus`) from
//! this at startup and whenever a `UserAction` toggles one of them.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VrSettings {
    #[serde(default)]
    pub recenter_on_open: bool,
    #[serde(default)]
    pub force_zoom: bool,
    #[serde(default = "default_true")]
    pub gaze_input_focus: bool,
    #[serde(default = "default_one")]
    pub normal_opacity: f32,
    #[serde(default = "default_one")]
    pub gaze_opacity: f32,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

fn default_one() -> f32 {
    1.0
}

impl Default for VrSettings {
    fn default() -> Self {
        VrSettings {
            recenter_on_open: false,
            force_zoom: false,
            gaze_input_focus: true,
            normal_opacity: 1.0,
            gaze_opacity: 1.0,
            extra: serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_a_freshly_recentered_full_opacity_kneeboard() {
        let settings = VrSettings::default();
        assert!(!settings.force_zoom);
        assert!(settings.gaze_input_focus);
        assert_eq!(settings.normal_opacity, 1.0);
        assert_eq!(settings.gaze_opacity, 1.0);
    }
}
