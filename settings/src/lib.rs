//! `KneeboardSettings`: the typed in-memory
//! configuration aggregate, an opaque-`serde_json::Value` boundary for
//! unknown keys, and the per-field diff-against-parent-profile save
//! routine.
pub mod app;
pub mod diff;
pub mod error;
pub mod input;
pub mod profile;
pub mod views;
pub mod vr;

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use app::AppSettings;
pub use error::SettingsError;
pub use input::{Binding, BindingButton, InputSettings};
pub use profile::{ProfileEntry, ProfileSettings, DEFAULT_PROFILE_NAME};
pub use views::{ViewSettings, ViewsSettings};
pub use vr::VrSettings;

/// The full settings tree. Each section is a
/// plain serde struct with a `#[serde(flatten)] extra` bag, so loading
/// an older or newer copy of a section's file never silently drops
/// fields this binary doesn't know about.
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
pub struct KneeboardSettings {
    pub app: AppSettings,
    pub views: ViewsSettings,
    pub vr: VrSettings,
    pub input: InputSettings,
    pub profiles: ProfileSettings,
}

impl Default for KneeboardSettings {
    fn default() -> Self {
        KneeboardSettings {
            app: AppSettings::default(),
            views: ViewsSettings::default(),
            vr: VrSettings::default(),
            input: InputSettings::default(),
            profiles: ProfileSettings::default(),
        }
    }
}

fn section_file_name(section: &str) -> String {
    format!("{section}.json")
}

/// Reads one section's JSON file under `dir`. A missing file is not a
/// failure - it falls back to `T::default()`. A file that exists but
/// fails to read or parse is surfaced as a `SettingsError`.
fn load_section<T: DeserializeOwned + Default>(dir: &Path, section: &str) -> Result<T, SettingsError> {
    let path = dir.join(section_file_name(section));
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => return Err(SettingsError::Io { path, source }),
    };
    serde_json::from_str(&contents).map_err(|source| SettingsError::Parse { path, source })
}

impl KneeboardSettings {
    /// `Load(path) -> KneeboardSettings`: reads `App.json`,
    /// `Views.json`, `VR.json`, `Input.json` and `Profiles.json` out of
    /// `dir`, defaulting any section whose file is absent.
    pub fn load(dir: &Path) -> Result<KneeboardSettings, SettingsError> {
        Ok(KneeboardSettings {
            app: load_section(dir, "App")?,
            views: load_section(dir, "Views")?,
            vr: load_section(dir, "VR")?,
            input: load_section(dir, "Input")?,
            profiles: load_section(dir, "Profiles")?,
        })
    }

    /// `SaveDiff(&self, &parent) -> serde_json::Value`:
    /// the subset of `self`'s serialized form that diverges from
    /// `parent`'s, recursively per-field. Saving the same settings
    /// twice against the same parent yields the same (idempotent)
    /// result.
    pub fn save_diff(&self, parent: &KneeboardSettings) -> Result<serde_json::Value, SettingsError> {
        let self_value = serde_json::to_value(self).map_err(|source| SettingsError::Serialize {
            section: "KneeboardSettings",
            source,
        })?;
        let parent_value = serde_json::to_value(parent).map_err(|source| SettingsError::Serialize {
            section: "KneeboardSettings",
            source,
        })?;
        Ok(diff::diff_against_parent(&self_value, &parent_value))
    }

    /// Writes only the sections that diverge from `parent` into `dir`
    ///. A section identical to the
    /// parent's is left untouched on disk (not truncated to `{}`).
    pub fn write_profile_files(&self, dir: &Path, parent: &KneeboardSettings) -> Result<(), SettingsError> {
        fs::create_dir_all(dir).map_err(|source| SettingsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        write_section_if_diverged(dir, "App", &self.app, &parent.app)?;
        write_section_if_diverged(dir, "Views", &self.views, &parent.views)?;
        write_section_if_diverged(dir, "VR", &self.vr, &parent.vr)?;
        write_section_if_diverged(dir, "Input", &self.input, &parent.input)?;
        write_section_if_diverged(dir, "Profiles", &self.profiles, &parent.profiles)?;
        Ok(())
    }
}

fn write_section_if_diverged<T: Serialize + PartialEq>(
    dir: &Path,
    section: &'static str,
    value: &T,
    parent_value: &T,
) -> Result<(), SettingsError> {
    if value == parent_value {
        return Ok(());
    }
    let serialized = serde_json::to_string_pretty(value).map_err(|source| SettingsError::Serialize { section, source })?;
    let path = dir.join(section_file_name(section));
    fs::write(&path, serialized).map_err(|source| SettingsError::Io { path, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loading_an_empty_directory_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = KneeboardSettings::load(dir.path()).unwrap();
        assert_eq!(settings, KneeboardSettings::default());
    }

    #[test]
    fn a_malformed_present_file_is_a_hard_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("App.json"), "{ not json").unwrap();
        let result = KneeboardSettings::load(dir.path());
        assert!(matches!(result, Err(SettingsError::Parse { .. })));
    }

    #[test]
    fn write_then_load_roundtrips_a_changed_section() {
        let dir = tempdir().unwrap();
        let parent = KneeboardSettings::default();
        let mut child = KneeboardSettings::default();
        child.app.start_minimized = true;

        child.write_profile_files(dir.path(), &parent).unwrap();
        // Only App.json diverged, so only it should exist.
        assert!(dir.path().join("App.json").exists());
        assert!(!dir.path().join("Views.json").exists());

        let loaded = KneeboardSettings::load(dir.path()).unwrap();
        assert!(loaded.app.start_minimized);
        assert_eq!(loaded.views, ViewsSettings::default());
    }

    #[test]
    fn save_diff_is_idempotent_across_repeated_saves() {
        let parent = KneeboardSettings::default();
        let mut child = KneeboardSettings::default();
        child.vr.force_zoom = true;

        let first = child.save_diff(&parent).unwrap();
        let second = child.save_diff(&parent).unwrap();
        assert_eq!(first, second);
        assert_eq!(first["vr"]["force_zoom"], serde_json::json!(true));
        assert!(first.get("app").is_none());
    }
}
