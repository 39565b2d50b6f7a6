//! Error taxonomy for the settings model: a missing file is not a hard
//! failure, but a present, unreadable, or malformed file is surfaced
//! rather than silently discarded.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize settings section {section}: {source}")]
    Serialize {
        section: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
