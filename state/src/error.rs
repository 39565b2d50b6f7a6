//! Error taxonomy for the orchestrator: failures that reach here have
//! already been filtered by every lower component's own transient
//! handling, so what's left is either a caller mistake (an unknown
//! tab/profile name) or a genuine state-machine violation.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("no tab named '{0}'")]
    UnknownTabName(String),
    #[error("tab index {0} out of range")]
    UnknownTabIndex(u32),
    #[error("no tab with id {0:?}")]
    UnknownTabId(view::TabID),
    #[error("no profile named '{0}'")]
    UnknownProfile(String),
    #[error(transparent)]
    Settings(#[from] settings::SettingsError),
}
