//! Error taxonomy for the input adapters. Device loss and transport
//! hiccups here are transient - an adapter logs and keeps retrying
//! rather than tearing the process down, so this enum only covers
//! failures an adapter can't route around.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("device enumeration failed: {0}")]
    Enumeration(String),
    #[error("Wintab32.dll is not available: {0}")]
    WintabUnavailable(String),
    #[error("malformed OTD IPC message: {0}")]
    OtdMessage(#[from] serde_json::Error),
    #[error("named pipe unavailable: {0}")]
    PipeUnavailable(String),
}
