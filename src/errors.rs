use thiserror::Error;

/// Errors that cross a task boundary: fatal startup failures and CLI-facing
/// reporting. Per-event problems are logged and swallowed in place (see
/// `sync_loops` module docs), not reported through this type.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Error: {0}")]
    String(String),
    #[error("Error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("Error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Error: {0:?}")]
    Multi(Vec<DispatchError>),
    #[error("unknown error")]
    Unknown,
}

impl From<String> for DispatchError {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for DispatchError {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
