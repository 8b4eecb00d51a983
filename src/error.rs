use thiserror::Error;

/// Failures talking to the save backend.
#[derive(Debug, Error)]
pub enum SaveError {
    /// No backend is reachable (e.g. localStorage disabled).
    #[error("storage unavailable")]
    Unavailable,
    /// The backend refused the write (quota, permissions).
    #[error("storage rejected the operation: {0}")]
    Rejected(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    /// Valid JSON that holds nothing at all (`null`).
    #[error("save data is null")]
    NullSnapshot,
}

/// A malformed environment setting.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
