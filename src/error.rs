use thiserror::Error;

#[derive(Error, Debug)]
pub enum DevnavError {
    #[error("Not in a devnav project. Run 'devnav init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .devnav/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Ambiguous id: {0}")]
    AmbiguousId(String),

    #[error("{0}")]
    NonInteractive(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Sync error: {0}")]
    Sync(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<rusqlite::Error> for DevnavError {
    fn from(e: rusqlite::Error) -> Self {
        DevnavError::Storage(format!("SQLite error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, DevnavError>;
