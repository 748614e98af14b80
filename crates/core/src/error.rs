use thiserror::Error;

/// Errors surfaced while reading, validating or replaying a session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("session parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("session is missing app_info")]
    MissingAppInfo,

    #[error("unsupported session version {found} (latest is {latest})")]
    UnsupportedVersion { found: u32, latest: u32 },

    #[error("command {index} has no \"type\" field")]
    MissingType { index: usize },

    #[error("unknown command type {0:?}")]
    UnknownCommand(String),

    #[error("invalid {type_name}: {details}")]
    InvalidCommand { type_name: String, details: String },

    #[error("current index {index} exceeds command count {count}")]
    InvalidCurrentIndex { index: usize, count: usize },

    #[error("no executor registered for {0:?}")]
    MissingExecutor(String),
}

pub type Result<T> = std::result::Result<T, SessionError>;
