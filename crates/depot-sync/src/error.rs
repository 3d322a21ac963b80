use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("cancelled before update of {name}")]
    Cancelled { name: String },

    #[error("login source {name} failed: {message}")]
    SourceFailed { name: String, message: String },

    #[error("login source registry error: {0}")]
    Registry(String),
}

impl SyncError {
    pub fn source_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
