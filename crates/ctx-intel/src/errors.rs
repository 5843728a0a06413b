use std::path::PathBuf;

use ctx_core::ErrorCategory;
use thiserror::Error;

/// Errors from context detection and pattern learning.
#[derive(Error, Debug)]
pub enum IntelError {
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("corrupt record in {path} at line {line}: {reason}")]
    CorruptRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{stream} stream missed its deadline")]
    StreamTimeout { stream: &'static str },

    #[error("no vectorizer configured")]
    VectorizerUnavailable,

    #[error("no LLM collaborator configured")]
    LlmUnavailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntelError {
    /// Classify into the shared taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            IntelError::DirectoryNotFound(_) => ErrorCategory::NotFound,
            IntelError::CorruptRecord { .. } | IntelError::Serialize(_) => ErrorCategory::Parse,
            IntelError::StreamTimeout { .. } => ErrorCategory::Timeout,
            IntelError::VectorizerUnavailable | IntelError::LlmUnavailable => {
                ErrorCategory::Unavailable
            }
            IntelError::Io(_) => ErrorCategory::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, IntelError>;
