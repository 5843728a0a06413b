use ctx_core::{CoreError, ErrorCategory};
use ctx_intel::IntelError;
use ctx_ratings::RatingsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any failure surfaced by the engine, preserving the originating crate's
/// typed error.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Intel(#[from] IntelError),

    #[error(transparent)]
    Ratings(#[from] RatingsError),
}

impl EngineError {
    /// Classify into the shared taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            EngineError::Core(err) => err.category(),
            EngineError::Intel(err) => err.category(),
            EngineError::Ratings(err) => err.category(),
        }
    }

    /// A remediation hint, when one exists.
    pub fn hint(&self) -> Option<String> {
        match self {
            EngineError::Core(err) => err.hint(),
            EngineError::Intel(_) | EngineError::Ratings(_) => None,
        }
    }

    /// Flatten into the serializable shape front-ends consume.
    pub fn report(&self, context: impl Into<Option<String>>) -> ErrorReport {
        ErrorReport {
            category: self.category(),
            message: self.to_string(),
            hint: self.hint(),
            context: context.into(),
        }
    }
}

/// Structured error surface for CLI/TUI consumption. No stack traces, no
/// internal paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub category: ErrorCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_passes_through() {
        let err = EngineError::Core(CoreError::CycleDetected {
            path: vec!["a".into(), "a".into()],
        });
        assert_eq!(err.category(), ErrorCategory::Invariant);
        let report = err.report(Some("activating a".to_string()));
        assert_eq!(report.category, ErrorCategory::Invariant);
        assert!(report.message.contains("cycle"));
    }
}
