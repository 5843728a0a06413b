use ctx_core::ErrorCategory;
use thiserror::Error;

/// Errors from the ratings store.
#[derive(Error, Debug)]
pub enum RatingsError {
    #[error("stars must be between 1 and 5, got {0}")]
    InvalidStars(u8),

    #[error("no metrics recorded for skill '{0}'")]
    MetricsNotFound(String),

    #[error("recommendation '{0}' not found")]
    RecommendationNotFound(String),

    #[error("unsupported export format '{0}'")]
    UnknownFormat(String),

    #[error("stored timestamp '{value}' is malformed: {reason}")]
    BadTimestamp { value: String, reason: String },

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl RatingsError {
    /// Classify into the shared taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RatingsError::InvalidStars(_) => ErrorCategory::Invariant,
            RatingsError::MetricsNotFound(_) | RatingsError::RecommendationNotFound(_) => {
                ErrorCategory::NotFound
            }
            RatingsError::UnknownFormat(_) | RatingsError::BadTimestamp { .. } => {
                ErrorCategory::Parse
            }
            RatingsError::Db(_) | RatingsError::Io(_) => ErrorCategory::Io,
        }
    }
}

pub type Result<T> = std::result::Result<T, RatingsError>;
