//! Context detection and pattern learning for claude-ctx.
//!
//! The intelligence layer turns a working directory into a structured
//! [`SessionContext`], keeps an append-only history of finished sessions,
//! and produces confidence-scored activation recommendations from three
//! parallel streams (semantic recall, frequency patterns, heuristic rules)
//! plus an optional LLM fallback.
//!
//! Collaborators are injected: a [`Vectorizer`] enables semantic recall and
//! an [`LlmAdvisor`] enables the fallback stream. Both are optional and
//! their absence degrades prediction to the deterministic streams.

pub mod context;
pub mod detector;
pub mod embeddings;
pub mod errors;
pub mod history;
pub mod learner;
pub mod llm;
pub mod recommend;
pub mod rules;

pub use context::SessionContext;
pub use detector::ContextDetector;
pub use embeddings::{cosine_similarity, EmbeddingRecord, EmbeddingStore, SimilarSession, Vectorizer};
pub use errors::{IntelError, Result};
pub use history::{HistoryStore, SessionOutcome, SessionRecord};
pub use learner::PatternLearner;
pub use llm::{LlmAdvisor, LlmSuggestion};
pub use recommend::{
    merge, Prediction, Recommendation, RecommendationKind, RecommendationSource, StreamReport,
    StreamStatus,
};
pub use rules::{evaluate, HeuristicRule, DEFAULT_RULES};
