//! Optional LLM collaborator.
//!
//! The learner can consult a language model when its deterministic streams
//! come back weak. The contract is deliberately narrow: the collaborator
//! sees a textual context fingerprint plus recent session records and
//! returns named suggestions with confidences. Implementations are expected
//! to be stateless between calls. Absence is the default; suggestions from
//! this stream are never auto-activated.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::history::SessionRecord;

/// One suggestion returned by the collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSuggestion {
    /// Agent name being proposed.
    pub name: String,
    /// Model-reported confidence, clamped into [0, 1] on merge.
    pub confidence: f64,
    /// Model-provided justification.
    pub reason: String,
}

/// Trait for LLM recommendation collaborators.
#[async_trait]
pub trait LlmAdvisor: Send + Sync {
    /// Propose agents for the given context.
    ///
    /// `recent` carries the most recent session records, newest last, as
    /// grounding material.
    async fn propose(
        &self,
        context_text: &str,
        recent: &[SessionRecord],
    ) -> anyhow::Result<Vec<LlmSuggestion>>;
}
