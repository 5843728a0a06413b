//! The pattern learner: session recording and three-stream prediction.
//!
//! Prediction fuses up to four candidate streams:
//!
//! 1. **Semantic** - cosine similarity of the context fingerprint against
//!    embeddings of past sessions (needs a [`Vectorizer`])
//! 2. **Pattern** - agent frequency among past sessions whose architectural
//!    flags match exactly
//! 3. **Rule** - the static heuristic table
//! 4. **LLM** - an optional collaborator, consulted only when everything
//!    else comes back weak
//!
//! Pattern and rule streams always complete; the semantic and LLM streams
//! run under the prediction deadline and are dropped when they miss it.
//! The merge is deterministic for fixed history, vectorizer output, and
//! rule table.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use ctx_core::settings::RecommendSettings;
use tokio::time::timeout;

use crate::context::SessionContext;
use crate::embeddings::{EmbeddingRecord, EmbeddingStore, Vectorizer};
use crate::errors::Result;
use crate::history::{HistoryStore, SessionOutcome, SessionRecord};
use crate::llm::LlmAdvisor;
use crate::recommend::{
    merge, Prediction, Recommendation, RecommendationKind, RecommendationSource, StreamReport,
    StreamStatus,
};
use crate::rules::{evaluate, HeuristicRule, DEFAULT_RULES};

/// Confidence ceiling for the frequency-pattern stream.
const PATTERN_CONFIDENCE_CAP: f64 = 0.95;

/// Session recorder and recommendation engine.
pub struct PatternLearner {
    history: HistoryStore,
    embeddings: EmbeddingStore,
    vectorizer: Option<Arc<dyn Vectorizer>>,
    llm: Option<Arc<dyn LlmAdvisor>>,
    rules: &'static [HeuristicRule],
    settings: RecommendSettings,
}

impl PatternLearner {
    pub fn new(
        history: HistoryStore,
        embeddings: EmbeddingStore,
        settings: RecommendSettings,
    ) -> Self {
        Self {
            history,
            embeddings,
            vectorizer: None,
            llm: None,
            rules: DEFAULT_RULES,
            settings,
        }
    }

    /// Inject an embedding collaborator, enabling the semantic stream.
    pub fn with_vectorizer(mut self, vectorizer: Arc<dyn Vectorizer>) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    /// Inject an LLM collaborator, enabling the fallback stream.
    pub fn with_llm(mut self, llm: Arc<dyn LlmAdvisor>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Swap the heuristic rule table.
    pub fn with_rules(mut self, rules: &'static [HeuristicRule]) -> Self {
        self.rules = rules;
        self
    }

    pub fn has_vectorizer(&self) -> bool {
        self.vectorizer.is_some()
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Record a finished session and, when a vectorizer is configured,
    /// embed its fingerprint for later semantic recall.
    ///
    /// An embedding failure is logged and swallowed; the history append is
    /// the durable part.
    pub async fn record_success(
        &self,
        context: &SessionContext,
        agents_used: &[String],
        duration: Duration,
        outcome: SessionOutcome,
    ) -> Result<SessionRecord> {
        let record =
            SessionRecord::from_context(context, agents_used, duration.as_secs(), outcome);
        self.history.append(&record)?;
        tracing::debug!(id = %record.id, outcome = %record.outcome, "recorded session");

        if let Some(vectorizer) = &self.vectorizer {
            match vectorizer.embed(&record.context_fingerprint).await {
                Ok(vector) => self.embeddings.append(&EmbeddingRecord {
                    session_id: record.id.clone(),
                    vector,
                })?,
                Err(err) => {
                    tracing::warn!(error = %err, "embedding failed; session recorded without vector");
                }
            }
        }
        Ok(record)
    }

    /// Produce ranked recommendations for a context.
    pub async fn predict(&self, context: &SessionContext, include_llm: bool) -> Result<Prediction> {
        let deadline = Duration::from_millis(self.settings.predict_deadline_ms);
        let history = self.history.load()?;
        let mut streams: Vec<StreamReport> = Vec::new();
        let mut candidates: Vec<Recommendation> = Vec::new();

        // Semantic stream, under the deadline.
        let (semantic, report) = self.semantic_stream(context, &history, deadline).await;
        candidates.extend(semantic);
        streams.push(report);

        // Pattern and rule streams always complete.
        let pattern = pattern_candidates(&history, context);
        streams.push(StreamReport {
            source: RecommendationSource::Pattern,
            status: contributed_or_empty(pattern.len()),
        });
        candidates.extend(pattern);

        let rule = evaluate(self.rules, context);
        streams.push(StreamReport {
            source: RecommendationSource::Rule,
            status: contributed_or_empty(rule.len()),
        });
        candidates.extend(rule);

        // The LLM only fires when the deterministic streams are weak.
        let best = candidates
            .iter()
            .map(|rec| rec.confidence)
            .fold(0.0f64, f64::max);
        let (llm, report) = self
            .llm_stream(context, &history, include_llm, best, deadline)
            .await;
        candidates.extend(llm);
        streams.push(report);

        let mut recommendations = merge(candidates);
        for rec in &mut recommendations {
            rec.auto_activate = rec.kind == RecommendationKind::Agent
                && rec.source != RecommendationSource::Llm
                && rec.confidence >= self.settings.auto_activate_threshold;
        }
        Ok(Prediction {
            recommendations,
            streams,
        })
    }

    async fn semantic_stream(
        &self,
        context: &SessionContext,
        history: &[SessionRecord],
        deadline: Duration,
    ) -> (Vec<Recommendation>, StreamReport) {
        let source = RecommendationSource::Semantic;
        let vectorizer = match &self.vectorizer {
            Some(vectorizer) => vectorizer,
            None => {
                return (
                    Vec::new(),
                    StreamReport {
                        source,
                        status: StreamStatus::Skipped("no vectorizer configured".into()),
                    },
                )
            }
        };

        let fingerprint = context.fingerprint();
        let query = match timeout(deadline, vectorizer.embed(&fingerprint)).await {
            Err(_) => {
                tracing::warn!("semantic stream missed its deadline");
                return (
                    Vec::new(),
                    StreamReport {
                        source,
                        status: StreamStatus::TimedOut,
                    },
                );
            }
            Ok(Err(err)) => {
                return (
                    Vec::new(),
                    StreamReport {
                        source,
                        status: StreamStatus::Failed(err.to_string()),
                    },
                )
            }
            Ok(Ok(query)) => query,
        };

        let hits = match self.embeddings.search(
            &query,
            self.settings.semantic_top_k,
            self.settings.similarity_floor as f32,
        ) {
            Ok(hits) => hits,
            Err(err) => {
                return (
                    Vec::new(),
                    StreamReport {
                        source,
                        status: StreamStatus::Failed(err.to_string()),
                    },
                )
            }
        };

        let by_id: BTreeMap<&str, &SessionRecord> = history
            .iter()
            .map(|record| (record.id.as_str(), record))
            .collect();
        let mut candidates = Vec::new();
        for hit in hits {
            let Some(record) = by_id.get(hit.session_id.as_str()) else {
                continue;
            };
            for agent in &record.agents_used {
                candidates.push(Recommendation {
                    kind: RecommendationKind::Agent,
                    name: agent.clone(),
                    confidence: hit.similarity as f64,
                    reason: "similar past session".to_string(),
                    auto_activate: false,
                    source,
                });
            }
        }
        let status = contributed_or_empty(candidates.len());
        (candidates, StreamReport { source, status })
    }

    async fn llm_stream(
        &self,
        context: &SessionContext,
        history: &[SessionRecord],
        include_llm: bool,
        best_confidence: f64,
        deadline: Duration,
    ) -> (Vec<Recommendation>, StreamReport) {
        let source = RecommendationSource::Llm;
        let skipped = |reason: &str| {
            (
                Vec::new(),
                StreamReport {
                    source,
                    status: StreamStatus::Skipped(reason.to_string()),
                },
            )
        };
        if !include_llm {
            return skipped("not requested");
        }
        let advisor = match &self.llm {
            Some(advisor) => advisor,
            None => return skipped("no LLM collaborator configured"),
        };
        if best_confidence >= self.settings.llm_fallback_threshold {
            return skipped("deterministic streams are confident enough");
        }

        let recent: Vec<SessionRecord> = history
            .iter()
            .rev()
            .take(self.settings.semantic_top_k)
            .rev()
            .cloned()
            .collect();
        let fingerprint = context.fingerprint();
        match timeout(deadline, advisor.propose(&fingerprint, &recent)).await {
            Err(_) => {
                tracing::warn!("LLM stream missed its deadline");
                (
                    Vec::new(),
                    StreamReport {
                        source,
                        status: StreamStatus::TimedOut,
                    },
                )
            }
            Ok(Err(err)) => (
                Vec::new(),
                StreamReport {
                    source,
                    status: StreamStatus::Failed(err.to_string()),
                },
            ),
            Ok(Ok(suggestions)) => {
                let candidates: Vec<Recommendation> = suggestions
                    .into_iter()
                    .map(|s| Recommendation {
                        kind: RecommendationKind::Agent,
                        name: s.name,
                        confidence: s.confidence.clamp(0.0, 1.0),
                        reason: s.reason,
                        auto_activate: false,
                        source,
                    })
                    .collect();
                let status = contributed_or_empty(candidates.len());
                (candidates, StreamReport { source, status })
            }
        }
    }
}

fn contributed_or_empty(count: usize) -> StreamStatus {
    if count == 0 {
        StreamStatus::Empty
    } else {
        StreamStatus::Contributed(count)
    }
}

/// Frequency stream: among past sessions whose architectural flags match
/// the current context exactly, how often was each agent used?
fn pattern_candidates(history: &[SessionRecord], context: &SessionContext) -> Vec<Recommendation> {
    let flags = context.architectural_flags();
    let matching: Vec<&SessionRecord> = history
        .iter()
        .filter(|record| record.architectural_flags == flags)
        .collect();
    let total = matching.len();
    if total == 0 {
        return Vec::new();
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &matching {
        for agent in &record.agents_used {
            *counts.entry(agent.as_str()).or_default() += 1;
        }
    }
    counts
        .into_iter()
        .map(|(agent, count)| Recommendation {
            kind: RecommendationKind::Agent,
            name: agent.to_string(),
            confidence: (count as f64 / total as f64).min(PATTERN_CONFIDENCE_CAP),
            reason: format!("used in {count} of {total} sessions with this shape"),
            auto_activate: false,
            source: RecommendationSource::Pattern,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmSuggestion;
    use async_trait::async_trait;
    use ctx_core::settings::HistorySettings;

    struct StubVectorizer;

    #[async_trait]
    impl Vectorizer for StubVectorizer {
        async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>> {
            // Axis depends on whether the text mentions auth, so auth-ish
            // and plain contexts land apart.
            if text.contains("auth") {
                Ok(vec![1.0, 0.0])
            } else {
                Ok(vec![0.0, 1.0])
            }
        }

        fn dim(&self) -> usize {
            2
        }
    }

    struct StubAdvisor {
        delay: Duration,
    }

    #[async_trait]
    impl LlmAdvisor for StubAdvisor {
        async fn propose(
            &self,
            _context_text: &str,
            _recent: &[SessionRecord],
        ) -> anyhow::Result<Vec<LlmSuggestion>> {
            tokio::time::sleep(self.delay).await;
            Ok(vec![LlmSuggestion {
                name: "novel-agent".into(),
                confidence: 0.99,
                reason: "model guess".into(),
            }])
        }
    }

    fn learner(tmp: &tempfile::TempDir) -> PatternLearner {
        PatternLearner::new(
            HistoryStore::new(tmp.path().join("history.jsonl"), HistorySettings::default()),
            EmbeddingStore::new(tmp.path().join("embeddings.jsonl")),
            RecommendSettings::default(),
        )
    }

    fn auth_context() -> SessionContext {
        let mut ctx = SessionContext::empty();
        ctx.has_auth = true;
        ctx
    }

    #[tokio::test]
    async fn rules_only_when_nothing_else_configured() {
        let tmp = tempfile::tempdir().unwrap();
        let learner = learner(&tmp);
        let prediction = learner.predict(&auth_context(), false).await.unwrap();

        assert_eq!(prediction.recommendations.len(), 1);
        let rec = &prediction.recommendations[0];
        assert_eq!(rec.name, "security-auditor");
        assert_eq!(rec.source, RecommendationSource::Rule);
        assert_eq!(rec.confidence, 0.95);
        assert!(rec.auto_activate);

        let semantic = &prediction.streams[0];
        assert!(matches!(semantic.status, StreamStatus::Skipped(_)));
    }

    #[tokio::test]
    async fn empty_context_and_history_recommends_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let learner = learner(&tmp);
        let prediction = learner
            .predict(&SessionContext::empty(), false)
            .await
            .unwrap();
        assert!(prediction.recommendations.is_empty());
    }

    #[tokio::test]
    async fn pattern_stream_counts_matching_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let learner = learner(&tmp);
        let ctx = auth_context();
        for _ in 0..3 {
            learner
                .record_success(
                    &ctx,
                    &["security-auditor".to_string()],
                    Duration::from_secs(60),
                    SessionOutcome::Success,
                )
                .await
                .unwrap();
        }
        learner
            .record_success(
                &ctx,
                &["python-pro".to_string()],
                Duration::from_secs(60),
                SessionOutcome::Success,
            )
            .await
            .unwrap();

        let prediction = learner.predict(&ctx, false).await.unwrap();
        let python = prediction
            .recommendations
            .iter()
            .find(|r| r.name == "python-pro")
            .unwrap();
        assert_eq!(python.source, RecommendationSource::Pattern);
        assert!((python.confidence - 0.25).abs() < 1e-9);
        // security-auditor keeps the higher rule confidence over 0.75 pattern.
        let auditor = prediction
            .recommendations
            .iter()
            .find(|r| r.name == "security-auditor")
            .unwrap();
        assert_eq!(auditor.confidence, 0.95);
    }

    #[tokio::test]
    async fn semantic_stream_recalls_similar_sessions() {
        let tmp = tempfile::tempdir().unwrap();
        let learner = learner(&tmp).with_vectorizer(Arc::new(StubVectorizer));
        let ctx = auth_context();
        learner
            .record_success(
                &ctx,
                &["security-auditor".to_string(), "python-pro".to_string()],
                Duration::from_secs(60),
                SessionOutcome::Success,
            )
            .await
            .unwrap();

        let prediction = learner.predict(&ctx, false).await.unwrap();
        // python-pro only arrives via the semantic stream (similarity 1.0,
        // which beats its 0.25-style pattern score).
        let python = prediction
            .recommendations
            .iter()
            .find(|r| r.name == "python-pro")
            .unwrap();
        assert_eq!(python.source, RecommendationSource::Semantic);
        assert!((python.confidence - 1.0).abs() < 1e-6);
        assert!(python.auto_activate);
    }

    #[tokio::test]
    async fn llm_fires_only_below_threshold_and_never_auto_activates() {
        let tmp = tempfile::tempdir().unwrap();
        let learner = learner(&tmp).with_llm(Arc::new(StubAdvisor {
            delay: Duration::ZERO,
        }));

        // Weak context: nothing deterministic fires, so the LLM runs.
        let prediction = learner
            .predict(&SessionContext::empty(), true)
            .await
            .unwrap();
        let novel = prediction
            .recommendations
            .iter()
            .find(|r| r.name == "novel-agent")
            .unwrap();
        assert_eq!(novel.source, RecommendationSource::Llm);
        assert!(!novel.auto_activate, "LLM results are never auto-activated");

        // Confident context: the rule stream clears the bar, the LLM is
        // skipped.
        let prediction = learner.predict(&auth_context(), true).await.unwrap();
        assert!(prediction
            .recommendations
            .iter()
            .all(|r| r.name != "novel-agent"));
        let llm_report = prediction
            .streams
            .iter()
            .find(|s| s.source == RecommendationSource::Llm)
            .unwrap();
        assert!(matches!(llm_report.status, StreamStatus::Skipped(_)));
    }

    #[tokio::test]
    async fn slow_llm_is_dropped_on_deadline() {
        let tmp = tempfile::tempdir().unwrap();
        let mut settings = RecommendSettings::default();
        settings.predict_deadline_ms = 50;
        let learner = PatternLearner::new(
            HistoryStore::new(tmp.path().join("history.jsonl"), HistorySettings::default()),
            EmbeddingStore::new(tmp.path().join("embeddings.jsonl")),
            settings,
        )
        .with_llm(Arc::new(StubAdvisor {
            delay: Duration::from_secs(5),
        }));

        let prediction = learner
            .predict(&SessionContext::empty(), true)
            .await
            .unwrap();
        assert!(prediction.recommendations.is_empty());
        let llm_report = prediction
            .streams
            .iter()
            .find(|s| s.source == RecommendationSource::Llm)
            .unwrap();
        assert_eq!(llm_report.status, StreamStatus::TimedOut);
    }

    #[tokio::test]
    async fn prediction_is_deterministic() {
        let tmp = tempfile::tempdir().unwrap();
        let learner = learner(&tmp).with_vectorizer(Arc::new(StubVectorizer));
        let ctx = auth_context();
        for agent in ["security-auditor", "python-pro"] {
            learner
                .record_success(
                    &ctx,
                    &[agent.to_string()],
                    Duration::from_secs(30),
                    SessionOutcome::Success,
                )
                .await
                .unwrap();
        }

        let first = learner.predict(&ctx, false).await.unwrap();
        let second = learner.predict(&ctx, false).await.unwrap();
        let names_a: Vec<&str> = first
            .recommendations
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        let names_b: Vec<&str> = second
            .recommendations
            .iter()
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(names_a, names_b);
        for (a, b) in first
            .recommendations
            .iter()
            .zip(second.recommendations.iter())
        {
            assert_eq!(a.confidence, b.confidence);
            assert_eq!(a.source, b.source);
        }
    }
}
