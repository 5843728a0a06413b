//! The claude-ctx orchestration engine.
//!
//! [`ContextEngine`] is the single public surface consumed by the CLI and
//! TUI. It composes the component store, the dependency resolver, the
//! context detector, the pattern learner, and the ratings database, and it
//! enforces the cross-component invariants:
//!
//! - activating an agent activates its full `requires` closure,
//!   dependency-first
//! - deactivating an agent is blocked while active agents require it
//!   (unless forced, with an explicit warning)
//! - auto-activation only enacts agent recommendations at or above the
//!   confidence threshold, and never LLM-sourced ones
//! - every rating write recomputes that skill's quality metrics atomically
//!
//! All returned types are plain serializable data; failures carry a
//! category, message, and hint (see [`ErrorReport`]).

pub mod errors;
pub mod identity;
pub mod reports;

pub use errors::{EngineError, ErrorReport, Result};
pub use reports::{
    ActivationReport, AutoActivationOutcome, AutoActivationReport, DeactivationReport,
    ResolvedSkillDependency, SkillRatingsView, StepError,
};

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ctx_core::{
    resolve_skill_dependency, Component, ComponentInfo, ComponentKind, CoreError, CtxPaths,
    DependencyGraph, Profile, ProfileDiff, Settings, SkillReader, Store, WorkflowInfo,
};
use ctx_intel::{
    ContextDetector, EmbeddingStore, HistoryStore, LlmAdvisor, PatternLearner, Prediction,
    Recommendation, RecommendationKind, RecommendationSource, SessionContext, SessionOutcome,
    SessionRecord, Vectorizer,
};
use ctx_ratings::{ExportFormat, NewRecommendation, RatingsDb, SkillQualityMetrics};

/// Builder for [`ContextEngine`], mirroring the optionality of its
/// collaborators.
pub struct EngineBuilder {
    paths: CtxPaths,
    settings: Option<Settings>,
    vectorizer: Option<Arc<dyn Vectorizer>>,
    llm: Option<Arc<dyn LlmAdvisor>>,
}

impl EngineBuilder {
    pub fn new(paths: CtxPaths) -> Self {
        Self {
            paths,
            settings: None,
            vectorizer: None,
            llm: None,
        }
    }

    /// Override settings instead of loading `<root>/config.toml`.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Enable the semantic stream.
    pub fn vectorizer(mut self, vectorizer: Arc<dyn Vectorizer>) -> Self {
        self.vectorizer = Some(vectorizer);
        self
    }

    /// Enable the LLM fallback stream.
    pub fn llm(mut self, llm: Arc<dyn LlmAdvisor>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Open the workspace and connect the ratings database.
    pub async fn build(self) -> Result<ContextEngine> {
        let settings = self
            .settings
            .unwrap_or_else(|| Settings::load(&self.paths.config_file()));
        let store = Store::open(self.paths.clone())?;

        let history = HistoryStore::new(self.paths.history_file(), settings.history.clone());
        let embeddings = EmbeddingStore::new(self.paths.embeddings_file());
        let mut learner =
            PatternLearner::new(history, embeddings, settings.recommend.clone());
        if let Some(vectorizer) = self.vectorizer {
            learner = learner.with_vectorizer(vectorizer);
        }
        if let Some(llm) = self.llm {
            learner = learner.with_llm(llm);
        }

        let db_path = self.paths.ratings_db();
        let ratings = RatingsDb::new(&db_path.to_string_lossy()).await?;

        Ok(ContextEngine {
            detector: ContextDetector::new(settings.detect.scan_limit),
            store,
            learner,
            ratings,
            settings,
            user_hash: identity::user_hash(),
        })
    }
}

/// The orchestrator: routes every CLI/TUI operation into the stores and
/// the learner while holding the invariants together.
pub struct ContextEngine {
    store: Store,
    detector: ContextDetector,
    learner: PatternLearner,
    ratings: RatingsDb,
    settings: Settings,
    user_hash: String,
}

impl ContextEngine {
    /// Open an engine over the environment-resolved workspace with no
    /// collaborators.
    pub async fn open() -> Result<Self> {
        EngineBuilder::new(CtxPaths::resolve()?).build().await
    }

    /// Start a builder over an explicit workspace root.
    pub fn builder(paths: CtxPaths) -> EngineBuilder {
        EngineBuilder::new(paths)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    // ---- read paths -------------------------------------------------------

    /// List every component of a kind, active and disabled.
    pub fn component_list(&self, kind: ComponentKind) -> Result<Vec<ComponentInfo>> {
        Ok(self.store.list(kind)?)
    }

    /// Load one component with its body.
    pub fn component_load(&self, kind: ComponentKind, name: &str) -> Result<Component> {
        Ok(self.store.load(kind, name)?)
    }

    /// A progressive-disclosure reader over a skill.
    pub fn skill_reader(&self, name: &str) -> Result<SkillReader> {
        Ok(self.store.skill_reader(name)?)
    }

    /// Resolve a skill's `depends_on` references against the installed
    /// skill versions. An unresolvable reference is a hard error.
    pub fn skill_dependencies(&self, name: &str) -> Result<Vec<ResolvedSkillDependency>> {
        let component = self.store.load(ComponentKind::Skill, name)?;
        let spec = match &component.spec {
            ctx_core::ComponentSpec::Skill(spec) => spec,
            _ => unreachable!("skill load returned non-skill spec"),
        };
        let available = self.store.installed_skill_versions()?;
        let mut resolved = Vec::new();
        for dep in spec.dependencies()? {
            let version = resolve_skill_dependency(&dep, &available)?;
            resolved.push(ResolvedSkillDependency {
                name: dep.name.clone(),
                spec: dep.spec.to_string(),
                resolved_version: version.to_string(),
            });
        }
        Ok(resolved)
    }

    /// Inventory the workflows directory.
    pub fn workflow_list(&self) -> Result<Vec<WorkflowInfo>> {
        Ok(self.store.workflows()?)
    }

    /// Report every component whose definition fails to parse.
    pub fn doctor(&self) -> Result<Vec<ComponentInfo>> {
        Ok(self.store.doctor()?)
    }

    // ---- activation -------------------------------------------------------

    /// Activate a component.
    ///
    /// Agents activate their whole `requires` closure dependency-first;
    /// a failure mid-closure short-circuits and the report shows what had
    /// already been applied. Other kinds are single-file moves.
    pub fn activate(&self, kind: ComponentKind, name: &str) -> Result<ActivationReport> {
        let mut report = ActivationReport::default();
        match kind {
            ComponentKind::Agent => {
                let specs = self.store.agent_specs()?;
                let graph = DependencyGraph::from_agents(specs.iter());
                if !graph.contains(name) {
                    return Err(CoreError::ComponentNotFound {
                        kind: ComponentKind::Agent,
                        name: name.to_string(),
                    }
                    .into());
                }
                let active = self.store.active_names(ComponentKind::Agent)?;
                let plan = graph.activation_plan(name, &active)?;
                for step in plan {
                    if !step.needs_activation {
                        report.already_active.push(step.name);
                        continue;
                    }
                    match self.store.activate(ComponentKind::Agent, &step.name) {
                        Ok(()) => report.activated.push(step.name),
                        Err(err) => {
                            report.errors.push(StepError {
                                name: step.name,
                                message: err.to_string(),
                            });
                            break;
                        }
                    }
                }
            }
            _ => match self.store.activate(kind, name) {
                Ok(()) => report.activated.push(name.to_string()),
                Err(CoreError::AlreadyActive { .. }) => {
                    report.already_active.push(name.to_string())
                }
                Err(err) => return Err(err.into()),
            },
        }
        Ok(report)
    }

    /// Deactivate a component.
    ///
    /// An agent still required by active agents is refused unless `force`
    /// is set, in which case the report names every dependent left broken.
    pub fn deactivate(
        &self,
        kind: ComponentKind,
        name: &str,
        force: bool,
    ) -> Result<DeactivationReport> {
        let mut report = DeactivationReport::default();
        if kind == ComponentKind::Agent {
            let specs = self.store.agent_specs()?;
            let graph = DependencyGraph::from_agents(specs.iter());
            let active = self.store.active_names(ComponentKind::Agent)?;
            let blocked_by = graph.active_dependents(name, &active);
            if !blocked_by.is_empty() {
                if !force {
                    return Err(CoreError::DeactivationBlocked {
                        name: name.to_string(),
                        blocked_by,
                    }
                    .into());
                }
                for dependent in &blocked_by {
                    report.warnings.push(format!(
                        "'{dependent}' still requires '{name}' and is left with a missing dependency"
                    ));
                }
            }
        }
        self.store.deactivate(kind, name)?;
        report.deactivated.push(name.to_string());
        Ok(report)
    }

    // ---- intelligence -----------------------------------------------------

    /// Detect a session context from a working directory and overlay the
    /// currently active component names.
    pub fn detect_context(&self, path: &Path) -> Result<SessionContext> {
        let mut context = self.detector.detect(path)?;
        context.active_agents = self
            .store
            .active_names(ComponentKind::Agent)?
            .into_iter()
            .collect();
        context.active_modes = self
            .store
            .active_names(ComponentKind::Mode)?
            .into_iter()
            .collect();
        context.active_rules = self
            .store
            .active_names(ComponentKind::Rule)?
            .into_iter()
            .collect();
        Ok(context)
    }

    /// Produce ranked recommendations. `include_llm` is ignored when no
    /// LLM collaborator is configured.
    pub async fn recommend(
        &self,
        context: &SessionContext,
        include_llm: bool,
    ) -> Result<Prediction> {
        Ok(self.learner.predict(context, include_llm).await?)
    }

    /// Enact eligible recommendations and persist an audit row for every
    /// considered one.
    ///
    /// The gate re-checks every condition rather than trusting the flags on
    /// the input: agents only, non-LLM sources only, confidence at or above
    /// the threshold. Failure on one recommendation never aborts the rest.
    pub async fn auto_activate(
        &self,
        context: &SessionContext,
        recommendations: &[Recommendation],
    ) -> Result<AutoActivationReport> {
        let threshold = self.settings.recommend.auto_activate_threshold;
        let context_hash = context.context_hash();
        let mut report = AutoActivationReport::default();

        for rec in recommendations {
            let recommendation_id = match self
                .ratings
                .record_recommendation(NewRecommendation {
                    context_hash: context_hash.clone(),
                    skill_name: rec.name.clone(),
                    confidence: rec.confidence,
                    reason: rec.reason.clone(),
                    source: rec.source.to_string(),
                    auto_activate: rec.auto_activate,
                })
                .await
            {
                Ok(id) => Some(id),
                Err(err) => {
                    tracing::warn!(name = %rec.name, error = %err, "failed to persist recommendation");
                    None
                }
            };

            let eligible = rec.kind == RecommendationKind::Agent
                && rec.source != RecommendationSource::Llm
                && rec.auto_activate
                && rec.confidence >= threshold;
            let mut outcome = AutoActivationOutcome {
                name: rec.name.clone(),
                kind: rec.kind,
                confidence: rec.confidence,
                recommendation_id: recommendation_id.clone(),
                applied: false,
                detail: String::new(),
            };

            if !eligible {
                outcome.detail = if rec.kind != RecommendationKind::Agent {
                    "skills are never auto-activated".to_string()
                } else if rec.source == RecommendationSource::Llm {
                    "LLM recommendations are never auto-activated".to_string()
                } else if rec.confidence < threshold {
                    format!("confidence {:.2} below threshold {threshold:.2}", rec.confidence)
                } else {
                    "not flagged for auto-activation".to_string()
                };
                self.set_unapplied(&recommendation_id).await;
                report.outcomes.push(outcome);
                continue;
            }

            match self.activate(ComponentKind::Agent, &rec.name) {
                Ok(activation) if activation.is_clean() => {
                    outcome.applied = true;
                    outcome.detail = if activation.activated.is_empty() {
                        "already active".to_string()
                    } else {
                        format!("activated {}", activation.activated.join(", "))
                    };
                    if let Some(id) = &recommendation_id {
                        if let Err(err) = self.ratings.mark_applied(id).await {
                            tracing::warn!(id = %id, error = %err, "failed to mark recommendation applied");
                        }
                    }
                }
                Ok(activation) => {
                    outcome.detail = activation
                        .errors
                        .first()
                        .map(|e| format!("activation failed at '{}': {}", e.name, e.message))
                        .unwrap_or_else(|| "activation failed".to_string());
                    self.set_unapplied(&recommendation_id).await;
                }
                Err(err) => {
                    outcome.detail = err.to_string();
                    self.set_unapplied(&recommendation_id).await;
                }
            }
            report.outcomes.push(outcome);
        }
        Ok(report)
    }

    async fn set_unapplied(&self, recommendation_id: &Option<String>) {
        if let Some(id) = recommendation_id {
            if let Err(err) = self.ratings.set_applied(id, false).await {
                tracing::warn!(id = %id, error = %err, "failed to mark recommendation unapplied");
            }
        }
    }

    /// Record a finished session into history (and embeddings, when a
    /// vectorizer is configured).
    pub async fn record_session_outcome(
        &self,
        context: &SessionContext,
        agents_used: &[String],
        duration: Duration,
        outcome: SessionOutcome,
    ) -> Result<SessionRecord> {
        Ok(self
            .learner
            .record_success(context, agents_used, duration, outcome)
            .await?)
    }

    /// Record that the user accepted a surfaced recommendation. Front-ends
    /// call this when a suggestion is taken manually rather than through
    /// auto-activation.
    pub async fn mark_recommendation_accepted(&self, id: &str) -> Result<()> {
        Ok(self.ratings.mark_accepted(id).await?)
    }

    // ---- ratings ----------------------------------------------------------

    /// Submit (or replace) this user's rating of a skill and return the
    /// recomputed metrics.
    #[allow(clippy::too_many_arguments)]
    pub async fn rate_skill(
        &self,
        skill_name: &str,
        stars: u8,
        was_helpful: bool,
        task_succeeded: bool,
        review: Option<String>,
        project_type: Option<String>,
    ) -> Result<SkillQualityMetrics> {
        Ok(self
            .ratings
            .record_rating(ctx_ratings::RatingSubmission {
                skill_name: skill_name.to_string(),
                user_hash: self.user_hash.clone(),
                stars,
                project_type,
                review,
                was_helpful,
                task_succeeded,
            })
            .await?)
    }

    /// A skill's metrics with its ten most recent reviews.
    pub async fn skill_ratings(&self, skill_name: &str) -> Result<SkillRatingsView> {
        let metrics = self.ratings.get_metrics(skill_name).await?;
        let recent_reviews = self.ratings.recent_reviews(skill_name, 10).await?;
        Ok(SkillRatingsView {
            metrics,
            recent_reviews,
        })
    }

    /// Leaderboard of skills by average rating.
    pub async fn skill_top_rated(
        &self,
        limit: i64,
        min_ratings: i64,
    ) -> Result<Vec<SkillQualityMetrics>> {
        Ok(self.ratings.top_rated(limit, min_ratings).await?)
    }

    /// Export ratings and metrics as JSON or CSV bytes.
    pub async fn skill_export(
        &self,
        format: ExportFormat,
        skill_name: Option<&str>,
    ) -> Result<Vec<u8>> {
        Ok(self.ratings.export(format, skill_name).await?)
    }

    // ---- profiles ---------------------------------------------------------

    /// Capture the current active set.
    pub fn profile_snapshot(&self) -> Result<Profile> {
        Ok(self.store.profile_snapshot()?)
    }

    /// Apply a profile, reporting the applied/failed/skipped steps.
    pub fn profile_apply(&self, profile: &Profile) -> Result<ProfileDiff> {
        Ok(self.store.profile_apply(profile)?)
    }

    /// Save the given profile under a name.
    pub fn profile_save(&self, name: &str, profile: &Profile) -> Result<()> {
        self.store.profile_save(name, profile)?;
        Ok(())
    }

    /// Load a saved profile.
    pub fn profile_load(&self, name: &str) -> Result<Profile> {
        Ok(self.store.profile_load(name)?)
    }

    /// Names of saved profiles.
    pub fn profile_list(&self) -> Result<Vec<String>> {
        Ok(self.store.profile_list()?)
    }

    /// Active component names for a kind, for status displays.
    pub fn active_names(&self, kind: ComponentKind) -> Result<BTreeSet<String>> {
        Ok(self.store.active_names(kind)?)
    }
}
