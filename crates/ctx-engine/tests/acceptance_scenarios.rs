//! End-to-end acceptance scenarios.
//!
//! Each test builds a throwaway workspace, seeds component definitions, and
//! drives the engine the way the CLI would:
//!
//! - **S1**: activating an agent pulls in its `requires` closure but not
//!   its `recommends`
//! - **S2**: a dependency cycle refuses activation and leaves the
//!   filesystem untouched
//! - **S3**: deactivation is blocked while a dependent is active
//! - **S4**: re-rating a skill replaces the previous rating and recomputes
//!   metrics
//! - **S5**: auto-activation applies only high-confidence agent
//!   recommendations
//! - **S6**: with no history and no collaborators, recommendations come
//!   from the rule table alone

use std::fs;
use std::path::Path;
use std::time::Duration;

use ctx_core::{ComponentKind, CtxPaths, ErrorCategory};
use ctx_engine::ContextEngine;
use ctx_intel::{
    Recommendation, RecommendationKind, RecommendationSource, SessionContext, SessionOutcome,
};

fn write_agent(root: &Path, dir: &str, name: &str, requires: &[&str], recommends: &[&str]) {
    let mut frontmatter = format!("---\nname: {name}\nsummary: {name} agent\n");
    if !requires.is_empty() || !recommends.is_empty() {
        frontmatter.push_str("dependencies:\n");
        if !requires.is_empty() {
            frontmatter.push_str("  requires:\n");
            for dep in requires {
                frontmatter.push_str(&format!("    - {dep}\n"));
            }
        }
        if !recommends.is_empty() {
            frontmatter.push_str("  recommends:\n");
            for dep in recommends {
                frontmatter.push_str(&format!("    - {dep}\n"));
            }
        }
    }
    frontmatter.push_str("---\n\nbody\n");
    let dir = root.join(dir);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{name}.md")), frontmatter).unwrap();
}

async fn engine(root: &Path) -> ContextEngine {
    ContextEngine::builder(CtxPaths::with_root(root))
        .build()
        .await
        .expect("engine opens over a fresh workspace")
}

#[tokio::test]
async fn s1_activation_pulls_requires_but_not_recommends() {
    let tmp = tempfile::tempdir().unwrap();
    write_agent(tmp.path(), "agents", "python-pro", &[], &[]);
    write_agent(
        tmp.path(),
        "inactive/agents",
        "api-designer",
        &["python-pro"],
        &["security-auditor"],
    );
    write_agent(tmp.path(), "inactive/agents", "security-auditor", &[], &[]);

    let engine = engine(tmp.path()).await;
    let report = engine
        .activate(ComponentKind::Agent, "api-designer")
        .unwrap();

    assert_eq!(report.activated, vec!["api-designer"]);
    assert_eq!(report.already_active, vec!["python-pro"]);
    assert!(report.is_clean());

    let active = engine.active_names(ComponentKind::Agent).unwrap();
    assert!(active.contains("python-pro"));
    assert!(active.contains("api-designer"));
    assert!(
        !active.contains("security-auditor"),
        "recommends edges never activate"
    );
}

#[tokio::test]
async fn s2_cycle_refuses_activation_and_leaves_fs_unchanged() {
    let tmp = tempfile::tempdir().unwrap();
    write_agent(tmp.path(), "inactive/agents", "a", &["b"], &[]);
    write_agent(tmp.path(), "inactive/agents", "b", &["c"], &[]);
    write_agent(tmp.path(), "inactive/agents", "c", &["a"], &[]);

    let engine = engine(tmp.path()).await;
    let err = engine.activate(ComponentKind::Agent, "a").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Invariant);

    let report = err.report(None);
    assert!(report.message.contains("cycle"));

    // Nothing moved.
    for name in ["a", "b", "c"] {
        assert!(tmp.path().join(format!("inactive/agents/{name}.md")).is_file());
        assert!(!tmp.path().join(format!("agents/{name}.md")).exists());
    }
}

#[tokio::test]
async fn s3_deactivation_blocked_by_active_dependent() {
    let tmp = tempfile::tempdir().unwrap();
    write_agent(tmp.path(), "agents", "a", &["b"], &[]);
    write_agent(tmp.path(), "agents", "b", &[], &[]);

    let engine = engine(tmp.path()).await;
    let err = engine
        .deactivate(ComponentKind::Agent, "b", false)
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Invariant);
    assert!(err.to_string().contains('a'));

    // Active set unchanged.
    let active = engine.active_names(ComponentKind::Agent).unwrap();
    assert!(active.contains("a") && active.contains("b"));

    // Forcing works but warns about the stranded dependent.
    let report = engine.deactivate(ComponentKind::Agent, "b", true).unwrap();
    assert_eq!(report.deactivated, vec!["b"]);
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains('a'));
}

#[tokio::test]
async fn s4_rating_upsert_recomputes_metrics() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine(tmp.path()).await;

    engine
        .rate_skill("owasp-top-10", 4, true, true, None, None)
        .await
        .unwrap();
    let metrics = engine
        .rate_skill("owasp-top-10", 5, true, true, None, None)
        .await
        .unwrap();

    assert_eq!(metrics.total_ratings, 1, "same user replaces, not appends");
    assert_eq!(metrics.avg_rating, 5.0);
    assert_eq!(metrics.helpful_percentage, 100.0);
    assert_eq!(metrics.success_correlation_percentage, 100.0);

    let view = engine.skill_ratings("owasp-top-10").await.unwrap();
    assert_eq!(view.metrics.total_ratings, 1);
    assert_eq!(view.recent_reviews.len(), 1);
    assert_eq!(view.recent_reviews[0].stars, 5);
}

#[tokio::test]
async fn s5_auto_activation_gate() {
    let tmp = tempfile::tempdir().unwrap();
    write_agent(tmp.path(), "inactive/agents", "security-auditor", &[], &[]);
    write_agent(tmp.path(), "inactive/agents", "perf-agent", &[], &[]);

    let engine = engine(tmp.path()).await;
    let context = SessionContext::empty();
    let recs = vec![
        Recommendation {
            kind: RecommendationKind::Agent,
            name: "security-auditor".into(),
            confidence: 0.95,
            reason: "authentication code detected".into(),
            auto_activate: true,
            source: RecommendationSource::Rule,
        },
        Recommendation {
            kind: RecommendationKind::Skill,
            name: "api-docs-skill".into(),
            confidence: 0.99,
            reason: "docs everywhere".into(),
            auto_activate: true,
            source: RecommendationSource::Pattern,
        },
        Recommendation {
            kind: RecommendationKind::Agent,
            name: "perf-agent".into(),
            confidence: 0.70,
            reason: "might help".into(),
            auto_activate: false,
            source: RecommendationSource::Pattern,
        },
    ];

    let report = engine.auto_activate(&context, &recs).await.unwrap();
    assert_eq!(report.considered(), 3);
    assert_eq!(report.applied(), vec!["security-auditor"]);

    let active = engine.active_names(ComponentKind::Agent).unwrap();
    assert!(active.contains("security-auditor"));
    assert!(!active.contains("perf-agent"));

    let skill_outcome = &report.outcomes[1];
    assert!(!skill_outcome.applied);
    assert!(skill_outcome.detail.contains("never"));
}

#[tokio::test]
async fn s6_recommendations_from_rules_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine(tmp.path()).await;

    let mut context = SessionContext::empty();
    context.has_auth = true;

    let prediction = engine.recommend(&context, false).await.unwrap();
    let auditor = prediction
        .recommendations
        .iter()
        .find(|r| r.name == "security-auditor")
        .expect("rule table proposes the auditor");
    assert_eq!(auditor.source, RecommendationSource::Rule);
    assert_eq!(auditor.confidence, 0.95);
    assert!(auditor.auto_activate);

    assert!(prediction
        .recommendations
        .iter()
        .all(|r| r.source == RecommendationSource::Rule));
}

#[tokio::test]
async fn profile_snapshot_apply_round_trip_is_noop() {
    let tmp = tempfile::tempdir().unwrap();
    write_agent(tmp.path(), "agents", "a", &[], &[]);
    write_agent(tmp.path(), "inactive/agents", "b", &[], &[]);

    let engine = engine(tmp.path()).await;
    let snapshot = engine.profile_snapshot().unwrap();
    let diff = engine.profile_apply(&snapshot).unwrap();
    assert!(diff.is_noop());
}

#[tokio::test]
async fn activate_then_deactivate_restores_layout() {
    let tmp = tempfile::tempdir().unwrap();
    write_agent(tmp.path(), "inactive/agents", "solo", &[], &[]);

    let engine = engine(tmp.path()).await;
    engine.activate(ComponentKind::Agent, "solo").unwrap();
    engine.deactivate(ComponentKind::Agent, "solo", false).unwrap();

    assert!(tmp.path().join("inactive/agents/solo.md").is_file());
    assert!(!tmp.path().join("agents/solo.md").exists());
}

#[tokio::test]
async fn session_outcomes_shape_later_recommendations() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = engine(tmp.path()).await;

    let mut context = SessionContext::empty();
    context.has_database = true;
    for _ in 0..3 {
        engine
            .record_session_outcome(
                &context,
                &["database-optimizer".to_string(), "python-pro".to_string()],
                Duration::from_secs(120),
                SessionOutcome::Success,
            )
            .await
            .unwrap();
    }

    let prediction = engine.recommend(&context, false).await.unwrap();
    let python = prediction
        .recommendations
        .iter()
        .find(|r| r.name == "python-pro")
        .expect("pattern stream surfaces historically used agents");
    assert_eq!(python.source, RecommendationSource::Pattern);
}
