//! The heuristic rule table.
//!
//! Rules are data, not code paths: each entry pairs a predicate over the
//! session context with an agent name, a fixed confidence, and a reason.
//! The table can therefore be tested row by row and swapped wholesale.

use crate::context::SessionContext;
use crate::recommend::{Recommendation, RecommendationKind, RecommendationSource};

/// One row of the rule table.
pub struct HeuristicRule {
    /// Agent the rule proposes.
    pub agent: &'static str,
    /// Fixed confidence assigned when the rule fires.
    pub confidence: f64,
    /// Human-readable justification.
    pub reason: &'static str,
    /// Predicate deciding whether the rule fires.
    pub applies: fn(&SessionContext) -> bool,
}

/// The default rule table. No rule fires on an empty context.
pub const DEFAULT_RULES: &[HeuristicRule] = &[
    HeuristicRule {
        agent: "security-auditor",
        confidence: 0.95,
        reason: "authentication code detected",
        applies: |ctx| ctx.has_auth,
    },
    HeuristicRule {
        agent: "test-automator",
        confidence: 0.90,
        reason: "failing tests in the workspace",
        applies: |ctx| ctx.test_failures > 0,
    },
    HeuristicRule {
        agent: "debugger",
        confidence: 0.85,
        reason: "build failures in the workspace",
        applies: |ctx| ctx.build_failures > 0,
    },
    HeuristicRule {
        agent: "api-designer",
        confidence: 0.80,
        reason: "API surface detected",
        applies: |ctx| ctx.has_api,
    },
    HeuristicRule {
        agent: "database-optimizer",
        confidence: 0.80,
        reason: "database artifacts detected",
        applies: |ctx| ctx.has_database,
    },
    HeuristicRule {
        agent: "frontend-developer",
        confidence: 0.75,
        reason: "frontend sources detected",
        applies: |ctx| ctx.has_frontend,
    },
    HeuristicRule {
        agent: "backend-architect",
        confidence: 0.75,
        reason: "backend services detected",
        applies: |ctx| ctx.has_backend,
    },
];

/// Evaluate a rule table against a context.
pub fn evaluate(rules: &[HeuristicRule], ctx: &SessionContext) -> Vec<Recommendation> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(ctx))
        .map(|rule| Recommendation {
            kind: RecommendationKind::Agent,
            name: rule.agent.to_string(),
            confidence: rule.confidence,
            reason: rule.reason.to_string(),
            auto_activate: false,
            source: RecommendationSource::Rule,
        })
        .collect()
}
