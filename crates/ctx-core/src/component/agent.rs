//! Typed frontmatter for agent definitions.
//!
//! Agents are the richest component kind: they carry a tier, model routing
//! preferences, a tool catalog, activation hints, dependencies on other
//! agents, linked skills, and a default workflow. Everything except `name`
//! is optional so sparse hand-written definitions still load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Agent frontmatter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Unique agent name, matching the file stem.
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// One-line summary shown in listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Declared frontmatter schema version. Unknown versions load as broken.
    #[serde(
        default,
        rename = "schema-version",
        alias = "schema_version",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<TierSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<ActivationSpec>,

    #[serde(default)]
    pub dependencies: DependenciesSpec,

    /// Skills this agent composes, as `name` or `name@<version spec>` refs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workflows: Option<WorkflowsSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<MetricsSpec>,

    /// Unknown keys, preserved for round-tripping.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// Tier placement and activation strategy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TierSpec {
    #[serde(default)]
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_strategy: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,
}

/// Model routing preferences.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preference: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub escalation: Option<String>,
}

/// Tool catalog and per-tier groupings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolsSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub catalog: Vec<String>,

    #[serde(default)]
    pub tiers: ToolTiers,
}

/// Tools grouped by escalation tier.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ToolTiers {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub core: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enhanced: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specialist: Vec<String>,
}

/// Activation hints consumed by the recommendation pipeline.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivationSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,

    /// Whether this agent may be auto-activated at all.
    #[serde(default)]
    pub auto: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
}

/// Hard and soft dependencies on other agents.
///
/// `requires` edges participate in the activation closure and block
/// deactivation; `recommends` edges are surfaced but never enforced.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DependenciesSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recommends: Vec<String>,
}

/// Default workflow and its phases.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkflowsSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phases: Vec<PhaseSpec>,
}

/// One named phase of a workflow.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub responsibilities: Vec<String>,
}

/// Metric names the agent wants tracked.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tracked: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter;

    const API_DESIGNER: &str = r#"---
name: api-designer
version: 1.2.0
summary: Designs REST and RPC interfaces
category: architecture
tier:
  id: core
  activation_strategy: keyword
  conditions:
    - has_api
model:
  preference: large
  fallbacks:
    - medium
activation:
  keywords:
    - api
    - endpoint
  auto: true
  priority: 10
dependencies:
  requires:
    - python-pro
  recommends:
    - security-auditor
skills:
  - openapi-authoring@^1.0.0
workflows:
  default: design-first
  phases:
    - name: survey
      responsibilities:
        - inventory existing routes
    - name: design
      responsibilities:
        - draft resource model
custom-note: kept verbatim
---

# API Designer

Body text.
"#;

    #[test]
    fn full_agent_parses() {
        let (spec, body): (AgentSpec, String) =
            frontmatter::parse_document(API_DESIGNER).unwrap();
        assert_eq!(spec.name, "api-designer");
        assert_eq!(spec.dependencies.requires, vec!["python-pro"]);
        assert_eq!(spec.dependencies.recommends, vec!["security-auditor"]);
        assert_eq!(spec.skills, vec!["openapi-authoring@^1.0.0"]);
        let activation = spec.activation.as_ref().unwrap();
        assert!(activation.auto);
        assert_eq!(activation.priority, Some(10));
        assert_eq!(spec.workflows.as_ref().unwrap().phases.len(), 2);
        assert!(spec.extra.contains_key("custom-note"));
        assert!(body.starts_with("# API Designer"));
    }

    #[test]
    fn reparse_after_render_is_equal() {
        let (spec, body): (AgentSpec, String) =
            frontmatter::parse_document(API_DESIGNER).unwrap();
        let rendered = frontmatter::render(&spec, &body).unwrap();
        let (again, _): (AgentSpec, String) = frontmatter::parse_document(&rendered).unwrap();
        assert_eq!(spec, again);
    }

    #[test]
    fn minimal_agent_parses() {
        let (spec, _): (AgentSpec, String) =
            frontmatter::parse_document("---\nname: tiny\n---\nbody").unwrap();
        assert_eq!(spec.name, "tiny");
        assert!(spec.dependencies.requires.is_empty());
        assert!(spec.tier.is_none());
    }
}
