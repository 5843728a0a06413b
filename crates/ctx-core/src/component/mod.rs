//! The component catalog: agents, skills, modes, and rules.
//!
//! All four kinds share the same on-disk shape (frontmatter + markdown body)
//! but carry different typed frontmatter. [`ComponentKind`] is the runtime
//! discriminator used across the store and orchestrator APIs.

mod agent;
mod mode;
mod rule;
mod skill;

pub use agent::{
    ActivationSpec, AgentSpec, DependenciesSpec, MetricsSpec, ModelSpec, PhaseSpec, TierSpec,
    ToolTiers, ToolsSpec, WorkflowsSpec,
};
pub use mode::ModeSpec;
pub use rule::{RuleCategory, RuleSpec};
pub use skill::{SkillDependencyRef, SkillSpec};

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Frontmatter schema version this build understands.
pub const KNOWN_SCHEMA_VERSION: u32 = 1;

/// The four component kinds managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Agent,
    Skill,
    Mode,
    Rule,
}

impl ComponentKind {
    /// All kinds, in listing order.
    pub const ALL: [ComponentKind; 4] = [
        ComponentKind::Agent,
        ComponentKind::Skill,
        ComponentKind::Mode,
        ComponentKind::Rule,
    ];

    /// Singular lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ComponentKind::Agent => "agent",
            ComponentKind::Skill => "skill",
            ComponentKind::Mode => "mode",
            ComponentKind::Rule => "rule",
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ComponentKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "agent" | "agents" => Ok(ComponentKind::Agent),
            "skill" | "skills" => Ok(ComponentKind::Skill),
            "mode" | "modes" => Ok(ComponentKind::Mode),
            "rule" | "rules" => Ok(ComponentKind::Rule),
            other => Err(CoreError::UnknownKind(other.to_string())),
        }
    }
}

/// Whether a definition file currently sits in the active or disabled tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentState {
    Active,
    Disabled,
}

/// Listing entry for a single component.
///
/// A component whose frontmatter failed to parse still appears in listings,
/// carrying the failure in `broken` so front-ends can surface it. Broken
/// components are never activated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentInfo {
    pub name: String,
    pub kind: ComponentKind,
    pub state: ComponentState,
    pub path: PathBuf,
    /// Last-modified timestamp of the definition file, when available.
    pub modified: Option<DateTime<Utc>>,
    /// Summary or description pulled from the frontmatter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parse failure reason, when the definition could not be loaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken: Option<String>,
}

impl ComponentInfo {
    /// True when the definition parsed cleanly.
    pub fn is_healthy(&self) -> bool {
        self.broken.is_none()
    }
}

/// Typed frontmatter for one component kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ComponentSpec {
    Agent(AgentSpec),
    Skill(SkillSpec),
    Mode(ModeSpec),
    Rule(RuleSpec),
}

impl ComponentSpec {
    /// The component's declared name.
    pub fn name(&self) -> &str {
        match self {
            ComponentSpec::Agent(spec) => &spec.name,
            ComponentSpec::Skill(spec) => &spec.name,
            ComponentSpec::Mode(spec) => &spec.name,
            ComponentSpec::Rule(spec) => &spec.name,
        }
    }

    /// The declared schema version, if any.
    pub fn schema_version(&self) -> Option<u32> {
        match self {
            ComponentSpec::Agent(spec) => spec.schema_version,
            ComponentSpec::Skill(spec) => spec.schema_version,
            ComponentSpec::Mode(spec) => spec.schema_version,
            ComponentSpec::Rule(spec) => spec.schema_version,
        }
    }
}

/// A fully loaded component: listing info, typed frontmatter, and body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub info: ComponentInfo,
    pub spec: ComponentSpec,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_parses_plural_and_singular() {
        assert_eq!("agents".parse::<ComponentKind>().unwrap(), ComponentKind::Agent);
        assert_eq!("rule".parse::<ComponentKind>().unwrap(), ComponentKind::Rule);
        assert!("widget".parse::<ComponentKind>().is_err());
    }

    #[test]
    fn kind_display_is_singular() {
        assert_eq!(ComponentKind::Skill.to_string(), "skill");
    }
}
