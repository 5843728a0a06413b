//! Typed frontmatter for skill definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{CoreError, Result};
use crate::version::VersionSpec;

/// Maximum accepted description length.
const MAX_DESCRIPTION_LEN: usize = 1024;

/// Skill frontmatter, from `skills/<name>/SKILL.md`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillSpec {
    /// Unique hyphen-case skill name.
    pub name: String,

    /// Discovery description; must state when to reach for the skill.
    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(
        default,
        rename = "schema-version",
        alias = "schema_version",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<u32>,

    /// Versioned references to other skills, as `name` or `name@<spec>`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl SkillSpec {
    /// Validate the naming and description contract.
    ///
    /// Returns the reason a skill should be listed as broken, or `None` when
    /// the spec is well-formed.
    pub fn validation_error(&self) -> Option<String> {
        if self.name.is_empty() {
            return Some("missing name".to_string());
        }
        if !self
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Some(format!("name '{}' is not hyphen-case", self.name));
        }
        if self.description.len() >= MAX_DESCRIPTION_LEN {
            return Some(format!(
                "description is {} chars (limit {})",
                self.description.len(),
                MAX_DESCRIPTION_LEN
            ));
        }
        if !self.description.contains("Use when") {
            return Some("description must contain \"Use when\"".to_string());
        }
        None
    }

    /// Parse the `depends_on` references into structured form.
    pub fn dependencies(&self) -> Result<Vec<SkillDependencyRef>> {
        self.depends_on
            .iter()
            .map(|raw| SkillDependencyRef::parse(raw))
            .collect()
    }
}

/// One parsed `depends_on` entry: a skill name plus a version constraint.
///
/// A bare `name` means `latest`.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillDependencyRef {
    pub name: String,
    pub spec: VersionSpec,
}

impl SkillDependencyRef {
    /// Parse `name` or `name@<version spec>`.
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        match raw.split_once('@') {
            Some((name, spec)) if !name.is_empty() => Ok(Self {
                name: name.trim().to_string(),
                spec: spec.trim().parse()?,
            }),
            Some(_) => Err(CoreError::VersionSpec {
                spec: raw.to_string(),
                reason: "missing skill name before '@'".to_string(),
            }),
            None if raw.is_empty() => Err(CoreError::VersionSpec {
                spec: raw.to_string(),
                reason: "empty dependency reference".to_string(),
            }),
            None => Ok(Self {
                name: raw.to_string(),
                spec: VersionSpec::Latest,
            }),
        }
    }
}

impl std::fmt::Display for SkillDependencyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.spec)
    }
}
