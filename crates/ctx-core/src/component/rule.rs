//! Typed frontmatter for rules.
//!
//! A rule's category comes from its filename prefix (`quality-no-unwrap.md`
//! is a `quality` rule), not from the frontmatter, so files dropped into the
//! rules directory categorize themselves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Rule categories recognized from filename prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleCategory {
    Workflow,
    Quality,
    Execution,
    Efficiency,
    #[default]
    General,
}

impl RuleCategory {
    /// Derive the category from a rule's file stem.
    pub fn from_file_stem(stem: &str) -> Self {
        match stem.split('-').next() {
            Some("workflow") => RuleCategory::Workflow,
            Some("quality") => RuleCategory::Quality,
            Some("execution") => RuleCategory::Execution,
            Some("efficiency") => RuleCategory::Efficiency,
            _ => RuleCategory::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RuleCategory::Workflow => "workflow",
            RuleCategory::Quality => "quality",
            RuleCategory::Execution => "execution",
            RuleCategory::Efficiency => "efficiency",
            RuleCategory::General => "general",
        }
    }
}

impl std::fmt::Display for RuleCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule frontmatter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleSpec {
    /// Rule name; filled from the file stem when the frontmatter omits it.
    #[serde(default)]
    pub name: String,

    /// Category derived from the filename, not persisted in frontmatter.
    #[serde(skip)]
    pub category: RuleCategory,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(
        default,
        rename = "schema-version",
        alias = "schema_version",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema_version: Option<u32>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_comes_from_stem_prefix() {
        assert_eq!(
            RuleCategory::from_file_stem("quality-no-unwrap"),
            RuleCategory::Quality
        );
        assert_eq!(
            RuleCategory::from_file_stem("efficiency-batch-reads"),
            RuleCategory::Efficiency
        );
        assert_eq!(
            RuleCategory::from_file_stem("naming-things"),
            RuleCategory::General
        );
    }
}
