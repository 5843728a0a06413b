//! Typed frontmatter for modes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mode frontmatter. The behavioral guidance lives in the markdown body.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModeSpec {
    pub name: String,

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
    use crate::frontmatter;

    #[test]
    fn mode_parses() {
        let doc = "---\nname: deep-focus\ndescription: Minimal tool chatter\n---\nPrefer Read over Bash.";
        let (spec, body): (ModeSpec, String) = frontmatter::parse_document(doc).unwrap();
        assert_eq!(spec.name, "deep-focus");
        assert!(body.contains("Prefer Read"));
    }
}
