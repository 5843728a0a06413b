//! Progressive disclosure of skill content.
//!
//! Skills are loaded in three tiers so callers only pay for what they use:
//! tier 1 is the frontmatter metadata, tier 2 the instruction body, tier 3
//! the resource listing. [`SkillReader`] re-reads the file per call; tiers 2
//! and 3 are never cached across operations.

use std::path::{Path, PathBuf};

use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

use crate::component::SkillSpec;
use crate::errors::{CoreError, Result};
use crate::frontmatter;

/// Tier 1: cheap discovery metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    pub version: Option<String>,
    pub depends_on: Vec<String>,
}

/// Tier 3: one resource referenced from the skill body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillResource {
    /// Display label, from the link text or list item.
    pub label: String,
    /// Link target or bare path.
    pub target: String,
}

/// Lazy three-tier reader over a `SKILL.md` file.
#[derive(Debug, Clone)]
pub struct SkillReader {
    path: PathBuf,
}

impl SkillReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<(SkillSpec, String)> {
        let content = std::fs::read_to_string(&self.path)?;
        frontmatter::parse_document(&content).map_err(|err| CoreError::Frontmatter {
            path: self.path.clone(),
            reason: err.to_string(),
        })
    }

    /// Tier 1: frontmatter metadata only.
    pub fn metadata(&self) -> Result<SkillMetadata> {
        let (spec, _) = self.load()?;
        Ok(SkillMetadata {
            name: spec.name,
            description: spec.description,
            version: spec.version,
            depends_on: spec.depends_on,
        })
    }

    /// Tier 2: the instruction body, with the resources section removed.
    pub fn instructions(&self) -> Result<String> {
        let (_, body) = self.load()?;
        Ok(strip_resources_section(&body))
    }

    /// Tier 3: resources listed under a `## Resources` heading.
    pub fn resources(&self) -> Result<Vec<SkillResource>> {
        let (_, body) = self.load()?;
        Ok(extract_resources(&body))
    }
}

/// Remove the resources section from a skill body.
fn strip_resources_section(body: &str) -> String {
    let mut out = Vec::new();
    let mut in_resources = false;
    let mut section_level = 0usize;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            let level = trimmed.chars().take_while(|c| *c == '#').count();
            let heading = trimmed.trim_start_matches('#').trim();
            if heading.eq_ignore_ascii_case("resources") {
                in_resources = true;
                section_level = level;
                continue;
            }
            if in_resources && level <= section_level {
                in_resources = false;
            }
        }
        if !in_resources {
            out.push(line);
        }
    }
    let mut text = out.join("\n");
    while text.ends_with("\n\n") {
        text.pop();
    }
    text
}

/// Pull `[label](target)` links and bare list items from the resources
/// section.
fn extract_resources(body: &str) -> Vec<SkillResource> {
    let section = match resources_section(body) {
        Some(section) => section,
        None => return Vec::new(),
    };

    let mut resources = Vec::new();
    let mut link_target: Option<String> = None;
    let mut link_label = String::new();
    let mut item_text = String::new();
    let mut in_item = false;

    for event in Parser::new(&section) {
        match event {
            Event::Start(Tag::Item) => {
                in_item = true;
                item_text.clear();
            }
            Event::End(TagEnd::Item) => {
                in_item = false;
                let text = item_text.trim();
                if link_target.is_none() && !text.is_empty() {
                    resources.push(SkillResource {
                        label: text.to_string(),
                        target: text.to_string(),
                    });
                }
                link_target = None;
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                link_target = Some(dest_url.to_string());
                link_label.clear();
            }
            Event::End(TagEnd::Link) => {
                if let Some(target) = link_target.clone() {
                    let label = if link_label.trim().is_empty() {
                        target.clone()
                    } else {
                        link_label.trim().to_string()
                    };
                    resources.push(SkillResource { label, target });
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if link_target.is_some() {
                    link_label.push_str(&text);
                } else if in_item {
                    item_text.push_str(&text);
                }
            }
            _ => {}
        }
    }
    resources
}

fn resources_section(body: &str) -> Option<String> {
    let mut lines = Vec::new();
    let mut in_resources = false;
    let mut section_level = 0usize;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            let level = trimmed.chars().take_while(|c| *c == '#').count();
            let heading = trimmed.trim_start_matches('#').trim();
            if heading.eq_ignore_ascii_case("resources") {
                in_resources = true;
                section_level = level;
                continue;
            }
            if in_resources && level <= section_level {
                break;
            }
        }
        if in_resources {
            lines.push(line);
        }
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SKILL: &str = r#"---
name: owasp-top-10
description: Security checklist. Use when reviewing handlers.
version: 1.0.0
---

# OWASP Top 10

## Quick Reference

Check input validation first.

## Resources

- [Cheat sheet](https://owasp.org/cheatsheet)
- checklists/full-audit.md

## Deep Dive

Injection classes in detail.
"#;

    fn reader() -> (tempfile::TempDir, SkillReader) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("SKILL.md");
        std::fs::write(&path, SKILL).unwrap();
        (tmp, SkillReader::new(path))
    }

    #[test]
    fn metadata_is_tier_one() {
        let (_tmp, reader) = reader();
        let meta = reader.metadata().unwrap();
        assert_eq!(meta.name, "owasp-top-10");
        assert_eq!(meta.version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn instructions_skip_resources() {
        let (_tmp, reader) = reader();
        let text = reader.instructions().unwrap();
        assert!(text.contains("Quick Reference"));
        assert!(text.contains("Deep Dive"));
        assert!(!text.contains("cheatsheet"));
    }

    #[test]
    fn resources_capture_links_and_paths() {
        let (_tmp, reader) = reader();
        let resources = reader.resources().unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].label, "Cheat sheet");
        assert_eq!(resources[0].target, "https://owasp.org/cheatsheet");
        assert_eq!(resources[1].target, "checklists/full-audit.md");
    }

    #[test]
    fn missing_resources_section_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("SKILL.md");
        std::fs::write(&path, "---\nname: a\ndescription: Use when x.\n---\n# A\nbody").unwrap();
        let reader = SkillReader::new(path);
        assert!(reader.resources().unwrap().is_empty());
    }
}
