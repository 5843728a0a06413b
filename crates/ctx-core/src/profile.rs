//! Profiles: named snapshots of the active set.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::component::ComponentKind;

/// The active set across agents, modes, and rules.
///
/// Skills are not part of a profile; they compose through agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub agents: BTreeSet<String>,

    #[serde(default)]
    pub modes: BTreeSet<String>,

    #[serde(default)]
    pub rules: BTreeSet<String>,
}

impl Profile {
    /// The names captured for `kind`. Skills always map to an empty set.
    pub fn names(&self, kind: ComponentKind) -> &BTreeSet<String> {
        static EMPTY: std::sync::OnceLock<BTreeSet<String>> = std::sync::OnceLock::new();
        match kind {
            ComponentKind::Agent => &self.agents,
            ComponentKind::Mode => &self.modes,
            ComponentKind::Rule => &self.rules,
            ComponentKind::Skill => EMPTY.get_or_init(BTreeSet::new),
        }
    }

    /// Kinds a profile captures.
    pub const KINDS: [ComponentKind; 3] = [
        ComponentKind::Agent,
        ComponentKind::Mode,
        ComponentKind::Rule,
    ];
}

/// Whether a diff step turns a component on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileAction {
    Activate,
    Deactivate,
}

/// One step of a profile diff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileStep {
    pub kind: ComponentKind,
    pub name: String,
    pub action: ProfileAction,
}

/// Outcome of applying a profile.
///
/// Application stops at the first failing step; everything after it lands in
/// `skipped` so callers see exactly what state the workspace was left in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfileDiff {
    pub applied: Vec<ProfileStep>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<(ProfileStep, String)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<ProfileStep>,
}

impl ProfileDiff {
    /// True when the profile was already in effect.
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty() && self.failed.is_empty() && self.skipped.is_empty()
    }

    /// True when every step applied cleanly.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}
