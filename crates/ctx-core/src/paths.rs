//! Workspace root resolution and on-disk layout.
//!
//! All claude-ctx state lives under a single workspace root:
//!
//! ```text
//! <root>/
//! ├── agents/                 # active agents
//! ├── inactive/
//! │   ├── agents/             # disabled agents
//! │   └── modes/              # disabled modes
//! ├── skills/<name>/SKILL.md
//! ├── modes/                  # active modes
//! ├── rules/                  # active rules
//! │   └── disabled/           # disabled rules (rules-disabled/ accepted on read)
//! ├── profiles/               # saved profiles (TOML)
//! ├── workflows/              # inventoried only
//! ├── data/
//! │   ├── session_history.jsonl
//! │   ├── embeddings.jsonl
//! │   └── skill_ratings.sqlite
//! └── .active-rules           # manifest derived from rules/
//! ```
//!
//! The root is resolved with precedence `CLAUDE_CTX_HOME` >
//! `CLAUDE_PLUGIN_ROOT` > `~/.claude-ctx`.

use std::path::{Path, PathBuf};

use crate::component::ComponentKind;
use crate::errors::{CoreError, Result};

/// Environment variable overriding the workspace root (highest precedence).
pub const ENV_CTX_HOME: &str = "CLAUDE_CTX_HOME";

/// Alternate root used when claude-ctx runs as an editor plugin.
pub const ENV_PLUGIN_ROOT: &str = "CLAUDE_PLUGIN_ROOT";

/// Seeds the anonymous user hash when set.
pub const ENV_USER_ID: &str = "CLAUDE_CTX_USER_ID";

/// Resolved workspace layout. Cheap to clone; holds only the root path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtxPaths {
    root: PathBuf,
}

impl CtxPaths {
    /// Resolve the workspace root from the environment.
    pub fn resolve() -> Result<Self> {
        if let Ok(home) = std::env::var(ENV_CTX_HOME) {
            if !home.is_empty() {
                return Ok(Self::with_root(home));
            }
        }
        if let Ok(root) = std::env::var(ENV_PLUGIN_ROOT) {
            if !root.is_empty() {
                return Ok(Self::with_root(root));
            }
        }
        let home = dirs::home_dir().ok_or(CoreError::NoHomeDir)?;
        Ok(Self::with_root(home.join(".claude-ctx")))
    }

    /// Use an explicit root, bypassing environment resolution.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding active definitions of `kind`.
    ///
    /// Skills have no active/inactive split; their directory is returned
    /// as-is.
    pub fn active_dir(&self, kind: ComponentKind) -> PathBuf {
        match kind {
            ComponentKind::Agent => self.root.join("agents"),
            ComponentKind::Skill => self.root.join("skills"),
            ComponentKind::Mode => self.root.join("modes"),
            ComponentKind::Rule => self.root.join("rules"),
        }
    }

    /// Primary directory holding disabled definitions of `kind`.
    pub fn inactive_dir(&self, kind: ComponentKind) -> PathBuf {
        match kind {
            ComponentKind::Agent => self.root.join("inactive").join("agents"),
            ComponentKind::Skill => self.root.join("skills"),
            ComponentKind::Mode => self.root.join("inactive").join("modes"),
            ComponentKind::Rule => self.root.join("rules").join("disabled"),
        }
    }

    /// Legacy location for disabled rules, accepted on read only.
    pub fn legacy_disabled_rules_dir(&self) -> PathBuf {
        self.root.join("rules-disabled")
    }

    /// Saved profiles directory.
    pub fn profiles_dir(&self) -> PathBuf {
        self.root.join("profiles")
    }

    /// Workflow inventory directory.
    pub fn workflows_dir(&self) -> PathBuf {
        self.root.join("workflows")
    }

    /// Data directory for history, embeddings, and the ratings database.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }

    /// Append-only session history.
    pub fn history_file(&self) -> PathBuf {
        self.data_dir().join("session_history.jsonl")
    }

    /// Optional session embeddings store.
    pub fn embeddings_file(&self) -> PathBuf {
        self.data_dir().join("embeddings.jsonl")
    }

    /// SQLite database for ratings, recommendations, and quality metrics.
    pub fn ratings_db(&self) -> PathBuf {
        self.data_dir().join("skill_ratings.sqlite")
    }

    /// Manifest listing active rules by name, regenerated after mutations.
    pub fn active_rules_manifest(&self) -> PathBuf {
        self.root.join(".active-rules")
    }

    /// Optional settings file.
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Advisory lock file guarding component-tree mutations.
    pub fn lock_file(&self) -> PathBuf {
        self.root.join(".ctx-lock")
    }

    /// Create the directory skeleton if missing.
    pub fn ensure_layout(&self) -> Result<()> {
        for dir in [
            self.active_dir(ComponentKind::Agent),
            self.inactive_dir(ComponentKind::Agent),
            self.active_dir(ComponentKind::Skill),
            self.active_dir(ComponentKind::Mode),
            self.inactive_dir(ComponentKind::Mode),
            self.active_dir(ComponentKind::Rule),
            self.inactive_dir(ComponentKind::Rule),
            self.profiles_dir(),
            self.workflows_dir(),
            self.data_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn env_override_wins() {
        std::env::set_var(ENV_CTX_HOME, "/tmp/ctx-home");
        std::env::set_var(ENV_PLUGIN_ROOT, "/tmp/plugin-root");
        let paths = CtxPaths::resolve().unwrap();
        assert_eq!(paths.root(), Path::new("/tmp/ctx-home"));
        std::env::remove_var(ENV_CTX_HOME);

        let paths = CtxPaths::resolve().unwrap();
        assert_eq!(paths.root(), Path::new("/tmp/plugin-root"));
        std::env::remove_var(ENV_PLUGIN_ROOT);
    }

    #[test]
    #[serial]
    fn default_root_is_under_home() {
        std::env::remove_var(ENV_CTX_HOME);
        std::env::remove_var(ENV_PLUGIN_ROOT);
        let paths = CtxPaths::resolve().unwrap();
        assert!(paths.root().ends_with(".claude-ctx"));
    }

    #[test]
    fn layout_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = CtxPaths::with_root(tmp.path());
        paths.ensure_layout().unwrap();
        assert!(tmp.path().join("agents").is_dir());
        assert!(tmp.path().join("inactive/agents").is_dir());
        assert!(tmp.path().join("rules/disabled").is_dir());
        assert!(tmp.path().join("data").is_dir());
    }
}
