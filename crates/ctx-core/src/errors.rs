use std::path::PathBuf;

use thiserror::Error;

use crate::component::ComponentKind;

/// Coarse error classification shared by every claude-ctx crate.
///
/// Categories map one-to-one onto CLI exit codes so front-ends can translate
/// any structured error without inspecting its variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A component, version, rating, or path does not exist.
    NotFound,
    /// Frontmatter, a version spec, or a persisted record failed to parse.
    Parse,
    /// A structural invariant would be violated (cycle, blocked deactivation).
    Invariant,
    /// Filesystem or database failure.
    Io,
    /// A sub-stream missed its deadline.
    Timeout,
    /// An optional collaborator was requested but is not configured.
    Unavailable,
}

impl ErrorCategory {
    /// Process exit code for the CLI front-end.
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorCategory::NotFound => 3,
            ErrorCategory::Parse => 2,
            ErrorCategory::Invariant => 4,
            ErrorCategory::Io | ErrorCategory::Timeout | ErrorCategory::Unavailable => 1,
        }
    }

    /// Short label used in user-facing output.
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::NotFound => "not found",
            ErrorCategory::Parse => "parse error",
            ErrorCategory::Invariant => "invariant violation",
            ErrorCategory::Io => "I/O error",
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::Unavailable => "unavailable",
        }
    }
}

/// Errors produced by the component store and dependency resolver.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{kind} '{name}' not found")]
    ComponentNotFound { kind: ComponentKind, name: String },

    #[error("{kind} '{name}' is already active")]
    AlreadyActive { kind: ComponentKind, name: String },

    #[error("{kind} '{name}' is already inactive")]
    AlreadyInactive { kind: ComponentKind, name: String },

    #[error("{kind} '{name}' is broken: {reason}")]
    Broken {
        kind: ComponentKind,
        name: String,
        reason: String,
    },

    #[error("unknown component kind '{0}'")]
    UnknownKind(String),

    #[error("frontmatter in {path}: {reason}")]
    Frontmatter { path: PathBuf, reason: String },

    #[error("dependency cycle: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("agent '{agent}' requires unknown agent '{requires}'")]
    MissingDependency { agent: String, requires: String },

    #[error("no version of '{name}' satisfies '{spec}' (available: {})",
        if available.is_empty() { "none".to_string() } else { available.join(", ") })]
    NoCompatibleVersion {
        name: String,
        spec: String,
        available: Vec<String>,
    },

    #[error("cannot deactivate '{name}': required by {}", blocked_by.join(", "))]
    DeactivationBlocked { name: String, blocked_by: Vec<String> },

    #[error("invalid version spec '{spec}': {reason}")]
    VersionSpec { spec: String, reason: String },

    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("could not determine home directory")]
    NoHomeDir,

    #[error("workspace path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Classify into the shared taxonomy.
    pub fn category(&self) -> ErrorCategory {
        match self {
            CoreError::ComponentNotFound { .. }
            | CoreError::ProfileNotFound(_)
            | CoreError::MissingDependency { .. }
            | CoreError::NoCompatibleVersion { .. }
            | CoreError::NotADirectory(_) => ErrorCategory::NotFound,
            CoreError::Frontmatter { .. } | CoreError::VersionSpec { .. } => ErrorCategory::Parse,
            CoreError::AlreadyActive { .. }
            | CoreError::AlreadyInactive { .. }
            | CoreError::Broken { .. }
            | CoreError::UnknownKind(_)
            | CoreError::CycleDetected { .. }
            | CoreError::DeactivationBlocked { .. } => ErrorCategory::Invariant,
            CoreError::NoHomeDir | CoreError::Io(_) => ErrorCategory::Io,
        }
    }

    /// A short remediation hint suitable for CLI output.
    pub fn hint(&self) -> Option<String> {
        match self {
            CoreError::ComponentNotFound { kind, .. } => Some(format!(
                "list known components with: claude-ctx list {kind}"
            )),
            CoreError::AlreadyActive { .. } | CoreError::AlreadyInactive { .. } => {
                Some("check current state with: claude-ctx list".to_string())
            }
            CoreError::CycleDetected { .. } => {
                Some("break the cycle by editing the agents' `requires` lists".to_string())
            }
            CoreError::DeactivationBlocked { .. } => {
                Some("deactivate the dependents first, or pass --force".to_string())
            }
            CoreError::Broken { .. } | CoreError::Frontmatter { .. } => {
                Some("fix the definition file's frontmatter block".to_string())
            }
            CoreError::NoCompatibleVersion { .. } => {
                Some("install a matching skill version or relax the spec".to_string())
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
