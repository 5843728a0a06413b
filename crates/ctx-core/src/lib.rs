//! Component store and dependency resolver for claude-ctx.
//!
//! This crate owns the on-disk catalog of context components (agents,
//! skills, modes, rules) and the pure algorithms over it:
//!
//! - **Store**: filesystem repository with atomic activate/deactivate moves,
//!   profile snapshots, and a derived `.active-rules` manifest
//! - **Resolver**: the agent dependency graph (cycle detection, activation
//!   closures, deactivation safety) and skill version resolution
//! - **Component model**: typed frontmatter per kind, with unknown keys
//!   preserved for round-tripping
//!
//! Higher layers (`ctx-intel`, `ctx-engine`) build recommendation and
//! orchestration logic on top; nothing here suspends or talks to a network.
//!
//! # Quick start
//!
//! ```no_run
//! use ctx_core::{CtxPaths, Store, ComponentKind};
//!
//! # fn run() -> ctx_core::Result<()> {
//! let store = Store::open(CtxPaths::resolve()?)?;
//! for info in store.list(ComponentKind::Agent)? {
//!     println!("{} ({:?})", info.name, info.state);
//! }
//! # Ok(())
//! # }
//! ```

pub mod component;
pub mod errors;
pub mod frontmatter;
pub mod paths;
pub mod profile;
pub mod resolver;
pub mod settings;
pub mod skill_body;
pub mod store;
pub mod version;

pub use component::{
    AgentSpec, Component, ComponentInfo, ComponentKind, ComponentSpec, ComponentState, ModeSpec,
    RuleCategory, RuleSpec, SkillDependencyRef, SkillSpec,
};
pub use errors::{CoreError, ErrorCategory, Result};
pub use paths::{CtxPaths, ENV_CTX_HOME, ENV_PLUGIN_ROOT, ENV_USER_ID};
pub use profile::{Profile, ProfileAction, ProfileDiff, ProfileStep};
pub use resolver::{resolve_skill_dependency, DependencyGraph, PlanStep};
pub use settings::Settings;
pub use skill_body::{SkillMetadata, SkillReader, SkillResource};
pub use store::{Store, WorkflowInfo};
pub use version::VersionSpec;
