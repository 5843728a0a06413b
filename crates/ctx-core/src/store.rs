//! Filesystem-backed component repository.
//!
//! The store owns the workspace layout: it lists and loads definitions,
//! moves them between the active and disabled trees, and keeps the
//! `.active-rules` manifest in step with the rules directory. Activation is
//! always a whole-file (or, for skills, whole-directory) move staged through
//! a temporary name and finished with a rename; file contents are never
//! partially mutated.
//!
//! Mutations take an exclusive advisory lock on `<root>/.ctx-lock` so a CLI
//! and a long-running TUI sharing the workspace cannot interleave moves.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use semver::Version;

use crate::component::{
    AgentSpec, Component, ComponentInfo, ComponentKind, ComponentSpec, ComponentState, ModeSpec,
    RuleCategory, RuleSpec, SkillSpec, KNOWN_SCHEMA_VERSION,
};
use crate::errors::{CoreError, Result};
use crate::frontmatter;
use crate::paths::CtxPaths;
use crate::profile::{Profile, ProfileAction, ProfileDiff, ProfileStep};
use crate::skill_body::SkillReader;

/// Inventory entry for a workflow file. Workflows are launched by external
/// tooling; the store only catalogs them.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct WorkflowInfo {
    pub name: String,
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
}

/// Filesystem-backed repository of component definitions.
#[derive(Debug, Clone)]
pub struct Store {
    paths: CtxPaths,
}

/// Exclusive advisory lock over the component tree, released on drop.
struct WorkspaceLock {
    file: File,
}

impl Drop for WorkspaceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

impl Store {
    /// Open the store, creating the directory skeleton if needed.
    pub fn open(paths: CtxPaths) -> Result<Self> {
        paths.ensure_layout()?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &CtxPaths {
        &self.paths
    }

    fn lock(&self) -> Result<WorkspaceLock> {
        let file = File::create(self.paths.lock_file())?;
        file.lock_exclusive()?;
        Ok(WorkspaceLock { file })
    }

    // ---- listing ----------------------------------------------------------

    /// List every component of `kind`, active and disabled, sorted by name.
    ///
    /// Definitions that fail to parse still appear, carrying a broken
    /// reason; a single bad file never poisons the listing.
    pub fn list(&self, kind: ComponentKind) -> Result<Vec<ComponentInfo>> {
        let mut out: Vec<ComponentInfo> = Vec::new();
        match kind {
            ComponentKind::Skill => {
                self.scan_skill_dir(
                    &self.paths.active_dir(kind),
                    ComponentState::Active,
                    &mut out,
                )?;
                self.scan_skill_dir(
                    &self.paths.root().join("inactive").join("skills"),
                    ComponentState::Disabled,
                    &mut out,
                )?;
            }
            _ => {
                self.scan_md_dir(kind, &self.paths.active_dir(kind), ComponentState::Active, &mut out)?;
                self.scan_md_dir(
                    kind,
                    &self.paths.inactive_dir(kind),
                    ComponentState::Disabled,
                    &mut out,
                )?;
                if kind == ComponentKind::Rule {
                    self.scan_md_dir(
                        kind,
                        &self.paths.legacy_disabled_rules_dir(),
                        ComponentState::Disabled,
                        &mut out,
                    )?;
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        if kind == ComponentKind::Rule {
            self.sync_rules_manifest(&out)?;
        }
        Ok(out)
    }

    fn scan_md_dir(
        &self,
        kind: ComponentKind,
        dir: &Path,
        state: ComponentState,
        out: &mut Vec<ComponentInfo>,
    ) -> Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().map_or(true, |ext| ext != "md") {
                continue;
            }
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if !stem.starts_with('.') => stem.to_string(),
                _ => continue,
            };
            out.push(self.describe_md(kind, &name, &path, state));
        }
        Ok(())
    }

    fn scan_skill_dir(
        &self,
        dir: &Path,
        state: ComponentState,
        out: &mut Vec<ComponentInfo>,
    ) -> Result<()> {
        if !dir.is_dir() {
            return Ok(());
        }
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|s| s.to_str()) {
                Some(name) if !name.starts_with('.') => name.to_string(),
                _ => continue,
            };
            let skill_md = path.join("SKILL.md");
            if !skill_md.is_file() {
                out.push(ComponentInfo {
                    name,
                    kind: ComponentKind::Skill,
                    state,
                    path: path.clone(),
                    modified: modified_at(&path),
                    description: None,
                    broken: Some("missing SKILL.md".to_string()),
                });
                continue;
            }
            out.push(self.describe_skill(&name, &skill_md, state));
        }
        Ok(())
    }

    fn describe_md(
        &self,
        kind: ComponentKind,
        name: &str,
        path: &Path,
        state: ComponentState,
    ) -> ComponentInfo {
        let mut info = ComponentInfo {
            name: name.to_string(),
            kind,
            state,
            path: path.to_path_buf(),
            modified: modified_at(path),
            description: None,
            broken: None,
        };
        match self.parse_component(kind, name, path) {
            Ok((spec, _)) => {
                info.description = match &spec {
                    ComponentSpec::Agent(agent) => agent.summary.clone(),
                    ComponentSpec::Mode(mode) => mode.description.clone(),
                    ComponentSpec::Rule(rule) => rule
                        .description
                        .clone()
                        .or_else(|| rule.title.clone()),
                    ComponentSpec::Skill(skill) => Some(skill.description.clone()),
                };
            }
            Err(err) => info.broken = Some(err.to_string()),
        }
        info
    }

    fn describe_skill(&self, name: &str, skill_md: &Path, state: ComponentState) -> ComponentInfo {
        let mut info = ComponentInfo {
            name: name.to_string(),
            kind: ComponentKind::Skill,
            state,
            path: skill_md.to_path_buf(),
            modified: modified_at(skill_md),
            description: None,
            broken: None,
        };
        match self.parse_component(ComponentKind::Skill, name, skill_md) {
            Ok((ComponentSpec::Skill(spec), _)) => {
                info.description = Some(spec.description.clone());
                info.broken = spec.validation_error();
            }
            Ok(_) => unreachable!("skill parse returned non-skill spec"),
            Err(err) => info.broken = Some(err.to_string()),
        }
        info
    }

    fn parse_component(
        &self,
        kind: ComponentKind,
        name: &str,
        path: &Path,
    ) -> Result<(ComponentSpec, String)> {
        let content = fs::read_to_string(path)?;
        let fm_err = |reason: String| CoreError::Frontmatter {
            path: path.to_path_buf(),
            reason,
        };
        let (spec, body) = match kind {
            ComponentKind::Agent => {
                let (mut spec, body): (AgentSpec, String) =
                    frontmatter::parse_document(&content).map_err(|e| fm_err(e.to_string()))?;
                if spec.name.is_empty() {
                    spec.name = name.to_string();
                }
                (ComponentSpec::Agent(spec), body)
            }
            ComponentKind::Skill => {
                let (mut spec, body): (SkillSpec, String) =
                    frontmatter::parse_document(&content).map_err(|e| fm_err(e.to_string()))?;
                if spec.name.is_empty() {
                    spec.name = name.to_string();
                }
                (ComponentSpec::Skill(spec), body)
            }
            ComponentKind::Mode => {
                let (mut spec, body): (ModeSpec, String) =
                    frontmatter::parse_document(&content).map_err(|e| fm_err(e.to_string()))?;
                if spec.name.is_empty() {
                    spec.name = name.to_string();
                }
                (ComponentSpec::Mode(spec), body)
            }
            ComponentKind::Rule => {
                let (mut spec, body): (RuleSpec, String) =
                    frontmatter::parse_document(&content).map_err(|e| fm_err(e.to_string()))?;
                if spec.name.is_empty() {
                    spec.name = name.to_string();
                }
                spec.category = RuleCategory::from_file_stem(name);
                (ComponentSpec::Rule(spec), body)
            }
        };
        if let Some(version) = spec.schema_version() {
            if version != KNOWN_SCHEMA_VERSION {
                return Err(fm_err(format!(
                    "unknown schema version {version} (this build understands {KNOWN_SCHEMA_VERSION})"
                )));
            }
        }
        Ok((spec, body))
    }

    // ---- loading ----------------------------------------------------------

    /// Load one component with its full body.
    pub fn load(&self, kind: ComponentKind, name: &str) -> Result<Component> {
        let (path, state) = self.locate(kind, name)?;
        let (spec, body) = self.parse_component(kind, name, &path)?;
        if let ComponentSpec::Skill(skill) = &spec {
            if let Some(reason) = skill.validation_error() {
                return Err(CoreError::Broken {
                    kind,
                    name: name.to_string(),
                    reason,
                });
            }
        }
        Ok(Component {
            info: ComponentInfo {
                name: name.to_string(),
                kind,
                state,
                path: path.clone(),
                modified: modified_at(&path),
                description: None,
                broken: None,
            },
            spec,
            body,
        })
    }

    /// A lazy three-tier reader for a skill.
    pub fn skill_reader(&self, name: &str) -> Result<SkillReader> {
        let (path, _) = self.locate(ComponentKind::Skill, name)?;
        Ok(SkillReader::new(path))
    }

    fn locate(&self, kind: ComponentKind, name: &str) -> Result<(PathBuf, ComponentState)> {
        if let Some(path) = self.definition_path(kind, name, ComponentState::Active) {
            return Ok((path, ComponentState::Active));
        }
        if let Some(path) = self.definition_path(kind, name, ComponentState::Disabled) {
            return Ok((path, ComponentState::Disabled));
        }
        Err(CoreError::ComponentNotFound {
            kind,
            name: name.to_string(),
        })
    }

    /// Where `name`'s definition file sits for `state`, if present.
    fn definition_path(
        &self,
        kind: ComponentKind,
        name: &str,
        state: ComponentState,
    ) -> Option<PathBuf> {
        let candidates: Vec<PathBuf> = match (kind, state) {
            (ComponentKind::Skill, ComponentState::Active) => {
                vec![self.paths.active_dir(kind).join(name).join("SKILL.md")]
            }
            (ComponentKind::Skill, ComponentState::Disabled) => vec![self
                .paths
                .root()
                .join("inactive")
                .join("skills")
                .join(name)
                .join("SKILL.md")],
            (_, ComponentState::Active) => {
                vec![self.paths.active_dir(kind).join(format!("{name}.md"))]
            }
            (ComponentKind::Rule, ComponentState::Disabled) => vec![
                self.paths.inactive_dir(kind).join(format!("{name}.md")),
                self.paths
                    .legacy_disabled_rules_dir()
                    .join(format!("{name}.md")),
            ],
            (_, ComponentState::Disabled) => {
                vec![self.paths.inactive_dir(kind).join(format!("{name}.md"))]
            }
        };
        candidates.into_iter().find(|p| p.is_file())
    }

    // ---- activation -------------------------------------------------------

    /// Move a disabled component into the active tree.
    ///
    /// A component whose frontmatter does not parse is refused before any
    /// file moves.
    pub fn activate(&self, kind: ComponentKind, name: &str) -> Result<()> {
        if self.definition_path(kind, name, ComponentState::Active).is_some() {
            return Err(CoreError::AlreadyActive {
                kind,
                name: name.to_string(),
            });
        }
        let source = self
            .definition_path(kind, name, ComponentState::Disabled)
            .ok_or_else(|| CoreError::ComponentNotFound {
                kind,
                name: name.to_string(),
            })?;
        self.parse_component(kind, name, &source)
            .map_err(|err| CoreError::Broken {
                kind,
                name: name.to_string(),
                reason: err.to_string(),
            })?;

        let _lock = self.lock()?;
        match kind {
            ComponentKind::Skill => {
                let dest = self.paths.active_dir(kind).join(name);
                let skill_root = source.parent().expect("SKILL.md has a parent");
                fs::rename(skill_root, &dest)?;
            }
            _ => {
                let dest = self.paths.active_dir(kind).join(format!("{name}.md"));
                staged_move(&source, &dest)?;
            }
        }
        tracing::info!(kind = %kind, name, "activated");
        if kind == ComponentKind::Rule {
            self.rewrite_rules_manifest()?;
        }
        Ok(())
    }

    /// Move an active component into the disabled tree.
    ///
    /// Dependency safety for agents is the resolver's concern; the store
    /// move is mechanical.
    pub fn deactivate(&self, kind: ComponentKind, name: &str) -> Result<()> {
        if self.definition_path(kind, name, ComponentState::Disabled).is_some() {
            return Err(CoreError::AlreadyInactive {
                kind,
                name: name.to_string(),
            });
        }
        let source = self
            .definition_path(kind, name, ComponentState::Active)
            .ok_or_else(|| CoreError::ComponentNotFound {
                kind,
                name: name.to_string(),
            })?;

        let _lock = self.lock()?;
        match kind {
            ComponentKind::Skill => {
                let dest_root = self.paths.root().join("inactive").join("skills");
                fs::create_dir_all(&dest_root)?;
                let skill_root = source.parent().expect("SKILL.md has a parent");
                fs::rename(skill_root, dest_root.join(name))?;
            }
            _ => {
                let dest = self.paths.inactive_dir(kind).join(format!("{name}.md"));
                fs::create_dir_all(dest.parent().expect("inactive dir has a parent"))?;
                staged_move(&source, &dest)?;
            }
        }
        tracing::info!(kind = %kind, name, "deactivated");
        if kind == ComponentKind::Rule {
            self.rewrite_rules_manifest()?;
        }
        Ok(())
    }

    /// Names currently active for `kind`.
    pub fn active_names(&self, kind: ComponentKind) -> Result<BTreeSet<String>> {
        Ok(self
            .list(kind)?
            .into_iter()
            .filter(|info| info.state == ComponentState::Active)
            .map(|info| info.name)
            .collect())
    }

    /// Every parseable agent spec, active and disabled.
    ///
    /// Broken agents are skipped with a warning; graph operations then treat
    /// them as absent.
    pub fn agent_specs(&self) -> Result<Vec<AgentSpec>> {
        let mut specs = Vec::new();
        for info in self.list(ComponentKind::Agent)? {
            match self.parse_component(ComponentKind::Agent, &info.name, &info.path) {
                Ok((ComponentSpec::Agent(spec), _)) => specs.push(spec),
                Ok(_) => unreachable!("agent parse returned non-agent spec"),
                Err(err) => {
                    tracing::warn!(name = %info.name, error = %err, "skipping broken agent");
                }
            }
        }
        Ok(specs)
    }

    /// Installed versions per skill name, for dependency resolution.
    ///
    /// A skill without a parseable version contributes nothing.
    pub fn installed_skill_versions(&self) -> Result<BTreeMap<String, Vec<Version>>> {
        let mut versions: BTreeMap<String, Vec<Version>> = BTreeMap::new();
        for info in self.list(ComponentKind::Skill)? {
            if info.broken.is_some() {
                continue;
            }
            match self.parse_component(ComponentKind::Skill, &info.name, &info.path) {
                Ok((ComponentSpec::Skill(spec), _)) => {
                    if let Some(raw) = spec.version.as_deref() {
                        if let Ok(version) = Version::parse(raw) {
                            versions.entry(spec.name).or_default().push(version);
                        }
                    }
                }
                _ => continue,
            }
        }
        Ok(versions)
    }

    // ---- profiles ---------------------------------------------------------

    /// Capture the current active set.
    pub fn profile_snapshot(&self) -> Result<Profile> {
        Ok(Profile {
            agents: self.active_names(ComponentKind::Agent)?,
            modes: self.active_names(ComponentKind::Mode)?,
            rules: self.active_names(ComponentKind::Rule)?,
        })
    }

    /// Apply a profile by diffing against the current active set.
    ///
    /// Steps run activations first, then deactivations, each kind in
    /// agent/mode/rule order with names sorted. The first failure stops the
    /// run; later steps are reported as skipped.
    pub fn profile_apply(&self, profile: &Profile) -> Result<ProfileDiff> {
        let mut steps: Vec<ProfileStep> = Vec::new();
        for kind in Profile::KINDS {
            let current = self.active_names(kind)?;
            let desired = profile.names(kind);
            for name in desired.difference(&current) {
                steps.push(ProfileStep {
                    kind,
                    name: name.clone(),
                    action: ProfileAction::Activate,
                });
            }
        }
        for kind in Profile::KINDS {
            let current = self.active_names(kind)?;
            let desired = profile.names(kind);
            for name in current.difference(desired) {
                steps.push(ProfileStep {
                    kind,
                    name: name.clone(),
                    action: ProfileAction::Deactivate,
                });
            }
        }

        let mut diff = ProfileDiff::default();
        let mut iter = steps.into_iter();
        for step in iter.by_ref() {
            let outcome = match step.action {
                ProfileAction::Activate => self.activate(step.kind, &step.name),
                ProfileAction::Deactivate => self.deactivate(step.kind, &step.name),
            };
            match outcome {
                Ok(()) => diff.applied.push(step),
                Err(err) => {
                    diff.failed.push((step, err.to_string()));
                    break;
                }
            }
        }
        diff.skipped.extend(iter);
        Ok(diff)
    }

    /// Persist a profile under `profiles/<name>.toml`.
    pub fn profile_save(&self, name: &str, profile: &Profile) -> Result<PathBuf> {
        let path = self.paths.profiles_dir().join(format!("{name}.toml"));
        let text = toml::to_string_pretty(profile).map_err(|err| CoreError::Frontmatter {
            path: path.clone(),
            reason: err.to_string(),
        })?;
        atomic_write(&path, text.as_bytes())?;
        Ok(path)
    }

    /// Load a saved profile.
    pub fn profile_load(&self, name: &str) -> Result<Profile> {
        let path = self.paths.profiles_dir().join(format!("{name}.toml"));
        let content = fs::read_to_string(&path)
            .map_err(|_| CoreError::ProfileNotFound(name.to_string()))?;
        toml::from_str(&content).map_err(|err| CoreError::Frontmatter {
            path,
            reason: err.to_string(),
        })
    }

    /// Names of saved profiles.
    pub fn profile_list(&self) -> Result<Vec<String>> {
        let dir = self.paths.profiles_dir();
        let mut names = Vec::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.extension().map_or(false, |ext| ext == "toml") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        Ok(names)
    }

    // ---- inventory --------------------------------------------------------

    /// Catalog the workflows directory.
    pub fn workflows(&self) -> Result<Vec<WorkflowInfo>> {
        let dir = self.paths.workflows_dir();
        let mut out = Vec::new();
        if dir.is_dir() {
            for entry in fs::read_dir(dir)? {
                let path = entry?.path();
                if path.is_file() && path.extension().map_or(false, |ext| ext == "md") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        out.push(WorkflowInfo {
                            name: stem.to_string(),
                            modified: modified_at(&path),
                            path,
                        });
                    }
                }
            }
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    /// Sweep every kind and report the components that failed to parse.
    pub fn doctor(&self) -> Result<Vec<ComponentInfo>> {
        let mut broken = Vec::new();
        for kind in ComponentKind::ALL {
            broken.extend(
                self.list(kind)?
                    .into_iter()
                    .filter(|info| info.broken.is_some()),
            );
        }
        Ok(broken)
    }

    // ---- rules manifest ---------------------------------------------------

    /// Regenerate `.active-rules` from the rules directory. The filesystem
    /// is authoritative; the manifest is derived state.
    fn rewrite_rules_manifest(&self) -> Result<()> {
        let mut names: Vec<String> = Vec::new();
        let dir = self.paths.active_dir(ComponentKind::Rule);
        if dir.is_dir() {
            for entry in fs::read_dir(&dir)? {
                let path = entry?.path();
                if path.is_file() && path.extension().map_or(false, |ext| ext == "md") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        let mut text = names.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        atomic_write(&self.paths.active_rules_manifest(), text.as_bytes())?;
        Ok(())
    }

    fn sync_rules_manifest(&self, listing: &[ComponentInfo]) -> Result<()> {
        let expected: Vec<&str> = listing
            .iter()
            .filter(|info| info.state == ComponentState::Active)
            .map(|info| info.name.as_str())
            .collect();
        let manifest = self.paths.active_rules_manifest();
        let current = fs::read_to_string(&manifest).unwrap_or_default();
        let current_names: Vec<&str> = current.lines().filter(|l| !l.is_empty()).collect();
        if current_names != expected {
            self.rewrite_rules_manifest()?;
        }
        Ok(())
    }
}

/// Move a file by staging a copy next to the destination and renaming it
/// into place, then removing the source. The destination directory sees
/// either the old state or the complete new file, never a partial write.
fn staged_move(source: &Path, dest: &Path) -> Result<()> {
    let dest_dir = dest.parent().expect("destination has a parent");
    fs::create_dir_all(dest_dir)?;
    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .expect("destination has a file name");
    let stage = dest_dir.join(format!(".{file_name}.staged"));
    fs::copy(source, &stage)?;
    fs::rename(&stage, dest)?;
    fs::remove_file(source)?;
    Ok(())
}

/// Whole-file write staged through a temporary name.
fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().expect("path has a parent");
    fs::create_dir_all(dir)?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .expect("path has a file name");
    let stage = dir.join(format!(".{file_name}.staged"));
    fs::write(&stage, bytes)?;
    fs::rename(&stage, path)?;
    Ok(())
}

fn modified_at(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, Store) {
        let tmp = tempfile::tempdir().unwrap();
        let store = Store::open(CtxPaths::with_root(tmp.path())).unwrap();
        (tmp, store)
    }

    fn write_agent(root: &Path, dir: &str, name: &str, requires: &[&str]) {
        let requires_yaml = if requires.is_empty() {
            String::new()
        } else {
            let items: Vec<String> = requires.iter().map(|r| format!("    - {r}")).collect();
            format!("dependencies:\n  requires:\n{}\n", items.join("\n"))
        };
        let content = format!(
            "---\nname: {name}\nsummary: test agent\n{requires_yaml}---\n\n# {name}\n"
        );
        let path = root.join(dir);
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join(format!("{name}.md")), content).unwrap();
    }

    #[test]
    fn empty_workspace_lists_empty() {
        let (_tmp, store) = store();
        for kind in ComponentKind::ALL {
            assert!(store.list(kind).unwrap().is_empty());
        }
    }

    #[test]
    fn listing_includes_both_states() {
        let (tmp, store) = store();
        write_agent(tmp.path(), "agents", "active-one", &[]);
        write_agent(tmp.path(), "inactive/agents", "disabled-one", &[]);

        let infos = store.list(ComponentKind::Agent).unwrap();
        assert_eq!(infos.len(), 2);
        let active = infos.iter().find(|i| i.name == "active-one").unwrap();
        assert_eq!(active.state, ComponentState::Active);
        assert_eq!(active.description.as_deref(), Some("test agent"));
        let disabled = infos.iter().find(|i| i.name == "disabled-one").unwrap();
        assert_eq!(disabled.state, ComponentState::Disabled);
    }

    #[test]
    fn broken_component_is_listed_not_loaded() {
        let (tmp, store) = store();
        fs::write(
            tmp.path().join("agents/bad.md"),
            "---\nname: bad\nnever closed\n",
        )
        .unwrap();

        let infos = store.list(ComponentKind::Agent).unwrap();
        assert_eq!(infos.len(), 1);
        assert!(infos[0].broken.is_some());
        assert!(store.load(ComponentKind::Agent, "bad").is_err());
    }

    #[test]
    fn unknown_schema_version_is_broken() {
        let (tmp, store) = store();
        fs::write(
            tmp.path().join("agents/future.md"),
            "---\nname: future\nschema-version: 9\n---\nbody",
        )
        .unwrap();
        let infos = store.list(ComponentKind::Agent).unwrap();
        assert!(infos[0].broken.as_deref().unwrap().contains("schema version"));
    }

    #[test]
    fn activate_and_deactivate_round_trip() {
        let (tmp, store) = store();
        write_agent(tmp.path(), "inactive/agents", "mover", &[]);

        store.activate(ComponentKind::Agent, "mover").unwrap();
        assert!(tmp.path().join("agents/mover.md").is_file());
        assert!(!tmp.path().join("inactive/agents/mover.md").exists());

        // Second activation is an error.
        assert!(matches!(
            store.activate(ComponentKind::Agent, "mover").unwrap_err(),
            CoreError::AlreadyActive { .. }
        ));

        store.deactivate(ComponentKind::Agent, "mover").unwrap();
        assert!(tmp.path().join("inactive/agents/mover.md").is_file());
        assert!(matches!(
            store.deactivate(ComponentKind::Agent, "mover").unwrap_err(),
            CoreError::AlreadyInactive { .. }
        ));
    }

    #[test]
    fn activate_refuses_broken_definition() {
        let (tmp, store) = store();
        fs::write(
            tmp.path().join("inactive/agents/bad.md"),
            "---\nname: bad\nno closing delimiter\n",
        )
        .unwrap();
        assert!(matches!(
            store.activate(ComponentKind::Agent, "bad").unwrap_err(),
            CoreError::Broken { .. }
        ));
        // The file did not move.
        assert!(tmp.path().join("inactive/agents/bad.md").is_file());
    }

    #[test]
    fn missing_component_is_not_found() {
        let (_tmp, store) = store();
        assert!(matches!(
            store.activate(ComponentKind::Mode, "ghost").unwrap_err(),
            CoreError::ComponentNotFound { .. }
        ));
    }

    #[test]
    fn skill_activation_moves_directory() {
        let (tmp, store) = store();
        let dir = tmp.path().join("inactive/skills/my-skill");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("SKILL.md"),
            "---\nname: my-skill\ndescription: Testing. Use when testing.\n---\nbody",
        )
        .unwrap();

        store.activate(ComponentKind::Skill, "my-skill").unwrap();
        assert!(tmp.path().join("skills/my-skill/SKILL.md").is_file());

        store.deactivate(ComponentKind::Skill, "my-skill").unwrap();
        assert!(tmp.path().join("inactive/skills/my-skill/SKILL.md").is_file());
    }

    #[test]
    fn legacy_disabled_rules_dir_is_read() {
        let (tmp, store) = store();
        let legacy = tmp.path().join("rules-disabled");
        fs::create_dir_all(&legacy).unwrap();
        fs::write(legacy.join("quality-old.md"), "---\ntitle: Old\n---\nbody").unwrap();

        let infos = store.list(ComponentKind::Rule).unwrap();
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].state, ComponentState::Disabled);

        // Activation out of the legacy location lands in rules/.
        store.activate(ComponentKind::Rule, "quality-old").unwrap();
        assert!(tmp.path().join("rules/quality-old.md").is_file());
    }

    #[test]
    fn rules_manifest_tracks_active_rules() {
        let (tmp, store) = store();
        fs::write(
            tmp.path().join("rules/disabled/quality-a.md"),
            "---\ntitle: A\n---\n",
        )
        .unwrap();
        store.activate(ComponentKind::Rule, "quality-a").unwrap();

        let manifest = fs::read_to_string(tmp.path().join(".active-rules")).unwrap();
        assert_eq!(manifest, "quality-a\n");

        store.deactivate(ComponentKind::Rule, "quality-a").unwrap();
        let manifest = fs::read_to_string(tmp.path().join(".active-rules")).unwrap();
        assert!(manifest.is_empty());
    }

    #[test]
    fn stale_manifest_is_regenerated_on_list() {
        let (tmp, store) = store();
        fs::write(tmp.path().join("rules/quality-a.md"), "---\ntitle: A\n---\n").unwrap();
        fs::write(tmp.path().join(".active-rules"), "something-else\n").unwrap();

        store.list(ComponentKind::Rule).unwrap();
        let manifest = fs::read_to_string(tmp.path().join(".active-rules")).unwrap();
        assert_eq!(manifest, "quality-a\n");
    }

    #[test]
    fn profile_snapshot_then_apply_is_noop() {
        let (tmp, store) = store();
        write_agent(tmp.path(), "agents", "a", &[]);
        write_agent(tmp.path(), "inactive/agents", "b", &[]);

        let snapshot = store.profile_snapshot().unwrap();
        let diff = store.profile_apply(&snapshot).unwrap();
        assert!(diff.is_noop());
    }

    #[test]
    fn profile_apply_converges_to_profile() {
        let (tmp, store) = store();
        write_agent(tmp.path(), "agents", "on", &[]);
        write_agent(tmp.path(), "inactive/agents", "off", &[]);

        let mut profile = Profile::default();
        profile.agents.insert("off".into());
        let diff = store.profile_apply(&profile).unwrap();
        assert!(diff.is_clean());
        assert_eq!(diff.applied.len(), 2);

        let active = store.active_names(ComponentKind::Agent).unwrap();
        assert!(active.contains("off"));
        assert!(!active.contains("on"));
    }

    #[test]
    fn profile_apply_stops_on_first_failure() {
        let (tmp, store) = store();
        write_agent(tmp.path(), "agents", "on", &[]);

        let mut profile = Profile::default();
        profile.agents.insert("ghost-one".into());
        profile.agents.insert("ghost-two".into());
        let diff = store.profile_apply(&profile).unwrap();
        assert_eq!(diff.failed.len(), 1);
        // The remaining activation and the deactivation of `on` were skipped.
        assert!(!diff.skipped.is_empty());
        assert!(store
            .active_names(ComponentKind::Agent)
            .unwrap()
            .contains("on"));
    }

    #[test]
    fn op_sequence_matches_in_memory_model() {
        let (tmp, store) = store();
        for name in ["a", "b", "c"] {
            write_agent(tmp.path(), "inactive/agents", name, &[]);
        }

        // Mirror every successful operation in a plain set; the store's
        // view must stay equal to it.
        let mut model: std::collections::BTreeSet<String> = Default::default();
        let ops: &[(&str, bool)] = &[
            ("a", true),
            ("b", true),
            ("a", false),
            ("c", true),
            ("b", false),
            ("a", true),
        ];
        for (name, activate) in ops {
            if *activate {
                store.activate(ComponentKind::Agent, name).unwrap();
                model.insert(name.to_string());
            } else {
                store.deactivate(ComponentKind::Agent, name).unwrap();
                model.remove(*name);
            }
            assert_eq!(store.active_names(ComponentKind::Agent).unwrap(), model);
        }
    }

    #[test]
    fn profile_save_load_round_trips() {
        let (_tmp, store) = store();
        let mut profile = Profile::default();
        profile.agents.insert("a".into());
        profile.rules.insert("quality-a".into());
        store.profile_save("focus", &profile).unwrap();

        assert_eq!(store.profile_list().unwrap(), vec!["focus"]);
        assert_eq!(store.profile_load("focus").unwrap(), profile);
        assert!(matches!(
            store.profile_load("ghost").unwrap_err(),
            CoreError::ProfileNotFound(_)
        ));
    }

    #[test]
    fn workflows_are_inventoried_only() {
        let (tmp, store) = store();
        fs::write(tmp.path().join("workflows/release.md"), "# Release\n").unwrap();
        let workflows = store.workflows().unwrap();
        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].name, "release");
    }

    #[test]
    fn doctor_reports_only_broken() {
        let (tmp, store) = store();
        write_agent(tmp.path(), "agents", "good", &[]);
        fs::write(tmp.path().join("modes/bad.md"), "---\nname: [\n---\n").unwrap();

        let broken = store.doctor().unwrap();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].name, "bad");
    }
}
