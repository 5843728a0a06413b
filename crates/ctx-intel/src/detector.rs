//! Workspace context detection.
//!
//! A bounded scan of a working directory produces a [`SessionContext`]:
//! which file types are present, which architectural signals fire, and a
//! capped list of files. The scan never follows hidden files and skips the
//! usual build/dependency/VCS directories, so it stays cheap even on large
//! checkouts.

use std::collections::BTreeSet;
use std::path::Path;

use walkdir::WalkDir;

use crate::context::SessionContext;
use crate::errors::{IntelError, Result};

/// Directory names never descended into.
const SKIP_DIRS: &[&str] = &[
    "target",
    "node_modules",
    "dist",
    "build",
    "vendor",
    "__pycache__",
    ".venv",
    "venv",
    ".git",
    ".hg",
    ".svn",
];

/// Path segments that mark API surface.
const API_SEGMENTS: &[&str] = &["api", "routes", "endpoints", "handlers"];

/// Filename fragments that mark authentication concerns.
const AUTH_FRAGMENTS: &[&str] = &["auth", "oauth", "login", "session"];

/// Filename fragments that mark database concerns.
const DB_FRAGMENTS: &[&str] = &["db", "database", "schema", "migration"];

/// Web manifests that mark a frontend.
const FRONTEND_MANIFESTS: &[&str] = &["package.json", "index.html", "vite.config.ts", "vite.config.js"];

/// Service manifests that mark a backend.
const BACKEND_MANIFESTS: &[&str] = &["dockerfile", "docker-compose.yml", "docker-compose.yaml"];

/// Bounded workspace scanner.
#[derive(Debug, Clone)]
pub struct ContextDetector {
    scan_limit: usize,
}

impl ContextDetector {
    pub fn new(scan_limit: usize) -> Self {
        Self { scan_limit }
    }

    /// Scan `root` and derive a context snapshot.
    ///
    /// Counters stay at zero; the orchestrator overlays them from external
    /// collaborators when it has better information.
    pub fn detect(&self, root: &Path) -> Result<SessionContext> {
        if !root.is_dir() {
            return Err(IntelError::DirectoryNotFound(root.to_path_buf()));
        }

        let mut ctx = SessionContext::empty();
        let mut files: Vec<String> = Vec::new();
        let mut directories: BTreeSet<String> = BTreeSet::new();

        let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
            let name = entry.file_name().to_string_lossy();
            if name.starts_with('.') && entry.depth() > 0 {
                return false;
            }
            if entry.file_type().is_dir() {
                return !SKIP_DIRS.contains(&name.to_ascii_lowercase().as_str());
            }
            true
        });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            let rel = match entry.path().strip_prefix(root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => continue,
            };
            if entry.file_type().is_dir() {
                directories.insert(rel.to_string_lossy().replace('\\', "/"));
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            files.push(rel.to_string_lossy().replace('\\', "/"));
            if files.len() >= self.scan_limit {
                break;
            }
        }

        for file in &files {
            if let Some(ext) = Path::new(file).extension().and_then(|e| e.to_str()) {
                ctx.file_types.insert(ext.to_ascii_lowercase());
            }
        }

        apply_signals(&mut ctx, &files, &directories);
        ctx.directories = directories;
        ctx.files_changed = files;
        Ok(ctx)
    }
}

fn apply_signals(ctx: &mut SessionContext, files: &[String], directories: &BTreeSet<String>) {
    let dir_names: BTreeSet<String> = directories
        .iter()
        .flat_map(|dir| dir.split('/'))
        .map(|segment| segment.to_ascii_lowercase())
        .collect();

    for file in files {
        let lower = file.to_ascii_lowercase();
        let file_name = lower.rsplit('/').next().unwrap_or(&lower).to_string();
        let segments: Vec<&str> = lower.split('/').collect();

        if lower.contains("test") {
            ctx.has_tests = true;
        }
        if AUTH_FRAGMENTS.iter().any(|frag| file_name.contains(frag)) {
            ctx.has_auth = true;
        }
        if segments
            .iter()
            .any(|segment| API_SEGMENTS.contains(segment))
        {
            ctx.has_api = true;
        }
        if FRONTEND_MANIFESTS.contains(&file_name.as_str()) {
            ctx.has_frontend = true;
        }
        if BACKEND_MANIFESTS.contains(&file_name.as_str()) {
            ctx.has_backend = true;
        }
        let stem = file_name.split('.').next().unwrap_or("");
        if DB_FRAGMENTS
            .iter()
            .any(|frag| stem == *frag || stem.contains(frag))
        {
            ctx.has_database = true;
        }
    }

    if dir_names.contains("tests") || dir_names.contains("spec") || dir_names.contains("__tests__")
    {
        ctx.has_tests = true;
    }
    if dir_names.contains("src") || dir_names.contains("frontend") {
        ctx.has_frontend = true;
    }
    if dir_names.contains("backend") || dir_names.contains("server") || dir_names.contains("services") {
        ctx.has_backend = true;
    }
    if dir_names.contains("migrations") {
        ctx.has_database = true;
    }
}
