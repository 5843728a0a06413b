//! The structured workspace snapshot consumed by the learner.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How many changed files enter the fingerprint before truncation.
const FINGERPRINT_FILE_CAP: usize = 20;

/// A point-in-time snapshot of a workspace's relevant signals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    /// Relative paths of files considered changed/present, scan order.
    pub files_changed: Vec<String>,

    /// File extensions observed, without the leading dot.
    pub file_types: BTreeSet<String>,

    /// Relative directories observed.
    pub directories: BTreeSet<String>,

    pub has_tests: bool,
    pub has_auth: bool,
    pub has_api: bool,
    pub has_frontend: bool,
    pub has_backend: bool,
    pub has_database: bool,

    /// Overlay counters; the detector leaves these at zero.
    pub errors_count: u32,
    pub test_failures: u32,
    pub build_failures: u32,

    pub session_start: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,

    pub active_agents: Vec<String>,
    pub active_modes: Vec<String>,
    pub active_rules: Vec<String>,
}

impl SessionContext {
    /// An empty context stamped with the current time.
    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            files_changed: Vec::new(),
            file_types: BTreeSet::new(),
            directories: BTreeSet::new(),
            has_tests: false,
            has_auth: false,
            has_api: false,
            has_frontend: false,
            has_backend: false,
            has_database: false,
            errors_count: 0,
            test_failures: 0,
            build_failures: 0,
            session_start: now,
            last_activity: now,
            active_agents: Vec::new(),
            active_modes: Vec::new(),
            active_rules: Vec::new(),
        }
    }

    /// Names of the architectural signals currently set, in a fixed order.
    pub fn architectural_flags(&self) -> Vec<String> {
        let mut flags = Vec::new();
        for (set, name) in [
            (self.has_tests, "tests"),
            (self.has_auth, "auth"),
            (self.has_api, "api"),
            (self.has_frontend, "frontend"),
            (self.has_backend, "backend"),
            (self.has_database, "database"),
        ] {
            if set {
                flags.push(name.to_string());
            }
        }
        flags
    }

    /// Canonical textual fingerprint: sorted file types, architectural
    /// flags, the first files (capped), and the active agents. Two contexts
    /// that differ only in scan order or timestamps fingerprint identically.
    pub fn fingerprint(&self) -> String {
        let types: Vec<&str> = self.file_types.iter().map(String::as_str).collect();
        let flags = self.architectural_flags();
        let mut files: Vec<&str> = self
            .files_changed
            .iter()
            .take(FINGERPRINT_FILE_CAP)
            .map(String::as_str)
            .collect();
        files.sort_unstable();
        format!(
            "types={}|flags={}|files={}|agents={}",
            types.join(","),
            flags.join(","),
            files.join(","),
            self.active_agents.join(","),
        )
    }

    /// Stable hash of the fingerprint, for keying persisted recommendations.
    pub fn context_hash(&self) -> String {
        blake3::hash(self.fingerprint().as_bytes())
            .to_hex()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_context_has_no_flags() {
        let ctx = SessionContext::empty();
        assert!(ctx.architectural_flags().is_empty());
        assert_eq!(ctx.fingerprint(), "types=|flags=|files=|agents=");
    }

    #[test]
    fn fingerprint_is_order_insensitive_for_files() {
        let mut a = SessionContext::empty();
        a.files_changed = vec!["b.rs".into(), "a.rs".into()];
        let mut b = SessionContext::empty();
        b.files_changed = vec!["a.rs".into(), "b.rs".into()];
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.context_hash(), b.context_hash());
    }

    #[test]
    fn fingerprint_caps_file_list() {
        let mut ctx = SessionContext::empty();
        ctx.files_changed = (0..40).map(|i| format!("f{i:02}.rs")).collect();
        let fp = ctx.fingerprint();
        assert!(fp.contains("f19.rs"));
        assert!(!fp.contains("f20.rs"));
    }

    #[test]
    fn flags_are_stable_names() {
        let mut ctx = SessionContext::empty();
        ctx.has_auth = true;
        ctx.has_tests = true;
        assert_eq!(ctx.architectural_flags(), vec!["tests", "auth"]);
    }
}
