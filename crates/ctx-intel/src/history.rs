//! Append-only session history.
//!
//! Successful sessions land in `data/session_history.jsonl`, one JSON
//! object per line. Appends hold an exclusive advisory lock for their
//! duration so a CLI and TUI sharing the workspace never interleave lines.
//! Every Nth append triggers a prune that rewrites the file through a
//! staged rename, keeping the newest records within the count and age
//! bounds.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use ctx_core::settings::HistorySettings;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::context::SessionContext;
use crate::errors::Result;

/// How a recorded session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOutcome {
    Success,
    Failure,
    Partial,
    Abandoned,
}

impl std::fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SessionOutcome::Success => "success",
            SessionOutcome::Failure => "failure",
            SessionOutcome::Partial => "partial",
            SessionOutcome::Abandoned => "abandoned",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for SessionOutcome {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "success" => Ok(SessionOutcome::Success),
            "failure" => Ok(SessionOutcome::Failure),
            "partial" => Ok(SessionOutcome::Partial),
            "abandoned" => Ok(SessionOutcome::Abandoned),
            other => Err(format!("unknown outcome '{other}'")),
        }
    }
}

/// One history entry. Records are immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Stable id linking the record to its embedding, when one exists.
    #[serde(default)]
    pub id: String,

    pub context_fingerprint: String,

    pub files: Vec<String>,

    pub file_types: Vec<String>,

    /// Architectural signal names that were set, in canonical order.
    pub architectural_flags: Vec<String>,

    pub agents_used: Vec<String>,

    pub duration_seconds: u64,

    pub outcome: SessionOutcome,

    pub timestamp: DateTime<Utc>,
}

impl SessionRecord {
    /// Build a record from a context snapshot.
    pub fn from_context(
        context: &SessionContext,
        agents_used: &[String],
        duration_seconds: u64,
        outcome: SessionOutcome,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            context_fingerprint: context.fingerprint(),
            files: context.files_changed.clone(),
            file_types: context.file_types.iter().cloned().collect(),
            architectural_flags: context.architectural_flags(),
            agents_used: agents_used.to_vec(),
            duration_seconds,
            outcome,
            timestamp: Utc::now(),
        }
    }
}

/// JSONL-backed history store.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    settings: HistorySettings,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>, settings: HistorySettings) -> Self {
        Self {
            path: path.into(),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, pruning when the interval comes due.
    pub fn append(&self, record: &SessionRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        let result = self.append_locked(&mut file, record);
        let _ = FileExt::unlock(&file);
        result
    }

    fn append_locked(&self, file: &mut File, record: &SessionRecord) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        file.flush()?;

        let count = self.count_lines()?;
        if self.settings.prune_interval > 0 && count % self.settings.prune_interval == 0 {
            self.prune()?;
        }
        Ok(())
    }

    /// All parseable records, oldest first. Corrupt lines are skipped with
    /// a warning; one bad line never poisons the history.
    pub fn load(&self) -> Result<Vec<SessionRecord>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut records = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<SessionRecord>(&line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = idx + 1,
                        error = %err,
                        "skipping corrupt history record"
                    );
                }
            }
        }
        Ok(records)
    }

    /// Number of stored records.
    pub fn len(&self) -> Result<usize> {
        self.count_lines()
    }

    /// True when no records are stored.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.count_lines()? == 0)
    }

    fn count_lines(&self) -> Result<usize> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(err) => return Err(err.into()),
        };
        let mut count = 0;
        for line in BufReader::new(file).lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Drop records beyond the count bound or older than the age bound,
    /// rewriting the file via stage + rename.
    fn prune(&self) -> Result<()> {
        let records = self.load()?;
        let cutoff = Utc::now() - Duration::days(self.settings.max_age_days);
        let mut kept: Vec<&SessionRecord> = records
            .iter()
            .filter(|record| record.timestamp >= cutoff)
            .collect();
        if kept.len() > self.settings.max_records {
            let excess = kept.len() - self.settings.max_records;
            kept.drain(..excess);
        }
        if kept.len() == records.len() {
            return Ok(());
        }

        tracing::info!(
            dropped = records.len() - kept.len(),
            kept = kept.len(),
            "pruning session history"
        );
        let stage = self.path.with_extension("jsonl.staged");
        {
            let mut out = File::create(&stage)?;
            for record in &kept {
                let mut line = serde_json::to_string(record)?;
                line.push('\n');
                out.write_all(line.as_bytes())?;
            }
            out.flush()?;
        }
        fs::rename(&stage, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(max_records: usize, interval: usize) -> HistorySettings {
        HistorySettings {
            max_records,
            max_age_days: 180,
            prune_interval: interval,
        }
    }

    fn record(agent: &str) -> SessionRecord {
        SessionRecord::from_context(
            &SessionContext::empty(),
            &[agent.to_string()],
            60,
            SessionOutcome::Success,
        )
    }

    #[test]
    fn append_then_load_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(tmp.path().join("history.jsonl"), settings(100, 0));
        store.append(&record("python-pro")).unwrap();
        store.append(&record("api-designer")).unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].agents_used, vec!["python-pro"]);
        assert_eq!(records[1].agents_used, vec!["api-designer"]);
    }

    #[test]
    fn missing_file_loads_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(tmp.path().join("none.jsonl"), settings(100, 0));
        assert!(store.load().unwrap().is_empty());
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn corrupt_lines_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("history.jsonl");
        let store = HistoryStore::new(&path, settings(100, 0));
        store.append(&record("a")).unwrap();
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{not json").unwrap();
        }
        store.append(&record("b")).unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn prune_keeps_newest_within_bound() {
        let tmp = tempfile::tempdir().unwrap();
        let store = HistoryStore::new(tmp.path().join("history.jsonl"), settings(3, 5));
        for i in 0..5 {
            store.append(&record(&format!("agent-{i}"))).unwrap();
        }
        // The fifth append hit the prune interval; only 3 remain.
        let records = store.load().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].agents_used, vec!["agent-2"]);
        assert_eq!(records[2].agents_used, vec!["agent-4"]);
    }

    #[test]
    fn outcome_parses_from_str() {
        assert_eq!(
            "partial".parse::<SessionOutcome>().unwrap(),
            SessionOutcome::Partial
        );
        assert!("flaky".parse::<SessionOutcome>().is_err());
    }
}
