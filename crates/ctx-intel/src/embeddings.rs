//! Vectorizer collaborator and the JSONL embedding store.
//!
//! Embedding generation is injected: anything that can turn text into a
//! fixed-dimension vector works as a [`Vectorizer`]. Absence is a
//! first-class state; the learner degrades to its pattern and rule streams
//! when no vectorizer is configured.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::Result;

/// Trait for embedding collaborators.
///
/// Implementations are expected to produce vectors of a fixed
/// dimensionality per instance.
#[async_trait]
pub trait Vectorizer: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;

    /// The dimensionality of produced vectors.
    fn dim(&self) -> usize;

    /// Embed several texts. The default loops over [`Vectorizer::embed`];
    /// batch-capable implementations should override.
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// One stored session embedding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub session_id: String,
    pub vector: Vec<f32>,
}

/// A session matched by similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarSession {
    pub session_id: String,
    pub similarity: f32,
}

/// JSONL-backed store of session embeddings, mirroring the history file's
/// locking discipline.
#[derive(Debug, Clone)]
pub struct EmbeddingStore {
    path: PathBuf,
}

impl EmbeddingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one embedding under an exclusive lock.
    pub fn append(&self, record: &EmbeddingRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.lock_exclusive()?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let outcome = file.write_all(line.as_bytes()).and_then(|_| file.flush());
        let _ = FileExt::unlock(&file);
        outcome?;
        Ok(())
    }

    /// All parseable embeddings; corrupt lines are skipped with a warning.
    pub fn load(&self) -> Result<Vec<EmbeddingRecord>> {
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
            match serde_json::from_str::<EmbeddingRecord>(&line) {
                Ok(record) => records.push(record),
                Err(err) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        line = idx + 1,
                        error = %err,
                        "skipping corrupt embedding record"
                    );
                }
            }
        }
        Ok(records)
    }

    /// Linear-scan similarity search: score every stored vector against the
    /// query, keep those at or above `floor`, and return the `top_k` best in
    /// descending order (ties broken by session id for determinism).
    pub fn search(&self, query: &[f32], top_k: usize, floor: f32) -> Result<Vec<SimilarSession>> {
        let mut scored: Vec<SimilarSession> = self
            .load()?
            .into_iter()
            .map(|record| SimilarSession {
                similarity: cosine_similarity(query, &record.vector),
                session_id: record.session_id,
            })
            .filter(|hit| hit.similarity >= floor)
            .collect();
        scored.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        scored.truncate(top_k);
        Ok(scored)
    }
}

/// Cosine similarity between two vectors. Mismatched or zero-magnitude
/// vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, EmbeddingStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = EmbeddingStore::new(tmp.path().join("embeddings.jsonl"));
        (tmp, store)
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn search_ranks_by_similarity() {
        let (_tmp, store) = store();
        store
            .append(&EmbeddingRecord {
                session_id: "aligned".into(),
                vector: vec![1.0, 0.0],
            })
            .unwrap();
        store
            .append(&EmbeddingRecord {
                session_id: "diagonal".into(),
                vector: vec![1.0, 1.0],
            })
            .unwrap();
        store
            .append(&EmbeddingRecord {
                session_id: "orthogonal".into(),
                vector: vec![0.0, 1.0],
            })
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 5, 0.5).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].session_id, "aligned");
        assert_eq!(hits[1].session_id, "diagonal");
    }

    #[test]
    fn search_respects_top_k_and_floor() {
        let (_tmp, store) = store();
        for i in 0..4 {
            store
                .append(&EmbeddingRecord {
                    session_id: format!("s{i}"),
                    vector: vec![1.0, i as f32 * 0.1],
                })
                .unwrap();
        }
        let hits = store.search(&[1.0, 0.0], 2, 0.0).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].session_id, "s0");
    }

    #[test]
    fn missing_store_is_empty() {
        let (_tmp, store) = store();
        assert!(store.search(&[1.0], 5, 0.0).unwrap().is_empty());
    }
}
