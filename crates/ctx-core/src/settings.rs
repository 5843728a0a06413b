//! Tunable knobs loaded from `<root>/config.toml`.
//!
//! Every field has a default so an absent or partial file is fine. A file
//! that fails to parse is ignored with a warning rather than failing the
//! whole process.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Runtime settings for detection, learning, and retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Detection knobs.
    #[serde(default)]
    pub detect: DetectSettings,

    /// Recommendation knobs.
    #[serde(default)]
    pub recommend: RecommendSettings,

    /// Session history retention.
    #[serde(default)]
    pub history: HistorySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            detect: DetectSettings::default(),
            recommend: RecommendSettings::default(),
            history: HistorySettings::default(),
        }
    }
}

/// Workspace scan bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectSettings {
    /// Maximum number of non-hidden files inspected per scan.
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,
}

impl Default for DetectSettings {
    fn default() -> Self {
        Self {
            scan_limit: default_scan_limit(),
        }
    }
}

/// Thresholds and deadlines for the recommendation pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendSettings {
    /// Minimum confidence for unattended activation of an agent.
    #[serde(default = "default_auto_threshold")]
    pub auto_activate_threshold: f64,

    /// The LLM stream only fires when the best non-LLM confidence is below
    /// this value.
    #[serde(default = "default_llm_threshold")]
    pub llm_fallback_threshold: f64,

    /// Minimum cosine similarity for the semantic stream.
    #[serde(default = "default_similarity_floor")]
    pub similarity_floor: f64,

    /// Number of past sessions consulted by the semantic stream.
    #[serde(default = "default_semantic_top_k")]
    pub semantic_top_k: usize,

    /// Soft budget for a whole prediction, in milliseconds. The semantic and
    /// LLM streams are dropped when they exceed it.
    #[serde(default = "default_predict_deadline_ms")]
    pub predict_deadline_ms: u64,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self {
            auto_activate_threshold: default_auto_threshold(),
            llm_fallback_threshold: default_llm_threshold(),
            similarity_floor: default_similarity_floor(),
            semantic_top_k: default_semantic_top_k(),
            predict_deadline_ms: default_predict_deadline_ms(),
        }
    }
}

/// Bounds on `session_history.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistorySettings {
    /// Newest records kept after a prune.
    #[serde(default = "default_history_max_records")]
    pub max_records: usize,

    /// Records older than this are dropped on prune.
    #[serde(default = "default_history_max_age_days")]
    pub max_age_days: i64,

    /// A prune pass runs on every Nth append.
    #[serde(default = "default_history_prune_interval")]
    pub prune_interval: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            max_records: default_history_max_records(),
            max_age_days: default_history_max_age_days(),
            prune_interval: default_history_prune_interval(),
        }
    }
}

fn default_scan_limit() -> usize {
    500
}

fn default_auto_threshold() -> f64 {
    0.80
}

fn default_llm_threshold() -> f64 {
    0.50
}

fn default_similarity_floor() -> f64 {
    0.60
}

fn default_semantic_top_k() -> usize {
    5
}

fn default_predict_deadline_ms() -> u64 {
    2_000
}

fn default_history_max_records() -> usize {
    5_000
}

fn default_history_max_age_days() -> i64 {
    180
}

fn default_history_prune_interval() -> usize {
    100
}

impl Settings {
    /// Load settings from a TOML file, falling back to defaults when the
    /// file is absent or malformed.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&content) {
            Ok(settings) => settings,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "ignoring malformed config file"
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let s = Settings::default();
        assert_eq!(s.detect.scan_limit, 500);
        assert_eq!(s.recommend.auto_activate_threshold, 0.80);
        assert_eq!(s.recommend.llm_fallback_threshold, 0.50);
        assert_eq!(s.recommend.similarity_floor, 0.60);
        assert_eq!(s.recommend.semantic_top_k, 5);
        assert_eq!(s.history.max_records, 5_000);
        assert_eq!(s.history.max_age_days, 180);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let s: Settings = toml::from_str("[recommend]\nauto_activate_threshold = 0.9\n").unwrap();
        assert_eq!(s.recommend.auto_activate_threshold, 0.9);
        assert_eq!(s.recommend.semantic_top_k, 5);
        assert_eq!(s.detect.scan_limit, 500);
    }

    #[test]
    fn malformed_file_falls_back() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "recommend = 3").unwrap();
        let s = Settings::load(&path);
        assert_eq!(s.recommend.semantic_top_k, 5);
    }
}
