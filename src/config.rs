use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Application-level constants
pub const APP_NAME: &str = "Quizzinator";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Model asked when nothing else is configured.
pub const DEFAULT_MODEL: &str = "deepseek-r1:1.5b";

/// Local Ollama instance.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Per-request timeout for the model, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Name of the append-only extraction failure log inside an experiment root.
pub const ERRORS_FILE: &str = "errors.txt";

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "quizzinator_lib=info"
}

/// Directory layout of one survey project.
///
/// ```text
/// {root}/
///   questions.txt
///   errors.txt
///   experiments/{name}/
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentPaths {
    root: PathBuf,
}

impl ExperimentPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where extraction failures are appended.
    pub fn errors_path(&self) -> PathBuf {
        self.root.join(ERRORS_FILE)
    }

    pub fn questions_path(&self) -> PathBuf {
        self.root.join("questions.txt")
    }

    pub fn experiment_dir(&self, name: &str) -> PathBuf {
        self.root.join("experiments").join(name)
    }
}

/// Knobs for one quiz run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuizConfig {
    /// Ollama model tag.
    pub model: String,
    /// Base URL of the Ollama HTTP API.
    pub base_url: String,
    pub timeout_secs: u64,
    /// Re-prompts per question, and full reruns per respondent.
    pub attempts: u32,
    /// Share of questions that must be answered for a respondent to count.
    pub min_answered_ratio: f32,
    /// Character budget for prompts and answers echoed into the log.
    pub truncate_len: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            attempts: 3,
            min_answered_ratio: 0.8,
            truncate_len: 50,
        }
    }
}

impl QuizConfig {
    /// Defaults, overridden by `QUIZZINATOR_*` environment variables.
    ///
    /// Unparseable numeric overrides are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(model) = lookup("QUIZZINATOR_MODEL") {
            config.model = model;
        }
        if let Some(url) = lookup("QUIZZINATOR_OLLAMA_URL") {
            config.base_url = url;
        }
        if let Some(secs) = parse_override(&lookup, "QUIZZINATOR_TIMEOUT_SECS") {
            config.timeout_secs = secs;
        }
        if let Some(attempts) = parse_override(&lookup, "QUIZZINATOR_ATTEMPTS") {
            config.attempts = attempts;
        }

        config
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable config override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn errors_path_under_root() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = ExperimentPaths::new(tmp.path());
        assert!(paths.errors_path().starts_with(tmp.path()));
        assert!(paths.errors_path().ends_with("errors.txt"));
    }

    #[test]
    fn experiment_dir_nested_under_experiments() {
        let paths = ExperimentPaths::new("/surveys/kink");
        assert_eq!(
            paths.experiment_dir("generic"),
            PathBuf::from("/surveys/kink/experiments/generic")
        );
        assert_eq!(paths.questions_path(), PathBuf::from("/surveys/kink/questions.txt"));
    }

    #[test]
    fn defaults_match_constants() {
        let config = QuizConfig::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(config.attempts, 3);
        assert!((config.min_answered_ratio - 0.8).abs() < f32::EPSILON);
    }

    #[test]
    fn overrides_applied() {
        let config = QuizConfig::from_lookup(lookup_from(&[
            ("QUIZZINATOR_MODEL", "llama3:8b"),
            ("QUIZZINATOR_ATTEMPTS", "5"),
            ("QUIZZINATOR_TIMEOUT_SECS", " 60 "),
        ]));
        assert_eq!(config.model, "llama3:8b");
        assert_eq!(config.attempts, 5);
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.base_url, DEFAULT_OLLAMA_URL);
    }

    #[test]
    fn unparseable_override_keeps_default() {
        let config = QuizConfig::from_lookup(lookup_from(&[("QUIZZINATOR_ATTEMPTS", "many")]));
        assert_eq!(config.attempts, 3);
    }

    #[test]
    fn config_serializes_to_json() {
        let json = serde_json::to_string(&QuizConfig::default()).unwrap();
        assert!(json.contains("\"attempts\":3"));
    }

    #[test]
    fn app_name_is_quizzinator() {
        assert_eq!(APP_NAME, "Quizzinator");
    }
}
