//! Configuration loading, validation, and management for Unit agents.
//!
//! Loads configuration from `~/.unit-agents/config.toml` with environment
//! variable overrides. Validates all settings at startup. Ceilings, models,
//! and endpoints live here and are threaded explicitly into the loop — the
//! reasoning loop itself never reads ambient state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
///
/// Maps directly to `~/.unit-agents/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the Unit platform backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Language model access.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Reasoning loop ceilings.
    #[serde(default)]
    pub runner: RunnerSection,

    /// Autonomous daemon scheduling.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// History persistence.
    #[serde(default)]
    pub history: HistoryConfig,
}

fn default_backend_url() -> String {
    "http://localhost:3000".into()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API key. Usually supplied via the OPENAI_API_KEY environment
    /// variable; absence puts plain runs on the offline summary path and
    /// makes autonomous runs fail fast.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Endpoint base, for OpenAI-compatible proxies.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Model used for identities that predate model assignment and for
    /// runs without an identity.
    #[serde(default = "default_model")]
    pub default_model: String,
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_openai_base_url(),
            default_model: default_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSection {
    /// Hard cap on planning iterations per run.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Hard cap on total state transitions per run — the runaway backstop.
    /// Must cover max_iterations worth of plan/execute/summarize steps.
    #[serde(default = "default_max_transitions")]
    pub max_transitions: u32,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_max_transitions() -> u32 {
    60
}

impl Default for RunnerSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_transitions: default_max_transitions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Minimum seconds between autonomous cycles.
    #[serde(default = "default_min_interval")]
    pub min_interval_secs: u64,

    /// Maximum seconds between autonomous cycles.
    #[serde(default = "default_max_interval")]
    pub max_interval_secs: u64,

    /// One-in-N chance per cycle of spawning a brand-new agent instead of
    /// waking an existing one.
    #[serde(default = "default_new_agent_odds")]
    pub new_agent_odds: u32,
}

fn default_min_interval() -> u64 {
    30
}
fn default_max_interval() -> u64 {
    120
}
fn default_new_agent_odds() -> u32 {
    100
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: default_min_interval(),
            max_interval_secs: default_max_interval(),
            new_agent_odds: default_new_agent_odds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Which store backs agent histories: "remote" (the platform's
    /// interaction resource) or "file" (per-agent JSON documents).
    #[serde(default = "default_history_backend")]
    pub backend: String,

    /// Directory for the file backend. Defaults to
    /// `~/.unit-agents/histories`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

fn default_history_backend() -> String {
    "remote".into()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            backend: default_history_backend(),
            dir: None,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            openai: OpenAiConfig::default(),
            runner: RunnerSection::default(),
            daemon: DaemonConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("backend_url", &self.backend_url)
            .field("openai", &self.openai)
            .field("runner", &self.runner)
            .field("daemon", &self.daemon)
            .field("history", &self.history)
            .finish()
    }
}

impl std::fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl AppConfig {
    /// The config directory: `~/.unit-agents`.
    pub fn config_dir() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".unit-agents")
    }

    /// Default directory for file-backed histories.
    pub fn histories_dir(&self) -> PathBuf {
        self.history
            .dir
            .clone()
            .unwrap_or_else(|| Self::config_dir().join("histories"))
    }

    /// Load from the default location, then apply environment overrides and
    /// validate. A missing file is not an error — defaults apply.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_dir().join("config.toml");
        let mut config = if path.is_file() {
            Self::from_file(&path)?
        } else {
            debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a specific TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&content)?;
        debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Environment variables win over the file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("UNIT_BACKEND_URL") {
            if !url.is_empty() {
                self.backend_url = url;
            }
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.is_empty() {
                self.openai.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            if !url.is_empty() {
                self.openai.base_url = url;
            }
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.is_empty() {
                self.openai.default_model = model;
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runner.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "runner.max_iterations must be at least 1".into(),
            ));
        }
        // Three transitions per iteration, plus slack for the final stop.
        if self.runner.max_transitions < self.runner.max_iterations * 3 {
            return Err(ConfigError::Invalid(format!(
                "runner.max_transitions ({}) cannot cover {} iterations",
                self.runner.max_transitions, self.runner.max_iterations
            )));
        }
        if self.daemon.max_interval_secs < self.daemon.min_interval_secs {
            return Err(ConfigError::Invalid(
                "daemon.max_interval_secs must be >= daemon.min_interval_secs".into(),
            ));
        }
        if self.daemon.new_agent_odds == 0 {
            return Err(ConfigError::Invalid(
                "daemon.new_agent_odds must be at least 1".into(),
            ));
        }
        match self.history.backend.as_str() {
            "remote" | "file" | "memory" => Ok(()),
            other => Err(ConfigError::Invalid(format!(
                "history.backend must be one of remote|file|memory, got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert_eq!(config.runner.max_iterations, 10);
        assert_eq!(config.runner.max_transitions, 60);
        assert_eq!(config.backend_url, "http://localhost:3000");
        assert_eq!(config.openai.default_model, "gpt-4o-mini");
        assert_eq!(config.history.backend, "remote");
    }

    #[test]
    fn parses_partial_toml() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
backend_url = "https://unit.example.com"

[runner]
max_iterations = 5
max_transitions = 30

[history]
backend = "file"
"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.backend_url, "https://unit.example.com");
        assert_eq!(config.runner.max_iterations, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.daemon.min_interval_secs, 30);
        assert_eq!(config.history.backend, "file");
    }

    #[test]
    fn rejects_transition_ceiling_below_iterations() {
        let config = AppConfig {
            runner: RunnerSection {
                max_iterations: 10,
                max_transitions: 12,
            },
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_unknown_history_backend() {
        let config = AppConfig {
            history: HistoryConfig {
                backend: "carrier-pigeon".into(),
                dir: None,
            },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AppConfig {
            openai: OpenAiConfig {
                api_key: Some("sk-secret".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
