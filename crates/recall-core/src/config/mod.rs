//! Configuration system for recall.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{RecallError, RecallResult};
use crate::scheduling::{IntervalConfig, IntervalPolicy};
use crate::traits::{StoreConfig, StoreProvider};
use crate::types::ReviewWeights;

/// Main scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Per-kind session budget costs.
    pub weights: ReviewWeights,
    /// Interval policy.
    pub interval: IntervalConfig,
    /// Session size used when a caller gives none.
    pub default_session_limit: u32,
    /// Cap on rows fetched per kind when building a queue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_candidates_per_kind: Option<usize>,
    /// Storage backend.
    pub store: StoreConfig,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            weights: ReviewWeights::default(),
            interval: IntervalConfig::default(),
            default_session_limit: 10,
            max_candidates_per_kind: None,
            store: StoreConfig::default(),
        }
    }
}

impl RecallConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<std::path::Path>) -> RecallResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        let config: Self = match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| RecallError::Configuration(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| RecallError::Configuration(e.to_string()))?,
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| RecallError::Configuration(e.to_string()))?,
            _ => {
                return Err(RecallError::Configuration(
                    "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> RecallResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> RecallResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        // Store configuration
        if let Some(provider) = lookup("RECALL_STORE_PROVIDER") {
            config.store.provider = provider
                .parse::<StoreProvider>()
                .map_err(RecallError::Configuration)?;
        }
        if let Some(path) = lookup("RECALL_DB_PATH") {
            config.store.path = PathBuf::from(path);
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            config.store.url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_SERVICE_ROLE_KEY") {
            config.store.api_key = Some(key);
        }

        // Scheduling
        if let Some(policy) = lookup("RECALL_INTERVAL_POLICY") {
            config.interval.policy = policy
                .parse::<IntervalPolicy>()
                .map_err(RecallError::Configuration)?;
        }
        if let Some(limit) = lookup("RECALL_SESSION_LIMIT") {
            config.default_session_limit = limit.trim().parse().map_err(|_| {
                RecallError::Configuration(format!("invalid RECALL_SESSION_LIMIT '{}'", limit))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject zero weights, zero-day intervals and shrinking growth.
    pub fn validate(&self) -> RecallResult<()> {
        self.weights.validate()?;
        self.interval.validate()?;
        if self.store.provider == StoreProvider::Supabase && self.store.url.is_none() {
            return Err(RecallError::Configuration(
                "supabase store requires a url".to_string(),
            ));
        }
        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> RecallConfigBuilder {
        RecallConfigBuilder::default()
    }
}

/// Builder for RecallConfig.
#[derive(Default)]
pub struct RecallConfigBuilder {
    config: RecallConfig,
}

impl RecallConfigBuilder {
    /// Set per-kind weights.
    pub fn weights(mut self, weights: ReviewWeights) -> Self {
        self.config.weights = weights;
        self
    }

    /// Set the interval policy configuration.
    pub fn interval(mut self, interval: IntervalConfig) -> Self {
        self.config.interval = interval;
        self
    }

    /// Select an interval policy with its default parameters.
    pub fn interval_policy(mut self, policy: IntervalPolicy) -> Self {
        self.config.interval.policy = policy;
        self
    }

    pub fn default_session_limit(mut self, limit: u32) -> Self {
        self.config.default_session_limit = limit;
        self
    }

    pub fn max_candidates_per_kind(mut self, cap: usize) -> Self {
        self.config.max_candidates_per_kind = Some(cap);
        self
    }

    /// Set storage configuration.
    pub fn store(mut self, store: StoreConfig) -> Self {
        self.config.store = store;
        self
    }

    /// Build and validate the configuration.
    pub fn build(self) -> RecallResult<RecallConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResourceKind;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RecallConfig::default();
        assert_eq!(config.default_session_limit, 10);
        assert_eq!(config.interval.policy, IntervalPolicy::Fixed);
        assert_eq!(config.weights.weight(ResourceKind::ConceptMap), 2);
        assert!(config.store.path.ends_with("recall.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("RECALL_STORE_PROVIDER", "memory"),
            ("RECALL_INTERVAL_POLICY", "exponential"),
            ("RECALL_SESSION_LIMIT", "6"),
        ]
        .into_iter()
        .collect();

        let config = RecallConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.store.provider, StoreProvider::Memory);
        assert_eq!(config.interval.policy, IntervalPolicy::Exponential);
        assert_eq!(config.default_session_limit, 6);
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        let bad_policy = RecallConfig::from_lookup(|k| {
            (k == "RECALL_INTERVAL_POLICY").then(|| "weekly".to_string())
        });
        assert!(matches!(bad_policy, Err(RecallError::Configuration(_))));

        let supabase_without_url = RecallConfig::from_lookup(|k| {
            (k == "RECALL_STORE_PROVIDER").then(|| "supabase".to_string())
        });
        assert!(supabase_without_url.is_err());
    }

    #[test]
    fn test_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
default_session_limit = 12

[weights]
storyboard = 3

[interval]
policy = "fsrs"
max_days = 90

[store]
provider = "memory"
"#
        )
        .unwrap();

        let config = RecallConfig::from_file(file.path()).unwrap();
        assert_eq!(config.default_session_limit, 12);
        assert_eq!(config.weights.weight(ResourceKind::Storyboard), 3);
        assert_eq!(config.weights.weight(ResourceKind::Flashcard), 1);
        assert_eq!(config.interval.policy, IntervalPolicy::Fsrs);
        assert_eq!(config.interval.max_days, 90);
        assert_eq!(config.store.provider, StoreProvider::Memory);
    }

    #[test]
    fn test_from_file_rejects_unknown_extension_and_invalid_values() {
        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        assert!(RecallConfig::from_file(file.path()).is_err());

        let mut yaml = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(yaml, "weights:\n  flashcard: 0").unwrap();
        assert!(RecallConfig::from_file(yaml.path()).is_err());
    }

    #[test]
    fn test_builder() {
        let config = RecallConfig::builder()
            .interval_policy(IntervalPolicy::Exponential)
            .default_session_limit(4)
            .max_candidates_per_kind(25)
            .build()
            .unwrap();
        assert_eq!(config.interval.policy, IntervalPolicy::Exponential);
        assert_eq!(config.max_candidates_per_kind, Some(25));

        let invalid = RecallConfig::builder()
            .interval(IntervalConfig {
                growth: 0.5,
                ..IntervalConfig::default()
            })
            .build();
        assert!(invalid.is_err());
    }
}
