use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use targetscope_common::{EngineError, Result, MAX_INTERACTION_SCORE};
use targetscope_network::{CentralitySettings, CentralityWeights};
use targetscope_sources::SourcesConfig;

use crate::scorer::ScoringSettings;

/// Complete engine configuration. Loaded once and shared read-only by a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Minimum STRING combined score (1-1000)
    #[serde(default = "default_threshold")]
    pub score_threshold: u16,
    #[serde(default)]
    pub weights: CentralityWeights,
    #[serde(default)]
    pub centrality: CentralitySettings,
}

fn default_threshold() -> u16 { 400 }

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_threshold(),
            weights: CentralityWeights::default(),
            centrality: CentralitySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Rows embedded in reports
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    #[serde(default = "default_max_targets")]
    pub max_targets: usize,
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,
}

fn default_top_n() -> usize { 10 }
fn default_max_targets() -> usize { 50 }
fn default_export_dir() -> PathBuf { PathBuf::from("results") }

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            max_targets: default_max_targets(),
            export_dir: default_export_dir(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EngineError::config(format!("invalid TOML config: {e}")))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| EngineError::config(format!("invalid YAML config: {e}")))
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| EngineError::config(format!("invalid JSON config: {e}")))
    }

    /// Parse by file extension: `.yaml`/`.yml`, `.json`, anything else as TOML.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content),
            Some("json")               => Self::from_json_str(&content),
            _                          => Self::from_toml_str(&content),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::config(format!("cannot render config: {e}")))
    }

    pub fn validate(&self) -> Result<()> {
        self.sources.validate()?;
        if !(1..=MAX_INTERACTION_SCORE).contains(&self.network.score_threshold) {
            return Err(EngineError::config(format!(
                "network.score_threshold must be in 1..={MAX_INTERACTION_SCORE}, got {}",
                self.network.score_threshold
            )));
        }
        self.network.weights.validate()?;
        self.network.centrality.validate()?;
        self.scoring.validate()?;
        if self.output.top_n == 0 || self.output.max_targets == 0 {
            return Err(EngineError::config("output.top_n and output.max_targets must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_toml_is_default() {
        let c = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(c, EngineConfig::default());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_overrides() {
        let c = EngineConfig::from_toml_str(
            r#"
            [network]
            score_threshold = 700

            [scoring.weights]
            druggability = 0.25
            centrality = 0.25
            pathway = 0.25
            disease = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(c.network.score_threshold, 700);
        assert_eq!(c.scoring.weights.disease, 0.25);
        assert_eq!(c.scoring.pathway_cap, 5);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_yaml_and_json_sources() {
        let y = EngineConfig::from_yaml_str("sources:\n  batch_size: 3\n").unwrap();
        assert_eq!(y.sources.batch_size, 3);
        let j = EngineConfig::from_json_str(r#"{"output": {"top_n": 4}}"#).unwrap();
        assert_eq!(j.output.top_n, 4);
    }

    #[test]
    fn test_bad_weights_fail_validation() {
        let c = EngineConfig::from_toml_str(
            "[scoring.weights]\ndruggability = 0.5\ncentrality = 0.5\npathway = 0.1\ndisease = 0.1\n",
        )
        .unwrap();
        assert!(matches!(c.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_threshold_out_of_range() {
        let mut c = EngineConfig::default();
        c.network.score_threshold = 0;
        assert!(c.validate().is_err());
        c.network.score_threshold = 1001;
        assert!(c.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let c = EngineConfig::default();
        let parsed = EngineConfig::from_toml_str(&c.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, c);
    }
}
