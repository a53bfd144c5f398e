use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use targetscope_common::{EngineError, Result};

use crate::druggability::DruggabilityHeuristic;

/// Provider endpoints, pacing and fallback data location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_kegg_url")]
    pub kegg_base_url: String,
    #[serde(default = "default_reactome_url")]
    pub reactome_base_url: String,
    #[serde(default = "default_uniprot_url")]
    pub uniprot_base_url: String,
    #[serde(default = "default_string_url")]
    pub string_base_url: String,

    /// NCBI taxonomy id (9606 = human)
    #[serde(default = "default_species")]
    pub species: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Minimum interval between two requests to the same provider.
    #[serde(default = "default_interval_ms")]
    pub request_interval_ms: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,

    #[serde(default = "default_max_proteins_per_pathway")]
    pub max_proteins_per_pathway: usize,
    #[serde(default = "default_max_pathways_per_provider")]
    pub max_pathways_per_provider: usize,

    /// Replaces the embedded curated dataset when set.
    #[serde(default)]
    pub fallback_dataset: Option<PathBuf>,

    #[serde(default)]
    pub druggability: DruggabilityHeuristic,
}

fn default_kegg_url() -> String { "https://rest.kegg.jp".to_string() }
fn default_reactome_url() -> String { "https://reactome.org/ContentService".to_string() }
fn default_uniprot_url() -> String { "https://rest.uniprot.org".to_string() }
fn default_string_url() -> String { "https://string-db.org".to_string() }
fn default_species() -> u32 { 9606 }
fn default_timeout_secs() -> u64 { 30 }
fn default_interval_ms() -> u64 { 100 }
fn default_batch_size() -> usize { 10 }
fn default_batch_delay_ms() -> u64 { 100 }
fn default_max_proteins_per_pathway() -> usize { 50 }
fn default_max_pathways_per_provider() -> usize { 25 }

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            kegg_base_url: default_kegg_url(),
            reactome_base_url: default_reactome_url(),
            uniprot_base_url: default_uniprot_url(),
            string_base_url: default_string_url(),
            species: default_species(),
            timeout_secs: default_timeout_secs(),
            request_interval_ms: default_interval_ms(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            max_proteins_per_pathway: default_max_proteins_per_pathway(),
            max_pathways_per_provider: default_max_pathways_per_provider(),
            fallback_dataset: None,
            druggability: DruggabilityHeuristic::default(),
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.request_interval_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EngineError::config("sources.batch_size must be at least 1"));
        }
        if self.timeout_secs == 0 {
            return Err(EngineError::config("sources.timeout_secs must be at least 1"));
        }
        if self.max_proteins_per_pathway == 0 || self.max_pathways_per_provider == 0 {
            return Err(EngineError::config("sources pathway caps must be at least 1"));
        }
        for (name, url) in [
            ("kegg_base_url", &self.kegg_base_url),
            ("reactome_base_url", &self.reactome_base_url),
            ("uniprot_base_url", &self.uniprot_base_url),
            ("string_base_url", &self.string_base_url),
        ] {
            if url::Url::parse(url).is_err() {
                return Err(EngineError::config(format!("sources.{name} is not a valid URL: {url}")));
            }
        }
        self.druggability.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = SourcesConfig::default();
        assert_eq!(c.batch_size, 10);
        assert_eq!(c.request_interval(), Duration::from_millis(100));
        assert_eq!(c.timeout(), Duration::from_secs(30));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_rejected() {
        let c = SourcesConfig { batch_size: 0, ..Default::default() };
        assert!(matches!(c.validate(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_bad_url_rejected() {
        let c = SourcesConfig { kegg_base_url: "not a url".into(), ..Default::default() };
        assert!(c.validate().is_err());
    }
}
