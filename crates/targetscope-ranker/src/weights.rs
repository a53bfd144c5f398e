//! Weight vector for target prioritization scoring.

use serde::{Deserialize, Serialize};

use targetscope_common::{EngineError, Result};

/// Tolerance on the weight sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// The 4-component weight vector W.
/// Weights are non-negative and sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    /// Druggability heuristic (UniProt evidence or curated value)
    #[serde(default = "default_druggability")]
    pub druggability: f64,
    /// Composite network centrality
    #[serde(default = "default_centrality")]
    pub centrality: f64,
    /// Pathway involvement
    #[serde(default = "default_pathway")]
    pub pathway: f64,
    /// Disease association relevance
    #[serde(default = "default_disease")]
    pub disease: f64,
}

fn default_druggability() -> f64 { 0.40 }
fn default_centrality() -> f64 { 0.30 }
fn default_pathway() -> f64 { 0.20 }
fn default_disease() -> f64 { 0.10 }

impl Default for WeightVector {
    fn default() -> Self {
        Self {
            druggability: default_druggability(),
            centrality:   default_centrality(),
            pathway:      default_pathway(),
            disease:      default_disease(),
        }
    }
}

impl WeightVector {
    /// Validated weight vector.
    pub fn new(druggability: f64, centrality: f64, pathway: f64, disease: f64) -> Result<Self> {
        let w = Self { druggability, centrality, pathway, disease };
        w.validate()?;
        Ok(w)
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn validate(&self) -> Result<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::config(format!("scoring weights must be non-negative: {self:?}")));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::config(format!("scoring weights must sum to 1.0, got {sum}")));
        }
        Ok(())
    }

    /// Convert to array for iteration.
    pub fn as_array(&self) -> [f64; 4] {
        [self.druggability, self.centrality, self.pathway, self.disease]
    }
}
