//! Confidence model for ranked targets.
//!
//! The final confidence of a target is the minimum over annotation
//! confidence, network quality confidence and pathway source reliability.

use serde::{Deserialize, Serialize};

use crate::entities::{DataQuality, NetworkQuality};

/// Lookup table mapping data quality flags to confidence values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceTable {
    #[serde(default = "default_measured")]
    pub network_measured: f64,
    #[serde(default = "default_measured_isolate")]
    pub network_measured_isolate: f64,
    #[serde(default = "default_half")]
    pub network_fallback: f64,
    #[serde(default = "default_no_data")]
    pub network_no_data: f64,
    #[serde(default = "default_half")]
    pub network_skipped: f64,

    #[serde(default = "default_measured")]
    pub pathway_live: f64,
    #[serde(default = "default_half")]
    pub pathway_fallback: f64,
    #[serde(default = "default_generic")]
    pub pathway_generic: f64,

    /// Confidence assigned to fallback protein annotations.
    #[serde(default = "default_half")]
    pub fallback_annotation: f64,
}

fn default_measured() -> f64 { 1.0 }
fn default_measured_isolate() -> f64 { 0.8 }
fn default_half() -> f64 { 0.5 }
fn default_no_data() -> f64 { 0.3 }
fn default_generic() -> f64 { 0.2 }

impl Default for ConfidenceTable {
    fn default() -> Self {
        Self {
            network_measured: default_measured(),
            network_measured_isolate: default_measured_isolate(),
            network_fallback: default_half(),
            network_no_data: default_no_data(),
            network_skipped: default_half(),
            pathway_live: default_measured(),
            pathway_fallback: default_half(),
            pathway_generic: default_generic(),
            fallback_annotation: default_half(),
        }
    }
}

impl ConfidenceTable {
    pub fn network(&self, quality: NetworkQuality) -> f64 {
        match quality {
            NetworkQuality::Measured        => self.network_measured,
            NetworkQuality::MeasuredIsolate => self.network_measured_isolate,
            NetworkQuality::Fallback        => self.network_fallback,
            NetworkQuality::NoData          => self.network_no_data,
            NetworkQuality::Skipped         => self.network_skipped,
        }
    }

    pub fn pathway(&self, quality: DataQuality) -> f64 {
        match quality {
            DataQuality::Live     => self.pathway_live,
            DataQuality::Fallback => self.pathway_fallback,
            DataQuality::Generic  => self.pathway_generic,
        }
    }

    /// All entries must lie in [0, 1].
    pub fn is_valid(&self) -> bool {
        [
            self.network_measured,
            self.network_measured_isolate,
            self.network_fallback,
            self.network_no_data,
            self.network_skipped,
            self.pathway_live,
            self.pathway_fallback,
            self.pathway_generic,
            self.fallback_annotation,
        ]
        .iter()
        .all(|v| (0.0..=1.0).contains(v))
    }
}

/// Weakest-link aggregation: the minimum of the inputs, clamped to [0, 1].
/// An empty slice yields 0.0.
pub fn weakest_link(confidences: &[f64]) -> f64 {
    if confidences.is_empty() {
        return 0.0;
    }
    confidences
        .iter()
        .copied()
        .fold(1.0_f64, f64::min)
        .clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weakest_link_takes_minimum() {
        assert!((weakest_link(&[0.9, 0.5, 1.0]) - 0.5).abs() < 1e-12);
        assert!((weakest_link(&[0.2]) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_weakest_link_empty_is_zero() {
        assert_eq!(weakest_link(&[]), 0.0);
    }

    #[test]
    fn test_default_table_values() {
        let t = ConfidenceTable::default();
        assert_eq!(t.network(NetworkQuality::MeasuredIsolate), 0.8);
        assert_eq!(t.network(NetworkQuality::NoData), 0.3);
        assert_eq!(t.pathway(DataQuality::Generic), 0.2);
        assert!(t.is_valid());
    }

    #[test]
    fn test_partial_table_deserialises_with_defaults() {
        let t: ConfidenceTable = serde_json::from_str(r#"{"pathway_generic": 0.1}"#).unwrap();
        assert_eq!(t.pathway_generic, 0.1);
        assert_eq!(t.network_measured, 1.0);
    }
}
