//! Scoring reports: distribution statistics, quality counts and the
//! detailed per-disease report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use targetscope_common::{DataQuality, PathwayRecord, UnresolvedEntity};
use targetscope_network::{Hub, NetworkProperties};

use crate::scorer::TargetScore;
use crate::weights::WeightVector;

/// Summary statistics of one score column. Population standard deviation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Distribution {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl Distribution {
    /// All zeros for an empty input.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Self {
            mean,
            median,
            std: variance.sqrt(),
            min: sorted[0],
            max: sorted[sorted.len() - 1],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreDistributions {
    pub final_score: Distribution,
    pub druggability: Distribution,
    pub centrality: Distribution,
    pub pathway: Distribution,
    pub disease: Distribution,
    pub confidence: Distribution,
}

impl ScoreDistributions {
    pub fn from_scores(scores: &[TargetScore]) -> Self {
        let column = |f: fn(&TargetScore) -> f64| {
            let values: Vec<f64> = scores.iter().map(f).collect();
            Distribution::from_values(&values)
        };
        Self {
            final_score:  column(|s| s.final_score),
            druggability: column(|s| s.druggability_score),
            centrality:   column(|s| s.centrality_score),
            pathway:      column(|s| s.pathway_score),
            disease:      column(|s| s.disease_score),
            confidence:   column(|s| s.confidence_score),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityCounts {
    pub live: usize,
    pub fallback: usize,
    pub generic: usize,
}

impl DataQualityCounts {
    pub fn from_scores(scores: &[TargetScore]) -> Self {
        let mut counts = Self::default();
        for s in scores {
            match s.data_quality {
                DataQuality::Live     => counts.live += 1,
                DataQuality::Fallback => counts.fallback += 1,
                DataQuality::Generic  => counts.generic += 1,
            }
        }
        counts
    }
}

/// Summary of one ranking run. Statistics cover every scored protein, not
/// only the rows kept after truncation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringReport {
    pub disease: String,
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub pathway_count: usize,
    pub protein_count: usize,
    pub scored_count: usize,
    pub excluded_count: usize,
    pub excluded_entities: Vec<UnresolvedEntity>,
    pub top_target: Option<String>,
    pub distributions: ScoreDistributions,
    pub weights: WeightVector,
    pub data_quality: DataQualityCounts,
    pub top_targets: Vec<TargetScore>,
}

/// Inputs describing the run that produced `scores`.
pub struct RunSummary<'a> {
    pub disease: &'a str,
    pub run_id: Uuid,
    pub pathway_count: usize,
    pub protein_count: usize,
    pub excluded: &'a [UnresolvedEntity],
    pub weights: WeightVector,
}

/// Build a report over ranked `scores`; `top_n` rows are embedded.
pub fn create_scoring_report(run: RunSummary<'_>, scores: &[TargetScore], top_n: usize) -> ScoringReport {
    ScoringReport {
        disease: run.disease.to_string(),
        run_id: run.run_id,
        generated_at: Utc::now(),
        pathway_count: run.pathway_count,
        protein_count: run.protein_count,
        scored_count: scores.len(),
        excluded_count: run.excluded.len(),
        excluded_entities: run.excluded.to_vec(),
        top_target: scores.first().map(|s| s.protein_id.to_string()),
        distributions: ScoreDistributions::from_scores(scores),
        weights: run.weights,
        data_quality: DataQualityCounts::from_scores(scores),
        top_targets: scores.iter().take(top_n).cloned().collect(),
    }
}

/// Pathway listing entry of a detailed report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayDetail {
    pub pathway_id: String,
    pub name: String,
    pub source_provider: String,
    pub protein_count: usize,
    pub data_quality: DataQuality,
}

impl From<&PathwayRecord> for PathwayDetail {
    fn from(p: &PathwayRecord) -> Self {
        Self {
            pathway_id: p.pathway_id.clone(),
            name: p.name.clone(),
            source_provider: p.source_provider.clone(),
            protein_count: p.protein_ids.len(),
            data_quality: p.data_quality,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedReport {
    pub report: ScoringReport,
    /// Largest pathways first.
    pub pathways: Vec<PathwayDetail>,
    pub network: Option<NetworkProperties>,
    pub hubs: Vec<Hub>,
    pub cluster_count: usize,
}

/// Per-disease entry of a comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DiseaseSummary {
    Ranked {
        run_id: Uuid,
        total_targets: usize,
        top_target: Option<String>,
        top_score: Option<f64>,
        avg_druggability: f64,
        avg_centrality: f64,
        data_quality: DataQualityCounts,
        targets: Vec<TargetScore>,
    },
    Failed {
        error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distribution_stats() {
        let d = Distribution::from_values(&[1.0, 2.0, 3.0, 4.0]);
        assert!((d.mean - 2.5).abs() < 1e-12);
        assert!((d.median - 2.5).abs() < 1e-12);
        assert!((d.std - 1.25f64.sqrt()).abs() < 1e-12);
        assert_eq!((d.min, d.max), (1.0, 4.0));

        let odd = Distribution::from_values(&[5.0, 1.0, 3.0]);
        assert_eq!(odd.median, 3.0);
    }

    #[test]
    fn test_empty_distribution_is_zero() {
        assert_eq!(Distribution::from_values(&[]), Distribution::default());
    }

    #[test]
    fn test_report_serialises_to_json() {
        let report = create_scoring_report(
            RunSummary {
                disease: "cancer",
                run_id: Uuid::new_v4(),
                pathway_count: 0,
                protein_count: 0,
                excluded: &[],
                weights: WeightVector::default(),
            },
            &[],
            10,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["disease"], "cancer");
        assert_eq!(json["scored_count"], 0);
        assert!(json["top_target"].is_null());
        assert!(json["distributions"]["final_score"]["mean"].is_number());
    }
}
