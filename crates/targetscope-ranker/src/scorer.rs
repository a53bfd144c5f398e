//! Composite target score computation.
//!
//! final = w1·druggability + w2·centrality + w3·pathway + w4·disease
//! confidence = min(annotation, network quality, pathway reliability)

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use targetscope_common::{
    weakest_link, ConfidenceTable, DataQuality, EngineError, NetworkQuality, ProteinId, ProteinRecord, Result,
};

use crate::normalise::{disease_score, pathway_score};
use crate::weights::WeightVector;

/// Weights, caps and confidence policy for one scoring run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    #[serde(default)]
    pub weights: WeightVector,
    #[serde(default = "default_cap")]
    pub pathway_cap: usize,
    #[serde(default = "default_cap")]
    pub disease_cap: usize,
    #[serde(default)]
    pub confidence: ConfidenceTable,
}

fn default_cap() -> usize { 5 }

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            weights: WeightVector::default(),
            pathway_cap: default_cap(),
            disease_cap: default_cap(),
            confidence: ConfidenceTable::default(),
        }
    }
}

impl ScoringSettings {
    pub fn validate(&self) -> Result<()> {
        self.weights.validate()?;
        if self.pathway_cap == 0 || self.disease_cap == 0 {
            return Err(EngineError::config("scoring caps must be at least 1"));
        }
        if !self.confidence.is_valid() {
            return Err(EngineError::config("confidence table values must be in [0, 1]"));
        }
        Ok(())
    }
}

/// Per-protein inputs gathered by the pipeline, besides the annotation itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSignals {
    /// Weighted centrality composite, already in [0, 1].
    pub centrality_score: f64,
    pub network_quality: NetworkQuality,
    pub pathway_count: usize,
    /// Best quality among the protein's pathways.
    pub pathway_quality: DataQuality,
    pub disease_matches: usize,
}

/// Weighted contribution of each component; sums to `final_score`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub druggability: f64,
    pub centrality: f64,
    pub pathway: f64,
    pub disease: f64,
}

impl ScoreComponents {
    pub fn total(&self) -> f64 {
        self.druggability + self.centrality + self.pathway + self.disease
    }
}

/// Final scored target result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetScore {
    pub protein_id: ProteinId,
    pub display_name: String,
    pub druggability_score: f64,
    pub centrality_score: f64,
    pub pathway_score: f64,
    pub disease_score: f64,
    pub final_score: f64,
    pub confidence_score: f64,
    /// 1-based; 0 until ranked.
    pub rank: usize,
    pub components: ScoreComponents,
    pub data_quality: DataQuality,
    pub network_quality: NetworkQuality,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcellular_locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

/// Score one protein. All ranking entry points route through here.
pub fn score_target(protein: &ProteinRecord, signals: &TargetSignals, settings: &ScoringSettings) -> TargetScore {
    let w = &settings.weights;
    let druggability = protein.druggability_score.clamp(0.0, 1.0);
    let centrality = signals.centrality_score.clamp(0.0, 1.0);
    let pathway = pathway_score(signals.pathway_count, settings.pathway_cap);
    let disease = disease_score(signals.disease_matches, settings.disease_cap);

    let components = ScoreComponents {
        druggability: w.druggability * druggability,
        centrality:   w.centrality * centrality,
        pathway:      w.pathway * pathway,
        disease:      w.disease * disease,
    };

    let table = &settings.confidence;
    let confidence_score = weakest_link(&[
        protein.confidence,
        table.network(signals.network_quality),
        table.pathway(signals.pathway_quality),
    ]);

    let network_data = match signals.network_quality {
        NetworkQuality::Fallback => DataQuality::Fallback,
        _ => DataQuality::Live,
    };
    let data_quality = protein.data_quality.max(signals.pathway_quality).max(network_data);

    TargetScore {
        protein_id: protein.protein_id.clone(),
        display_name: protein.display_name.clone(),
        druggability_score: druggability,
        centrality_score: centrality,
        pathway_score: pathway,
        disease_score: disease,
        final_score: components.total(),
        confidence_score,
        rank: 0,
        components,
        data_quality,
        network_quality: signals.network_quality,
        subcellular_locations: protein.subcellular_locations.clone(),
        keywords: protein.keywords.clone(),
    }
}

/// final_score descending, then confidence descending, then protein id ascending.
pub fn compare_scores(a: &TargetScore, b: &TargetScore) -> Ordering {
    b.final_score
        .total_cmp(&a.final_score)
        .then_with(|| b.confidence_score.total_cmp(&a.confidence_score))
        .then_with(|| a.protein_id.cmp(&b.protein_id))
}

/// Sort and assign ranks 1..N.
pub fn rank_targets(scores: &mut [TargetScore]) {
    scores.sort_by(compare_scores);
    for (i, s) in scores.iter_mut().enumerate() {
        s.rank = i + 1;
    }
}

/// Score and rank a list of proteins.
pub fn score_target_list(inputs: &[(ProteinRecord, TargetSignals)], settings: &ScoringSettings) -> Vec<TargetScore> {
    let mut scores: Vec<TargetScore> = inputs
        .iter()
        .map(|(protein, signals)| score_target(protein, signals, settings))
        .collect();
    rank_targets(&mut scores);
    scores
}
