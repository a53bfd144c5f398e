//! Core records exchanged between the resolver, annotator, network builder
//! and scorer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ---------------------------------------------------------------------------
// Protein identifier
// ---------------------------------------------------------------------------

/// Normalised protein identifier (upper-cased gene symbol or accession).
///
/// Source prefixes such as `gene:`, `uniprot:` or `hsa:` are stripped so that
/// ids coming from KEGG, Reactome, UniProt and STRING collapse onto the same
/// key. UniProt mnemonics (`P53_HUMAN`) are kept whole; their prefix is not a
/// gene symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProteinId(String);

impl ProteinId {
    /// Parse a raw identifier. Returns `None` when nothing usable remains.
    pub fn parse(raw: &str) -> Option<Self> {
        let id = normalise_protein_id(raw);
        if id.is_empty() {
            None
        } else {
            Some(Self(id))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProteinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProteinId {
    fn from(raw: &str) -> Self {
        Self(normalise_protein_id(raw))
    }
}

fn normalise_protein_id(raw: &str) -> String {
    let trimmed = raw.trim();
    let bare = trimmed.rsplit(':').next().unwrap_or(trimmed);
    bare.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_'))
        .collect()
}

// ---------------------------------------------------------------------------
// Data quality flags
// ---------------------------------------------------------------------------

/// Where a record's data came from. Ordered from best to worst so that
/// `max()` over contributing inputs gives the weakest provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataQuality {
    /// Fetched from a live provider.
    Live,
    /// Curated fallback data for a recognised entity or disease category.
    Fallback,
    /// Generic fallback used for an unrecognised disease.
    Generic,
}

impl DataQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataQuality::Live     => "live",
            DataQuality::Fallback => "fallback",
            DataQuality::Generic  => "generic",
        }
    }
}

impl fmt::Display for DataQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-node tag describing how much the interaction graph knows about a protein.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkQuality {
    /// Live provider returned interactions touching this node.
    Measured,
    /// Live provider answered and reported no interactions above threshold.
    MeasuredIsolate,
    /// Interactions came from the curated fallback edge set.
    Fallback,
    /// Neither live nor fallback data was available.
    NoData,
    /// Network analysis was not run.
    Skipped,
}

impl NetworkQuality {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkQuality::Measured        => "measured",
            NetworkQuality::MeasuredIsolate => "measured_isolate",
            NetworkQuality::Fallback        => "fallback",
            NetworkQuality::NoData          => "no_data",
            NetworkQuality::Skipped         => "skipped",
        }
    }

    /// Merge two observations of the same node; live evidence wins.
    pub fn merge(self, other: NetworkQuality) -> NetworkQuality {
        self.min(other)
    }
}

impl fmt::Display for NetworkQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pathway
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayRecord {
    /// Source-qualified id, e.g. `kegg:hsa05200`.
    pub pathway_id: String,
    pub name: String,
    pub source_provider: String,
    pub protein_ids: BTreeSet<ProteinId>,
    pub data_quality: DataQuality,
}

impl PathwayRecord {
    /// Keep only the first `cap` protein ids in ascending id order.
    pub fn truncate_proteins(&mut self, cap: usize) {
        if self.protein_ids.len() > cap {
            self.protein_ids = self.protein_ids.iter().take(cap).cloned().collect();
        }
    }
}

// ---------------------------------------------------------------------------
// Protein
// ---------------------------------------------------------------------------

/// Raw evidence the druggability heuristic was computed from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DruggabilityEvidence {
    pub binding_sites: u32,
    pub ligand_count: u32,
    pub structural_class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteinRecord {
    pub protein_id: ProteinId,
    pub display_name: String,
    pub function_text: String,
    /// 0.0–1.0
    pub druggability_score: f64,
    /// 0.0–1.0, annotation confidence of the providing source
    pub confidence: f64,
    pub source_provider: String,
    pub data_quality: DataQuality,
    #[serde(default)]
    pub associated_diseases: Vec<String>,
    #[serde(default)]
    pub evidence: DruggabilityEvidence,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcellular_locations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

// ---------------------------------------------------------------------------
// Interaction edge
// ---------------------------------------------------------------------------

/// Maximum STRING combined score.
pub const MAX_INTERACTION_SCORE: u16 = 1000;

/// Undirected interaction, stored with `protein_a < protein_b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InteractionEdge {
    pub protein_a: ProteinId,
    pub protein_b: ProteinId,
    /// 0–1000
    pub confidence_score: u16,
}

impl InteractionEdge {
    /// Build a canonical edge. Self-loops are rejected.
    pub fn new(a: ProteinId, b: ProteinId, score: u16) -> Option<Self> {
        if a == b {
            return None;
        }
        let (protein_a, protein_b) = if a < b { (a, b) } else { (b, a) };
        Some(Self {
            protein_a,
            protein_b,
            confidence_score: score.min(MAX_INTERACTION_SCORE),
        })
    }

    /// Confidence rescaled to [0, 1].
    pub fn weight(&self) -> f64 {
        f64::from(self.confidence_score) / f64::from(MAX_INTERACTION_SCORE)
    }

    pub fn key(&self) -> (ProteinId, ProteinId) {
        (self.protein_a.clone(), self.protein_b.clone())
    }

    pub fn touches(&self, id: &ProteinId) -> bool {
        &self.protein_a == id || &self.protein_b == id
    }
}

// ---------------------------------------------------------------------------
// Excluded entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Pathway,
    Protein,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Pathway => f.write_str("pathway"),
            EntityKind::Protein => f.write_str("protein"),
        }
    }
}

/// An entity dropped from the working set, surfaced in reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedEntity {
    pub kind: EntityKind,
    pub id: String,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protein_id_normalisation() {
        assert_eq!(ProteinId::from("gene:tp53").as_str(), "TP53");
        assert_eq!(ProteinId::from("uniprot:P04637").as_str(), "P04637");
        assert_eq!(ProteinId::from("  HLA-A ").as_str(), "HLA-A");
        assert!(ProteinId::parse("gene:").is_none());
    }

    #[test]
    fn test_uniprot_mnemonic_kept_whole() {
        // P53_HUMAN is the mnemonic of TP53; "P53" would be a different key
        assert_eq!(ProteinId::from("p53_human").as_str(), "P53_HUMAN");
        assert_eq!(ProteinId::from("uniprot:EGFR_HUMAN").as_str(), "EGFR_HUMAN");
        assert_ne!(ProteinId::from("P53_HUMAN"), ProteinId::from("TP53"));
    }

    #[test]
    fn test_edge_is_canonical() {
        let e1 = InteractionEdge::new("TP53".into(), "MDM2".into(), 999).unwrap();
        let e2 = InteractionEdge::new("MDM2".into(), "TP53".into(), 999).unwrap();
        assert_eq!(e1, e2);
        assert_eq!(e1.protein_a.as_str(), "MDM2");
    }

    #[test]
    fn test_edge_rejects_self_loop_and_clamps() {
        assert!(InteractionEdge::new("EGFR".into(), "EGFR".into(), 500).is_none());
        let e = InteractionEdge::new("EGFR".into(), "GRB2".into(), 4000).unwrap();
        assert_eq!(e.confidence_score, 1000);
        assert!((e.weight() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_network_quality_merge_prefers_live() {
        assert_eq!(
            NetworkQuality::Fallback.merge(NetworkQuality::Measured),
            NetworkQuality::Measured
        );
        assert_eq!(
            NetworkQuality::NoData.merge(NetworkQuality::Fallback),
            NetworkQuality::Fallback
        );
    }

    #[test]
    fn test_pathway_truncation_is_stable() {
        let mut p = PathwayRecord {
            pathway_id: "curated:test".to_string(),
            name: "Test".to_string(),
            source_provider: "curated".to_string(),
            protein_ids: ["MYC", "AKT1", "TP53", "EGFR"].iter().map(|s| ProteinId::from(*s)).collect(),
            data_quality: DataQuality::Fallback,
        };
        p.truncate_proteins(2);
        let kept: Vec<&str> = p.protein_ids.iter().map(|p| p.as_str()).collect();
        assert_eq!(kept, vec!["AKT1", "EGFR"]);
    }
}
