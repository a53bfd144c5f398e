//! Data provider interfaces and their live REST clients.
//!
//! Each trait has a live implementation here and a curated fallback
//! implementation in [`crate::fallback`]. Callers never pick between them
//! directly; [`crate::resilient::Resilient`] does.

pub mod kegg;
pub mod reactome;
pub mod string_db;
pub mod uniprot;

use async_trait::async_trait;
use std::collections::BTreeSet;

use targetscope_common::{DataQuality, DruggabilityEvidence, InteractionEdge, ProteinId, Result};

pub use kegg::KeggClient;
pub use reactome::ReactomeClient;
pub use string_db::StringClient;
pub use uniprot::UniProtClient;

/// A pathway a provider associates with a disease, before participants
/// are fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwaySummary {
    /// Source-qualified id, e.g. `kegg:hsa05200`
    pub pathway_id: String,
    pub name: String,
    pub data_quality: DataQuality,
}

/// Raw annotation as returned by a provider. The annotator turns it into a
/// `ProteinRecord` by applying the druggability heuristic and confidence table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProteinAnnotation {
    pub protein_id: ProteinId,
    pub display_name: String,
    pub function_text: String,
    pub evidence: DruggabilityEvidence,
    /// Curated entry (e.g. Swiss-Prot reviewed).
    pub reviewed: bool,
    pub associated_diseases: Vec<String>,
    /// Curated druggability, bypassing the heuristic.
    pub druggability_override: Option<f64>,
    pub subcellular_locations: Vec<String>,
    pub keywords: Vec<String>,
}

/// Maps diseases to pathways and pathways to participating proteins.
#[async_trait]
pub trait PathwayProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Pathways associated with `disease`. An empty list means the provider
    /// answered and found nothing.
    async fn pathways_for_disease(&self, disease: &str) -> Result<Vec<PathwaySummary>>;

    /// Protein ids participating in `pathway_id`.
    async fn pathway_participants(&self, pathway_id: &str) -> Result<BTreeSet<ProteinId>>;
}

/// Per-protein functional annotation.
#[async_trait]
pub trait AnnotationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// `Ok(None)` when the provider has no entry for `protein_id`.
    async fn annotate(&self, protein_id: &ProteinId) -> Result<Option<ProteinAnnotation>>;
}

/// Protein-protein interaction edges.
#[async_trait]
pub trait InteractionProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Edges touching `protein_id` (and between its partners) with score
    /// at least `threshold`.
    async fn interactions(&self, protein_id: &ProteinId, threshold: u16) -> Result<Vec<InteractionEdge>>;
}

/// Strip inline HTML (Reactome search highlights) from a label.
pub(crate) fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}
