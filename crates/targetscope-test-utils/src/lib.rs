//! Simulated providers for exercising the resolution stages without network
//! access.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use targetscope_common::{DataQuality, DruggabilityEvidence, EngineError, InteractionEdge, ProteinId, Result};
use targetscope_sources::{
    AnnotationProvider, InteractionProvider, LiveProviders, PathwayProvider, PathwaySummary, ProteinAnnotation,
};

// ── Failing provider ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    Unavailable,
    Malformed,
}

/// Provider that fails every call in the same way. Implements all three
/// provider traits.
pub struct FailingProvider {
    name: String,
    failure: Failure,
    calls: AtomicUsize,
}

impl FailingProvider {
    pub fn new(name: &str, failure: Failure) -> Self {
        Self {
            name: name.to_string(),
            failure,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn unavailable(name: &str) -> Self {
        Self::new(name, Failure::Unavailable)
    }

    pub fn malformed(name: &str) -> Self {
        Self::new(name, Failure::Malformed)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(match self.failure {
            Failure::Unavailable => EngineError::unavailable(self.name.as_str(), "simulated outage"),
            Failure::Malformed   => EngineError::malformed(self.name.as_str(), "simulated bad payload"),
        })
    }
}

#[async_trait]
impl PathwayProvider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pathways_for_disease(&self, _disease: &str) -> Result<Vec<PathwaySummary>> {
        self.fail()
    }

    async fn pathway_participants(&self, _pathway_id: &str) -> Result<BTreeSet<ProteinId>> {
        self.fail()
    }
}

#[async_trait]
impl AnnotationProvider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn annotate(&self, _protein_id: &ProteinId) -> Result<Option<ProteinAnnotation>> {
        self.fail()
    }
}

#[async_trait]
impl InteractionProvider for FailingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn interactions(&self, _protein_id: &ProteinId, _threshold: u16) -> Result<Vec<InteractionEdge>> {
        self.fail()
    }
}

/// Live providers that are all down.
pub fn offline_providers() -> LiveProviders {
    LiveProviders {
        kegg: Arc::new(FailingProvider::unavailable("kegg")),
        reactome: Arc::new(FailingProvider::unavailable("reactome")),
        uniprot: Arc::new(FailingProvider::unavailable("uniprot")),
        string: Arc::new(FailingProvider::unavailable("string")),
    }
}

// ── Scripted providers ─────────────────────────────────────────────────────

/// Pathway provider answering from an in-memory table.
pub struct MockPathwayProvider {
    name: String,
    diseases: HashMap<String, Vec<String>>,
    pathways: HashMap<String, (String, BTreeSet<ProteinId>)>,
}

impl MockPathwayProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            diseases: HashMap::new(),
            pathways: HashMap::new(),
        }
    }

    /// Register a pathway and associate it with `disease` (lower-cased).
    pub fn with_pathway(mut self, disease: &str, pathway_id: &str, name: &str, proteins: &[&str]) -> Self {
        self.diseases
            .entry(disease.to_lowercase())
            .or_default()
            .push(pathway_id.to_string());
        self.pathways.insert(
            pathway_id.to_string(),
            (name.to_string(), proteins.iter().filter_map(|p| ProteinId::parse(p)).collect()),
        );
        self
    }
}

#[async_trait]
impl PathwayProvider for MockPathwayProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pathways_for_disease(&self, disease: &str) -> Result<Vec<PathwaySummary>> {
        let ids = self.diseases.get(&disease.to_lowercase()).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .map(|id| PathwaySummary {
                name: self.pathways.get(&id).map(|(n, _)| n.clone()).unwrap_or_default(),
                pathway_id: id,
                data_quality: DataQuality::Live,
            })
            .collect())
    }

    async fn pathway_participants(&self, pathway_id: &str) -> Result<BTreeSet<ProteinId>> {
        self.pathways
            .get(pathway_id)
            .map(|(_, p)| p.clone())
            .ok_or_else(|| EngineError::malformed(self.name.as_str(), format!("unknown pathway {pathway_id}")))
    }
}

/// Annotation provider answering from an in-memory table; unknown ids get `Ok(None)`.
pub struct MockAnnotationProvider {
    name: String,
    entries: HashMap<ProteinId, ProteinAnnotation>,
    calls: AtomicUsize,
}

impl MockAnnotationProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with(mut self, annotation: ProteinAnnotation) -> Self {
        self.entries.insert(annotation.protein_id.clone(), annotation);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnnotationProvider for MockAnnotationProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn annotate(&self, protein_id: &ProteinId) -> Result<Option<ProteinAnnotation>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.entries.get(protein_id).cloned())
    }
}

/// Reviewed annotation with the given druggability evidence.
pub fn annotation(
    id: &str,
    binding_sites: u32,
    ligand_count: u32,
    structural_class: Option<&str>,
    diseases: &[&str],
) -> ProteinAnnotation {
    ProteinAnnotation {
        protein_id: ProteinId::from(id),
        display_name: format!("{id} protein"),
        function_text: String::new(),
        evidence: DruggabilityEvidence {
            binding_sites,
            ligand_count,
            structural_class: structural_class.map(str::to_string),
        },
        reviewed: true,
        associated_diseases: diseases.iter().map(|d| d.to_string()).collect(),
        druggability_override: None,
        subcellular_locations: Vec::new(),
        keywords: Vec::new(),
    }
}

/// Interaction provider over a fixed edge list; unknown ids have no edges.
pub struct MockInteractionProvider {
    name: String,
    edges: Vec<InteractionEdge>,
}

impl MockInteractionProvider {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            edges: Vec::new(),
        }
    }

    pub fn with_edge(mut self, a: &str, b: &str, score: u16) -> Self {
        if let Some(edge) = InteractionEdge::new(a.into(), b.into(), score) {
            self.edges.push(edge);
        }
        self
    }
}

#[async_trait]
impl InteractionProvider for MockInteractionProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn interactions(&self, protein_id: &ProteinId, threshold: u16) -> Result<Vec<InteractionEdge>> {
        Ok(self
            .edges
            .iter()
            .filter(|e| e.touches(protein_id) && e.confidence_score >= threshold)
            .cloned()
            .collect())
    }
}
