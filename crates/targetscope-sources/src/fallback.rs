//! Curated fallback dataset and the fallback implementations of the
//! provider traits.
//!
//! The dataset ships embedded (`data/fallback.yaml`) and can be replaced
//! with a file via `sources.fallback_dataset`.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use targetscope_common::{
    DataQuality, DruggabilityEvidence, EngineError, EntityKind, InteractionEdge, ProteinId, Result,
};
use tracing::{debug, info};

use crate::sources::{
    AnnotationProvider, InteractionProvider, PathwayProvider, PathwaySummary, ProteinAnnotation,
};

const EMBEDDED_DATASET: &str = include_str!("../data/fallback.yaml");
const PROVIDER: &str = "curated";

// ── Raw YAML shape ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct CuratedPathway {
    pub id: String,
    pub name: String,
    pub proteins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiseaseCategory {
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub pathways: Vec<CuratedPathway>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CuratedProtein {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub function: String,
    #[serde(default)]
    pub binding_sites: u32,
    #[serde(default)]
    pub ligand_count: u32,
    pub structural_class: Option<String>,
    /// Overrides the heuristic when present.
    pub druggability: Option<f64>,
    #[serde(default)]
    pub diseases: Vec<String>,
    #[serde(default)]
    pub subcellular_locations: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    categories: Vec<DiseaseCategory>,
    generic: Vec<CuratedPathway>,
    #[serde(default)]
    participants: BTreeMap<String, Vec<String>>,
    proteins: Vec<CuratedProtein>,
    #[serde(default)]
    interactions: Vec<(String, String, u16)>,
}

// ── Indexed dataset ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FallbackDataset {
    categories: Vec<DiseaseCategory>,
    generic: Vec<CuratedPathway>,
    participants: HashMap<String, BTreeSet<ProteinId>>,
    proteins: BTreeMap<ProteinId, CuratedProtein>,
    edges: Vec<InteractionEdge>,
    edges_by_protein: HashMap<ProteinId, Vec<usize>>,
}

impl FallbackDataset {
    /// The dataset compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_DATASET)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let dataset = Self::from_yaml(&content)?;
        info!(path = %path.display(), "Loaded fallback dataset");
        Ok(dataset)
    }

    /// Embedded dataset unless `path` is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::embedded(),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let raw: RawDataset = serde_yaml::from_str(content)
            .map_err(|e| EngineError::config(format!("invalid fallback dataset: {e}")))?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawDataset) -> Result<Self> {
        if raw.generic.is_empty() {
            return Err(EngineError::config("fallback dataset must define generic pathways"));
        }

        let mut participants: HashMap<String, BTreeSet<ProteinId>> = HashMap::new();
        for pathway in raw.categories.iter().flat_map(|c| &c.pathways).chain(&raw.generic) {
            participants.insert(pathway.id.clone(), to_ids(&pathway.proteins));
        }
        for (id, proteins) in &raw.participants {
            participants.insert(id.clone(), to_ids(proteins));
        }

        let mut proteins = BTreeMap::new();
        for p in raw.proteins {
            if let Some(d) = p.druggability {
                if !(0.0..=1.0).contains(&d) {
                    return Err(EngineError::config(format!(
                        "fallback protein {} has druggability {d} outside [0, 1]",
                        p.id
                    )));
                }
            }
            let Some(id) = ProteinId::parse(&p.id) else {
                continue;
            };
            proteins.insert(id, p);
        }

        let mut edge_map: BTreeMap<(ProteinId, ProteinId), u16> = BTreeMap::new();
        for (a, b, score) in &raw.interactions {
            let (Some(a), Some(b)) = (ProteinId::parse(a), ProteinId::parse(b)) else {
                continue;
            };
            if let Some(edge) = InteractionEdge::new(a, b, *score) {
                let s = edge.confidence_score;
                edge_map
                    .entry(edge.key())
                    .and_modify(|v| *v = (*v).max(s))
                    .or_insert(s);
            }
        }
        let edges: Vec<InteractionEdge> = edge_map
            .into_iter()
            .filter_map(|((a, b), s)| InteractionEdge::new(a, b, s))
            .collect();
        let mut edges_by_protein: HashMap<ProteinId, Vec<usize>> = HashMap::new();
        for (i, e) in edges.iter().enumerate() {
            edges_by_protein.entry(e.protein_a.clone()).or_default().push(i);
            edges_by_protein.entry(e.protein_b.clone()).or_default().push(i);
        }

        debug!(
            categories = raw.categories.len(),
            proteins = proteins.len(),
            edges = edges.len(),
            "Indexed fallback dataset"
        );

        Ok(Self {
            categories: raw.categories,
            generic: raw.generic,
            participants,
            proteins,
            edges,
            edges_by_protein,
        })
    }

    pub fn categories(&self) -> &[DiseaseCategory] {
        &self.categories
    }

    /// Category whose name or keywords best match the disease name.
    ///
    /// Keywords match whole words (a trailing plural `s` is allowed) and
    /// multi-word keywords match as consecutive words, so "heartburn" does not
    /// match "heart". The category covering the most words wins; ties go to
    /// the category mentioned first in the name, then to dataset order.
    pub fn category_for(&self, disease: &str) -> Option<&DiseaseCategory> {
        let name_words = words(disease);
        let mut best: Option<(usize, usize, &DiseaseCategory)> = None;

        for category in &self.categories {
            let phrases: BTreeSet<Vec<String>> = std::iter::once(&category.name)
                .chain(&category.keywords)
                .map(|k| words(k))
                .filter(|p| !p.is_empty())
                .collect();

            let mut covered = 0;
            let mut first = usize::MAX;
            for phrase in &phrases {
                if let Some(pos) = phrase_position(&name_words, phrase) {
                    covered += phrase.len();
                    first = first.min(pos);
                }
            }
            if covered == 0 {
                continue;
            }
            let better = match best {
                None => true,
                Some((c, f, _)) => covered > c || (covered == c && first < f),
            };
            if better {
                best = Some((covered, first, category));
            }
        }
        best.map(|(_, _, c)| c)
    }

    /// Curated pathways for a disease and their quality: the category set,
    /// or the generic set for unrecognised diseases.
    pub fn pathways_for(&self, disease: &str) -> (&[CuratedPathway], DataQuality) {
        match self.category_for(disease) {
            Some(c) => (&c.pathways, DataQuality::Fallback),
            None => (&self.generic, DataQuality::Generic),
        }
    }

    pub fn participants(&self, pathway_id: &str) -> Option<&BTreeSet<ProteinId>> {
        self.participants.get(pathway_id)
    }

    pub fn protein(&self, id: &ProteinId) -> Option<&CuratedProtein> {
        self.proteins.get(id)
    }

    /// Curated edges touching `id`, or `None` when `id` has no curated edges.
    pub fn edges_for(&self, id: &ProteinId) -> Option<Vec<InteractionEdge>> {
        self.edges_by_protein
            .get(id)
            .map(|idx| idx.iter().map(|&i| self.edges[i].clone()).collect())
    }

    /// Lower-cased terms a disease association must mention to count as
    /// relevant: the disease name itself plus its category name and keywords.
    pub fn relevance_terms(&self, disease: &str) -> Vec<String> {
        let mut terms = vec![disease.trim().to_lowercase()];
        if let Some(c) = self.category_for(disease) {
            terms.push(c.name.to_lowercase());
            terms.extend(c.keywords.iter().map(|k| k.to_lowercase()));
        }
        terms.retain(|t| !t.is_empty());
        terms.sort();
        terms.dedup();
        terms
    }
}

/// Lower-cased alphanumeric words of `s`.
fn words(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

fn word_matches(word: &str, keyword: &str) -> bool {
    word == keyword || word.strip_suffix('s') == Some(keyword)
}

/// Start of the first run of `words` matching `phrase` word by word.
fn phrase_position(words: &[String], phrase: &[String]) -> Option<usize> {
    if phrase.len() > words.len() {
        return None;
    }
    words
        .windows(phrase.len())
        .position(|w| w.iter().zip(phrase).all(|(a, b)| word_matches(a, b)))
}

fn to_ids(raw: &[String]) -> BTreeSet<ProteinId> {
    raw.iter().filter_map(|s| ProteinId::parse(s)).collect()
}

// ── Provider implementations ───────────────────────────────────────────────

pub struct FallbackPathwayProvider {
    dataset: Arc<FallbackDataset>,
}

impl FallbackPathwayProvider {
    pub fn new(dataset: Arc<FallbackDataset>) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl PathwayProvider for FallbackPathwayProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn pathways_for_disease(&self, disease: &str) -> Result<Vec<PathwaySummary>> {
        let (pathways, quality) = self.dataset.pathways_for(disease);
        Ok(pathways
            .iter()
            .map(|p| PathwaySummary {
                pathway_id: p.id.clone(),
                name: p.name.clone(),
                data_quality: quality,
            })
            .collect())
    }

    async fn pathway_participants(&self, pathway_id: &str) -> Result<BTreeSet<ProteinId>> {
        self.dataset
            .participants(pathway_id)
            .cloned()
            .ok_or_else(|| EngineError::unresolvable(EntityKind::Pathway, pathway_id))
    }
}

pub struct FallbackAnnotationProvider {
    dataset: Arc<FallbackDataset>,
}

impl FallbackAnnotationProvider {
    pub fn new(dataset: Arc<FallbackDataset>) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl AnnotationProvider for FallbackAnnotationProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn annotate(&self, protein_id: &ProteinId) -> Result<Option<ProteinAnnotation>> {
        Ok(self.dataset.protein(protein_id).map(|p| ProteinAnnotation {
            protein_id: protein_id.clone(),
            display_name: p.name.clone(),
            function_text: p.function.clone(),
            evidence: DruggabilityEvidence {
                binding_sites: p.binding_sites,
                ligand_count: p.ligand_count,
                structural_class: p.structural_class.clone(),
            },
            reviewed: true,
            associated_diseases: p.diseases.clone(),
            druggability_override: p.druggability,
            subcellular_locations: p.subcellular_locations.clone(),
            keywords: p.keywords.clone(),
        }))
    }
}

pub struct FallbackInteractionProvider {
    dataset: Arc<FallbackDataset>,
}

impl FallbackInteractionProvider {
    pub fn new(dataset: Arc<FallbackDataset>) -> Self {
        Self { dataset }
    }
}

#[async_trait]
impl InteractionProvider for FallbackInteractionProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn interactions(&self, protein_id: &ProteinId, threshold: u16) -> Result<Vec<InteractionEdge>> {
        let edges = self
            .dataset
            .edges_for(protein_id)
            .ok_or_else(|| EngineError::unresolvable(EntityKind::Protein, protein_id.as_str()))?;
        Ok(edges
            .into_iter()
            .filter(|e| e.confidence_score >= threshold)
            .collect())
    }
}
