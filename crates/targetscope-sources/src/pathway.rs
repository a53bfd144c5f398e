//! Pathway Resolver: disease name → pathways → participating proteins.

use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use targetscope_common::{
    CancellationFlag, DataQuality, EngineError, EntityKind, PathwayRecord, ProteinId, Result,
    UnresolvedEntity,
};
use tracing::{info, instrument, warn};

use crate::config::SourcesConfig;
use crate::fallback::FallbackDataset;
use crate::resilient::Resilient;
use crate::sources::{PathwayProvider, PathwaySummary};

const CURATED: &str = "curated";

/// Pathways found for one disease query.
#[derive(Debug, Clone)]
pub struct PathwayResolution {
    pub pathways: BTreeMap<String, PathwayRecord>,
    pub unresolved: Vec<UnresolvedEntity>,
    /// Weakest quality among the kept pathways.
    pub data_quality: DataQuality,
}

impl Default for PathwayResolution {
    fn default() -> Self {
        Self {
            pathways: BTreeMap::new(),
            unresolved: Vec::new(),
            data_quality: DataQuality::Generic,
        }
    }
}

impl PathwayResolution {
    /// Every protein id that participates in at least one kept pathway.
    pub fn protein_ids(&self) -> BTreeSet<ProteinId> {
        self.pathways
            .values()
            .flat_map(|p| p.protein_ids.iter().cloned())
            .collect()
    }

    /// Number of kept pathways containing `id`.
    pub fn pathway_count(&self, id: &ProteinId) -> usize {
        self.pathways.values().filter(|p| p.protein_ids.contains(id)).count()
    }

    /// Best quality among the pathways containing `id`.
    pub fn pathway_quality(&self, id: &ProteinId) -> Option<DataQuality> {
        self.pathways
            .values()
            .filter(|p| p.protein_ids.contains(id))
            .map(|p| p.data_quality)
            .min()
    }
}

pub struct PathwayResolver {
    providers: Vec<Resilient<dyn PathwayProvider>>,
    dataset: Arc<FallbackDataset>,
    max_pathways_per_provider: usize,
    max_proteins_per_pathway: usize,
}

impl PathwayResolver {
    /// `providers` are consulted in order; on duplicate pathway ids with
    /// equally large protein sets the earlier provider wins.
    pub fn new(
        providers: Vec<Resilient<dyn PathwayProvider>>,
        dataset: Arc<FallbackDataset>,
        config: &SourcesConfig,
    ) -> Self {
        Self {
            providers,
            dataset,
            max_pathways_per_provider: config.max_pathways_per_provider,
            max_proteins_per_pathway: config.max_proteins_per_pathway,
        }
    }

    #[instrument(skip(self, cancel))]
    pub async fn resolve(&self, disease: &str, cancel: &CancellationFlag) -> Result<PathwayResolution> {
        let disease = disease.trim();
        if disease.is_empty() {
            return Err(EngineError::config("disease name must not be empty"));
        }
        cancel.check()?;

        let per_provider = join_all(self.providers.iter().map(|p| self.from_provider(p, disease))).await;

        let mut resolution = PathwayResolution::default();
        for outcome in per_provider {
            let (records, unresolved) = outcome?;
            resolution.unresolved.extend(unresolved);
            for record in records {
                merge_record(&mut resolution.pathways, record);
            }
        }

        if resolution.pathways.is_empty() {
            warn!(disease, "No pathways from any provider, substituting curated set");
            let (curated, quality) = self.dataset.pathways_for(disease);
            for p in curated {
                let record = PathwayRecord {
                    pathway_id: p.id.clone(),
                    name: p.name.clone(),
                    source_provider: CURATED.to_string(),
                    protein_ids: p.proteins.iter().filter_map(|s| ProteinId::parse(s)).collect(),
                    data_quality: quality,
                };
                merge_record(&mut resolution.pathways, record);
            }
        }

        dedup_unresolved(&mut resolution);
        for record in resolution.pathways.values_mut() {
            record.truncate_proteins(self.max_proteins_per_pathway);
        }
        resolution.data_quality = resolution
            .pathways
            .values()
            .map(|p| p.data_quality)
            .max()
            .unwrap_or(DataQuality::Generic);

        cancel.check()?;
        info!(
            disease,
            n_pathways = resolution.pathways.len(),
            n_unresolved = resolution.unresolved.len(),
            data_quality = %resolution.data_quality,
            "Resolved pathways"
        );
        Ok(resolution)
    }

    async fn from_provider(
        &self,
        provider: &Resilient<dyn PathwayProvider>,
        disease: &str,
    ) -> Result<(Vec<PathwayRecord>, Vec<UnresolvedEntity>)> {
        let (mut summaries, summary_quality) = provider
            .call("pathways_for_disease", |p| p.pathways_for_disease(disease))
            .await?;
        summaries.truncate(self.max_pathways_per_provider);

        // Curated summaries only have curated participants; skip the live provider for them.
        let lookups = summaries.iter().map(|s| async move {
            let outcome = if summary_quality == DataQuality::Live && s.data_quality == DataQuality::Live {
                provider
                    .call("pathway_participants", |p| p.pathway_participants(&s.pathway_id))
                    .await
            } else {
                provider
                    .fallback()
                    .pathway_participants(&s.pathway_id)
                    .await
                    .map(|ids| (ids, DataQuality::Fallback))
            };
            (s, outcome)
        });

        let mut records = Vec::new();
        let mut unresolved = Vec::new();
        for (summary, outcome) in join_all(lookups).await {
            match outcome {
                Ok((ids, _)) if ids.is_empty() => {
                    warn!(pathway_id = %summary.pathway_id, "Pathway has no participants, dropping");
                    unresolved.push(unresolved_pathway(summary, "no participating proteins"));
                }
                Ok((ids, participants_quality)) => {
                    let quality = summary.data_quality.max(summary_quality).max(participants_quality);
                    records.push(PathwayRecord {
                        pathway_id: summary.pathway_id.clone(),
                        name: summary.name.clone(),
                        source_provider: if quality == DataQuality::Live {
                            provider.provider().to_string()
                        } else {
                            CURATED.to_string()
                        },
                        protein_ids: ids,
                        data_quality: quality,
                    });
                }
                Err(e) if e.is_recoverable() => {
                    warn!(pathway_id = %summary.pathway_id, error = %e, "Dropping unresolvable pathway");
                    unresolved.push(unresolved_pathway(summary, &e.to_string()));
                }
                Err(e) => return Err(e),
            }
        }
        Ok((records, unresolved))
    }
}

fn unresolved_pathway(summary: &PathwaySummary, reason: &str) -> UnresolvedEntity {
    UnresolvedEntity {
        kind: EntityKind::Pathway,
        id: summary.pathway_id.clone(),
        reason: reason.to_string(),
    }
}

/// Providers that both degrade to the curated set report the same dropped
/// pathways. Keep one entry per (kind, id), and none for ids another
/// provider resolved.
fn dedup_unresolved(resolution: &mut PathwayResolution) {
    let mut seen = BTreeSet::new();
    let pathways = &resolution.pathways;
    resolution.unresolved.retain(|u| {
        let resolved = u.kind == EntityKind::Pathway && pathways.contains_key(&u.id);
        !resolved && seen.insert((u.kind, u.id.clone()))
    });
}

/// Keep the richer protein set on duplicate ids; the incumbent wins ties.
fn merge_record(pathways: &mut BTreeMap<String, PathwayRecord>, record: PathwayRecord) {
    match pathways.get(&record.pathway_id) {
        Some(existing) if existing.protein_ids.len() >= record.protein_ids.len() => {}
        _ => {
            pathways.insert(record.pathway_id.clone(), record);
        }
    }
}
