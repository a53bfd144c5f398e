//! Pipeline Orchestrator: disease name → ranked druggable targets.
//!
//! Stages: pathway resolution, then annotation concurrently with network
//! construction and centrality analysis, then scoring. The configuration is
//! snapshotted at the start of each run.

use chrono::Utc;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use targetscope_common::{CancellationFlag, EngineError, NetworkQuality, ProteinId, Result};
use targetscope_network::{
    functional_clusters, identify_hubs, CentralityAnalyzer, CentralityResult, InteractionGraph, NetworkProperties,
};
use targetscope_sources::{Annotation, FallbackDataset, LiveProviders, PathwayResolution, SourceStack};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::export::write_csv;
use crate::normalise::count_disease_matches;
use crate::report::{create_scoring_report, DetailedReport, DiseaseSummary, PathwayDetail, RunSummary, ScoringReport};
use crate::scorer::{score_target_list, TargetScore, TargetSignals};
use crate::weights::WeightVector;

/// Pathways listed in a detailed report.
const DETAILED_REPORT_PATHWAYS: usize = 10;

/// Ranked rows of one run plus its report.
#[derive(Debug, Clone)]
pub struct RankedTargets {
    pub run_id: Uuid,
    pub disease: String,
    /// Truncated to `max_targets` after full ranking.
    pub targets: Vec<TargetScore>,
    pub report: ScoringReport,
}

/// All intermediate products of one run.
struct Analysis {
    run_id: Uuid,
    config: Arc<EngineConfig>,
    resolution: PathwayResolution,
    annotation: Annotation,
    network: Option<(InteractionGraph, BTreeMap<ProteinId, CentralityResult>)>,
    scores: Vec<TargetScore>,
}

pub struct TargetPipeline {
    config: Arc<EngineConfig>,
    sources: SourceStack,
}

impl TargetPipeline {
    /// Pipeline over the live REST providers.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let live = LiveProviders::from_config(&config.sources)?;
        Self::with_providers(config, live)
    }

    /// Pipeline over caller-supplied live providers.
    pub fn with_providers(config: EngineConfig, live: LiveProviders) -> Result<Self> {
        config.validate()?;
        let dataset = Arc::new(FallbackDataset::load(config.sources.fallback_dataset.as_deref())?);
        let sources = SourceStack::new(live, dataset, &config.sources, config.scoring.confidence.clone());
        Ok(Self {
            config: Arc::new(config),
            sources,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Replace the scoring weights for subsequent runs.
    pub fn update_scoring_weights(&mut self, druggability: f64, centrality: f64, pathway: f64, disease: f64) -> Result<()> {
        let weights = WeightVector::new(druggability, centrality, pathway, disease)?;
        let mut config = (*self.config).clone();
        config.scoring.weights = weights;
        self.config = Arc::new(config);
        info!(?weights, "Updated scoring weights");
        Ok(())
    }

    pub async fn identify_and_rank_targets(
        &self,
        disease: &str,
        max_targets: usize,
        include_network_analysis: bool,
    ) -> Result<RankedTargets> {
        self.identify_and_rank_targets_with_cancel(disease, max_targets, include_network_analysis, &CancellationFlag::new())
            .await
    }

    /// As [`identify_and_rank_targets`](Self::identify_and_rank_targets),
    /// aborting with `Cancelled` once `cancel` is set.
    pub async fn identify_and_rank_targets_with_cancel(
        &self,
        disease: &str,
        max_targets: usize,
        include_network_analysis: bool,
        cancel: &CancellationFlag,
    ) -> Result<RankedTargets> {
        check_max_targets(max_targets)?;
        let analysis = self.analyse(disease, include_network_analysis, cancel).await?;
        Ok(self.ranked(disease, analysis, max_targets))
    }

    /// Rank each disease independently. A failing disease is reported in
    /// place; cancellation aborts the whole comparison.
    pub async fn compare_diseases(
        &self,
        diseases: &[String],
        max_targets: usize,
    ) -> Result<BTreeMap<String, DiseaseSummary>> {
        check_max_targets(max_targets)?;
        let mut out = BTreeMap::new();
        for disease in diseases {
            let summary = match self.identify_and_rank_targets(disease, max_targets, true).await {
                Ok(ranked) => summarise(&ranked, self.config.output.top_n),
                Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
                Err(e) => {
                    warn!(disease = %disease, error = %e, "Disease comparison entry failed");
                    DiseaseSummary::Failed { error: e.to_string() }
                }
            };
            out.insert(disease.clone(), summary);
        }
        Ok(out)
    }

    /// Ranking plus pathway listing, network properties, hubs and clusters.
    pub async fn generate_detailed_report(&self, disease: &str, max_targets: usize) -> Result<DetailedReport> {
        check_max_targets(max_targets)?;
        let analysis = self.analyse(disease, true, &CancellationFlag::new()).await?;

        let mut pathways: Vec<PathwayDetail> = analysis.resolution.pathways.values().map(PathwayDetail::from).collect();
        pathways.sort_by(|a, b| {
            b.protein_count
                .cmp(&a.protein_count)
                .then_with(|| a.pathway_id.cmp(&b.pathway_id))
        });
        pathways.truncate(DETAILED_REPORT_PATHWAYS);

        let top_n = analysis.config.output.top_n;
        let (network, hubs, cluster_count) = match &analysis.network {
            Some((graph, results)) => (
                Some(NetworkProperties::compute(graph)),
                identify_hubs(graph, results, &analysis.config.network.weights, top_n),
                functional_clusters(graph).len(),
            ),
            None => (None, Vec::new(), 0),
        };

        let ranked = self.ranked(disease, analysis, max_targets);
        Ok(DetailedReport {
            report: ranked.report,
            pathways,
            network,
            hubs,
            cluster_count,
        })
    }

    /// Write the ranking as CSV under `dir`.
    pub fn save_results(&self, ranked: &RankedTargets, dir: &Path) -> Result<PathBuf> {
        write_csv(&ranked.targets, dir, &ranked.disease, Utc::now())
    }

    #[instrument(skip(self, cancel), fields(run_id = tracing::field::Empty))]
    async fn analyse(&self, disease: &str, include_network: bool, cancel: &CancellationFlag) -> Result<Analysis> {
        let config = self.config.clone();
        let run_id = Uuid::new_v4();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        info!(disease, include_network, "Starting target identification");

        let resolution = self.sources.resolver.resolve(disease, cancel).await?;
        let protein_ids: BTreeSet<ProteinId> = resolution.protein_ids();
        cancel.check()?;

        let (annotation, network) = if include_network {
            let network_stage = async {
                let graph = self
                    .sources
                    .network
                    .build_network(&protein_ids, config.network.score_threshold, cancel)
                    .await?;
                let results = CentralityAnalyzer::new(config.network.centrality.clone()).compute(&graph);
                Ok::<_, EngineError>((graph, results))
            };
            let (annotation, network) =
                tokio::join!(self.sources.annotator.annotate(&protein_ids, cancel), network_stage);
            (annotation?, Some(network?))
        } else {
            (self.sources.annotator.annotate(&protein_ids, cancel).await?, None)
        };
        cancel.check()?;

        let terms = self.sources.dataset.relevance_terms(disease);
        let inputs: Vec<_> = annotation
            .records
            .values()
            .map(|record| {
                let id = &record.protein_id;
                let (centrality_score, network_quality) = match &network {
                    Some((graph, results)) => (
                        results
                            .get(id)
                            .map_or(0.0, |r| config.network.weights.composite(&r.normalized)),
                        graph.quality_of(id).unwrap_or(NetworkQuality::NoData),
                    ),
                    None => (0.0, NetworkQuality::Skipped),
                };
                let signals = TargetSignals {
                    centrality_score,
                    network_quality,
                    pathway_count: resolution.pathway_count(id),
                    pathway_quality: resolution.pathway_quality(id).unwrap_or(resolution.data_quality),
                    disease_matches: count_disease_matches(&record.associated_diseases, &terms),
                };
                (record.clone(), signals)
            })
            .collect();

        let scores = score_target_list(&inputs, &config.scoring);
        cancel.check()?;

        info!(
            disease,
            n_pathways = resolution.pathways.len(),
            n_proteins = protein_ids.len(),
            n_scored = scores.len(),
            top_target = scores.first().map(|s| s.protein_id.as_str()).unwrap_or("-"),
            "Target identification complete"
        );

        Ok(Analysis {
            run_id,
            config,
            resolution,
            annotation,
            network,
            scores,
        })
    }

    fn ranked(&self, disease: &str, analysis: Analysis, max_targets: usize) -> RankedTargets {
        let mut excluded = analysis.resolution.unresolved.clone();
        excluded.extend(analysis.annotation.unresolved.iter().cloned());

        let report = create_scoring_report(
            RunSummary {
                disease,
                run_id: analysis.run_id,
                pathway_count: analysis.resolution.pathways.len(),
                protein_count: analysis.annotation.records.len() + analysis.annotation.unresolved.len(),
                excluded: &excluded,
                weights: analysis.config.scoring.weights,
            },
            &analysis.scores,
            analysis.config.output.top_n,
        );

        let mut targets = analysis.scores;
        targets.truncate(max_targets);
        RankedTargets {
            run_id: analysis.run_id,
            disease: disease.to_string(),
            targets,
            report,
        }
    }
}

fn check_max_targets(max_targets: usize) -> Result<()> {
    if max_targets == 0 {
        return Err(EngineError::config("max_targets must be at least 1"));
    }
    Ok(())
}

fn summarise(ranked: &RankedTargets, top_n: usize) -> DiseaseSummary {
    let n = ranked.targets.len();
    let mean = |f: fn(&TargetScore) -> f64| {
        if n == 0 {
            0.0
        } else {
            ranked.targets.iter().map(f).sum::<f64>() / n as f64
        }
    };
    DiseaseSummary::Ranked {
        run_id: ranked.run_id,
        total_targets: n,
        top_target: ranked.targets.first().map(|s| s.protein_id.to_string()),
        top_score: ranked.targets.first().map(|s| s.final_score),
        avg_druggability: mean(|s| s.druggability_score),
        avg_centrality: mean(|s| s.centrality_score),
        data_quality: ranked.report.data_quality,
        targets: ranked.targets.iter().take(top_n).cloned().collect(),
    }
}
