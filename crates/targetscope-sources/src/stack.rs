//! Wiring of live clients, curated fallbacks and shared rate limiters into
//! the three resolution stages.

use std::sync::Arc;

use targetscope_common::{ConfidenceTable, Result, SandboxClient};
use tracing::info;

use crate::annotator::ProteinAnnotator;
use crate::config::SourcesConfig;
use crate::fallback::{
    FallbackAnnotationProvider, FallbackDataset, FallbackInteractionProvider, FallbackPathwayProvider,
};
use crate::network::NetworkBuilder;
use crate::pathway::PathwayResolver;
use crate::rate_limit::RateLimiter;
use crate::resilient::Resilient;
use crate::sources::{
    AnnotationProvider, InteractionProvider, KeggClient, PathwayProvider, ReactomeClient, StringClient,
    UniProtClient,
};

/// Live provider implementations for one engine instance.
pub struct LiveProviders {
    pub kegg: Arc<dyn PathwayProvider>,
    pub reactome: Arc<dyn PathwayProvider>,
    pub uniprot: Arc<dyn AnnotationProvider>,
    pub string: Arc<dyn InteractionProvider>,
}

impl LiveProviders {
    /// REST clients for the configured base URLs. Each client owns one rate
    /// limiter, shared by every task that calls it and applied per request.
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let client = SandboxClient::with_timeout(config.timeout())?;
        let limiter = || Arc::new(RateLimiter::new(config.request_interval()));
        Ok(Self {
            kegg: Arc::new(KeggClient::with_base_url(client.clone(), &config.kegg_base_url).with_limiter(limiter())),
            reactome: Arc::new(
                ReactomeClient::with_base_url(client.clone(), &config.reactome_base_url).with_limiter(limiter()),
            ),
            uniprot: Arc::new(
                UniProtClient::with_base_url(client.clone(), &config.uniprot_base_url, config.species)
                    .with_limiter(limiter()),
            ),
            string: Arc::new(
                StringClient::with_base_url(client, &config.string_base_url, config.species).with_limiter(limiter()),
            ),
        })
    }
}

pub struct SourceStack {
    pub resolver: PathwayResolver,
    pub annotator: ProteinAnnotator,
    pub network: NetworkBuilder,
    pub dataset: Arc<FallbackDataset>,
}

impl SourceStack {
    pub fn new(
        live: LiveProviders,
        dataset: Arc<FallbackDataset>,
        config: &SourcesConfig,
        confidence: ConfidenceTable,
    ) -> Self {
        let timeout = config.timeout();

        let pathway_fallback: Arc<dyn PathwayProvider> = Arc::new(FallbackPathwayProvider::new(dataset.clone()));
        let providers = vec![
            Resilient::new(live.kegg.name(), live.kegg.clone(), pathway_fallback.clone(), timeout),
            Resilient::new(live.reactome.name(), live.reactome.clone(), pathway_fallback, timeout),
        ];
        let resolver = PathwayResolver::new(providers, dataset.clone(), config);

        let annotation_fallback: Arc<dyn AnnotationProvider> =
            Arc::new(FallbackAnnotationProvider::new(dataset.clone()));
        let annotator = ProteinAnnotator::new(
            Resilient::new(live.uniprot.name(), live.uniprot.clone(), annotation_fallback, timeout),
            config,
            confidence,
        );

        let interaction_fallback: Arc<dyn InteractionProvider> =
            Arc::new(FallbackInteractionProvider::new(dataset.clone()));
        let network = NetworkBuilder::new(Resilient::new(
            live.string.name(),
            live.string.clone(),
            interaction_fallback,
            timeout,
        ))
        .with_concurrency(config.batch_size);

        info!(
            pathway_providers = 2,
            interval_ms = config.request_interval_ms,
            timeout_secs = config.timeout_secs,
            "Assembled source stack"
        );
        Self {
            resolver,
            annotator,
            network,
            dataset,
        }
    }
}
