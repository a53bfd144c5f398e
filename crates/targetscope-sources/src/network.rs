//! Interaction Network Builder.
//!
//! One STRING query per input protein. Edges touching partners outside the
//! input set are kept, so first-degree neighbours join the graph.

use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;

use targetscope_common::{
    CancellationFlag, DataQuality, EngineError, NetworkQuality, ProteinId, Result,
    MAX_INTERACTION_SCORE,
};
use targetscope_network::{GraphBuilder, InteractionGraph};
use tracing::{debug, info, instrument, warn};

use crate::resilient::Resilient;
use crate::sources::InteractionProvider;

/// Lookups in flight at once; the rest queue behind the rate limiter.
const DEFAULT_CONCURRENCY: usize = 10;

pub struct NetworkBuilder {
    provider: Resilient<dyn InteractionProvider>,
    concurrency: usize,
}

impl NetworkBuilder {
    pub fn new(provider: Resilient<dyn InteractionProvider>) -> Self {
        Self {
            provider,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    #[instrument(skip(self, protein_ids, cancel), fields(n_proteins = protein_ids.len()))]
    pub async fn build_network(
        &self,
        protein_ids: &BTreeSet<ProteinId>,
        score_threshold: u16,
        cancel: &CancellationFlag,
    ) -> Result<InteractionGraph> {
        if !(1..=MAX_INTERACTION_SCORE).contains(&score_threshold) {
            return Err(EngineError::config(format!(
                "score_threshold must be in 1..={MAX_INTERACTION_SCORE}, got {score_threshold}"
            )));
        }
        cancel.check()?;

        let lookups = protein_ids.iter().map(|id| async move {
            let outcome = self
                .provider
                .call("interactions", |p| p.interactions(id, score_threshold))
                .await;
            (id, outcome)
        });

        let outcomes: Vec<_> = stream::iter(lookups).buffered(self.concurrency).collect().await;

        let mut builder = GraphBuilder::new(score_threshold);
        for (id, outcome) in outcomes {
            let (edges, edge_quality) = match outcome {
                Ok((edges, DataQuality::Live)) => (edges, NetworkQuality::Measured),
                Ok((edges, _)) => (edges, NetworkQuality::Fallback),
                Err(e) if e.is_recoverable() => {
                    warn!(protein_id = %id, error = %e, "No interaction data");
                    builder.add_node(id.clone(), NetworkQuality::NoData);
                    continue;
                }
                Err(e) => return Err(e),
            };

            let mut kept = 0usize;
            for edge in edges {
                if builder.add_edge(edge, edge_quality) {
                    kept += 1;
                }
            }
            let node_quality = match (edge_quality, kept) {
                (NetworkQuality::Measured, 0) => NetworkQuality::MeasuredIsolate,
                (q, _) => q,
            };
            builder.add_node(id.clone(), node_quality);
            debug!(protein_id = %id, kept, quality = %node_quality, "Added interactions");
        }
        cancel.check()?;

        let graph = builder.build();
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            threshold = score_threshold,
            "Built interaction network"
        );
        Ok(graph)
    }
}
