use futures::future::join_all;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use targetscope_common::{
    CancellationFlag, ConfidenceTable, DataQuality, EntityKind, ProteinId, ProteinRecord, Result,
    UnresolvedEntity,
};
use tracing::{debug, info, instrument, warn};

use crate::config::SourcesConfig;
use crate::druggability::DruggabilityHeuristic;
use crate::resilient::Resilient;
use crate::sources::{AnnotationProvider, ProteinAnnotation};

/// Confidence of a reviewed (Swiss-Prot) live entry.
pub const REVIEWED_CONFIDENCE: f64 = 0.9;
/// Confidence of an unreviewed (TrEMBL) live entry.
pub const UNREVIEWED_CONFIDENCE: f64 = 0.7;

/// Annotated proteins keyed by id, plus the ids that could not be annotated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub records: BTreeMap<ProteinId, ProteinRecord>,
    pub unresolved: Vec<UnresolvedEntity>,
}

pub struct ProteinAnnotator {
    provider: Resilient<dyn AnnotationProvider>,
    heuristic: DruggabilityHeuristic,
    confidence: ConfidenceTable,
    batch_size: usize,
    batch_delay: Duration,
}

impl ProteinAnnotator {
    pub fn new(
        provider: Resilient<dyn AnnotationProvider>,
        config: &SourcesConfig,
        confidence: ConfidenceTable,
    ) -> Self {
        Self {
            provider,
            heuristic: config.druggability.clone(),
            confidence,
            batch_size: config.batch_size.max(1),
            batch_delay: config.batch_delay(),
        }
    }

    /// Annotate `ids` in batches. Lookups inside a batch run concurrently;
    /// cancellation is checked before each batch.
    #[instrument(skip(self, ids, cancel), fields(n_proteins = ids.len()))]
    pub async fn annotate(&self, ids: &BTreeSet<ProteinId>, cancel: &CancellationFlag) -> Result<Annotation> {
        let ids: Vec<&ProteinId> = ids.iter().collect();
        let mut annotation = Annotation::default();

        for (i, batch) in ids.chunks(self.batch_size).enumerate() {
            cancel.check()?;
            if i > 0 && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
            debug!(batch = i, size = batch.len(), "Annotating batch");

            for outcome in join_all(batch.iter().map(|id| self.lookup(id))).await {
                match outcome? {
                    Ok(record) => {
                        annotation.records.insert(record.protein_id.clone(), record);
                    }
                    Err(unresolved) => {
                        warn!(protein_id = %unresolved.id, reason = %unresolved.reason, "Dropping unannotated protein");
                        annotation.unresolved.push(unresolved);
                    }
                }
            }
        }
        cancel.check()?;

        info!(
            n_records = annotation.records.len(),
            n_unresolved = annotation.unresolved.len(),
            "Annotated proteins"
        );
        Ok(annotation)
    }

    async fn lookup(&self, id: &ProteinId) -> Result<std::result::Result<ProteinRecord, UnresolvedEntity>> {
        let unresolved = |reason: String| UnresolvedEntity {
            kind: EntityKind::Protein,
            id: id.to_string(),
            reason,
        };

        let found = match self.provider.call("annotate", |p| p.annotate(id)).await {
            Ok((Some(a), quality)) => Some((a, quality)),
            // Live provider had no entry; the curated table may still know it.
            Ok((None, DataQuality::Live)) => self
                .provider
                .fallback()
                .annotate(id)
                .await?
                .map(|a| (a, DataQuality::Fallback)),
            Ok((None, _)) => None,
            Err(e) if e.is_recoverable() => return Ok(Err(unresolved(e.to_string()))),
            Err(e) => return Err(e),
        };

        Ok(match found {
            Some((a, quality)) => Ok(self.to_record(a, quality)),
            None => Err(unresolved("no live or curated annotation".to_string())),
        })
    }

    /// Apply the druggability heuristic and confidence policy to a raw annotation.
    pub fn to_record(&self, annotation: ProteinAnnotation, quality: DataQuality) -> ProteinRecord {
        let druggability_score = annotation
            .druggability_override
            .map(|d| d.clamp(0.0, 1.0))
            .unwrap_or_else(|| self.heuristic.score(&annotation.evidence));

        let (confidence, source_provider) = match quality {
            DataQuality::Live => (
                if annotation.reviewed { REVIEWED_CONFIDENCE } else { UNREVIEWED_CONFIDENCE },
                self.provider.provider().to_string(),
            ),
            _ => (
                self.confidence.fallback_annotation,
                self.provider.fallback().name().to_string(),
            ),
        };

        ProteinRecord {
            protein_id: annotation.protein_id,
            display_name: annotation.display_name,
            function_text: annotation.function_text,
            druggability_score,
            confidence,
            source_provider,
            data_quality: quality,
            associated_diseases: annotation.associated_diseases,
            evidence: annotation.evidence,
            subcellular_locations: annotation.subcellular_locations,
            keywords: annotation.keywords,
        }
    }
}
