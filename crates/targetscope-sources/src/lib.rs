//! targetscope-sources: External biological data providers and the three
//! resolution stages built on them.
//!
//! Each provider trait has a live REST client and a curated fallback. The
//! [`resilient::Resilient`] wrapper rate-limits and times out the live call
//! and substitutes the fallback on failure.

pub mod annotator;
pub mod config;
pub mod druggability;
pub mod fallback;
pub mod network;
pub mod pathway;
pub mod rate_limit;
pub mod resilient;
pub mod sources;
pub mod stack;

pub use annotator::{Annotation, ProteinAnnotator};
pub use config::SourcesConfig;
pub use druggability::{ClassWeights, DruggabilityHeuristic, StructuralClass};
pub use fallback::FallbackDataset;
pub use network::NetworkBuilder;
pub use pathway::{PathwayResolution, PathwayResolver};
pub use rate_limit::RateLimiter;
pub use resilient::Resilient;
pub use sources::{AnnotationProvider, InteractionProvider, PathwayProvider, PathwaySummary, ProteinAnnotation};
pub use stack::{LiveProviders, SourceStack};
