//! targetscope-ranker: Target prioritization scoring and the pipeline
//! orchestrator.

pub mod config;
pub mod export;
pub mod normalise;
pub mod pipeline;
pub mod report;
pub mod scorer;
pub mod weights;

pub use config::{EngineConfig, NetworkConfig, OutputConfig};
pub use pipeline::{RankedTargets, TargetPipeline};
pub use report::{DetailedReport, DiseaseSummary, Distribution, ScoringReport};
pub use scorer::{score_target, score_target_list, ScoringSettings, TargetScore, TargetSignals};
pub use weights::WeightVector;
