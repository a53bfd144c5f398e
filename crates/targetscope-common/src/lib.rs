//! targetscope-common: Shared types, errors, and helpers used across all TargetScope crates.

pub mod error;
pub mod entities;
pub mod confidence;
pub mod sandbox;
pub mod cancel;

// Re-export commonly used types
pub use cancel::CancellationFlag;
pub use confidence::{weakest_link, ConfidenceTable};
pub use entities::{
    DataQuality, DruggabilityEvidence, EntityKind, InteractionEdge, NetworkQuality, PathwayRecord,
    ProteinId, ProteinRecord, UnresolvedEntity, MAX_INTERACTION_SCORE,
};
pub use error::{EngineError, Result};
pub use sandbox::SandboxClient;
