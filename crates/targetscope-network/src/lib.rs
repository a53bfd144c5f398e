//! targetscope-network: Protein interaction graph and centrality analysis.
//!
//! The graph is built once per query from filtered STRING (or fallback)
//! edges, then analysed for degree, betweenness, closeness, eigenvector and
//! PageRank centrality.

pub mod graph;
pub mod normalise;
pub mod centrality;
pub mod properties;

pub use centrality::{CentralityAnalyzer, CentralityMeasures, CentralityResult, CentralitySettings, CentralityWeights};
pub use graph::{GraphBuilder, InteractionGraph};
pub use properties::{functional_clusters, identify_hubs, Hub, NetworkProperties};
