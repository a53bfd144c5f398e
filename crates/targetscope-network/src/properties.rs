//! Graph-level summaries, hub detection and functional clusters.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

use targetscope_common::ProteinId;

use crate::centrality::{CentralityResult, CentralityWeights};
use crate::graph::InteractionGraph;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkProperties {
    pub node_count: usize,
    pub edge_count: usize,
    pub density: f64,
    pub component_count: usize,
    pub largest_component_size: usize,
    /// Mean local clustering coefficient (nodes with degree < 2 count as 0).
    pub average_clustering: f64,
    /// 3 × triangles / connected triples.
    pub transitivity: f64,
    pub average_degree: f64,
    pub degree_variance: f64,
    /// Mean hop count between node pairs of the largest component.
    pub average_path_length: f64,
}

impl NetworkProperties {
    pub fn compute(graph: &InteractionGraph) -> Self {
        let n = graph.node_count();
        if n == 0 {
            return Self::default();
        }
        let m = graph.edge_count();

        let density = if n > 1 {
            2.0 * m as f64 / (n * (n - 1)) as f64
        } else {
            0.0
        };

        let degrees: Vec<f64> = (0..n).map(|i| graph.degree(i) as f64).collect();
        let average_degree = degrees.iter().sum::<f64>() / n as f64;
        let degree_variance = degrees
            .iter()
            .map(|d| (d - average_degree).powi(2))
            .sum::<f64>()
            / n as f64;

        let mut clustering_sum = 0.0;
        let mut triangles_total = 0usize;
        let mut triples_total = 0usize;
        for v in 0..n {
            let k = graph.degree(v);
            if k < 2 {
                continue;
            }
            let neighbours = graph.neighbors(v);
            let mut links = 0usize;
            for (i, &(a, _)) in neighbours.iter().enumerate() {
                for &(b, _) in &neighbours[i + 1..] {
                    if graph.has_edge(a, b) {
                        links += 1;
                    }
                }
            }
            let pairs = k * (k - 1) / 2;
            clustering_sum += links as f64 / pairs as f64;
            triangles_total += links;
            triples_total += pairs;
        }
        let average_clustering = clustering_sum / n as f64;
        let transitivity = if triples_total > 0 {
            triangles_total as f64 / triples_total as f64
        } else {
            0.0
        };

        let components = graph.components();
        let largest = components.first().cloned().unwrap_or_default();

        Self {
            node_count: n,
            edge_count: m,
            density,
            component_count: components.len(),
            largest_component_size: largest.len(),
            average_clustering,
            transitivity,
            average_degree,
            degree_variance,
            average_path_length: average_hops(graph, &largest),
        }
    }
}

fn average_hops(graph: &InteractionGraph, component: &[usize]) -> f64 {
    let r = component.len();
    if r < 2 {
        return 0.0;
    }
    let n = graph.node_count();
    let mut total = 0usize;
    for &s in component {
        let mut hops = vec![usize::MAX; n];
        let mut queue = VecDeque::new();
        hops[s] = 0;
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            for &(w, _) in graph.neighbors(v) {
                if hops[w] == usize::MAX {
                    hops[w] = hops[v] + 1;
                    total += hops[w];
                    queue.push_back(w);
                }
            }
        }
    }
    total as f64 / (r * (r - 1)) as f64
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub protein_id: ProteinId,
    pub centrality_score: f64,
    pub degree: usize,
}

/// Top `top_n` nodes by composite centrality, ties broken by id.
pub fn identify_hubs(
    graph: &InteractionGraph,
    results: &BTreeMap<ProteinId, CentralityResult>,
    weights: &CentralityWeights,
    top_n: usize,
) -> Vec<Hub> {
    let mut hubs: Vec<Hub> = results
        .values()
        .map(|r| Hub {
            protein_id: r.protein_id.clone(),
            centrality_score: weights.composite(&r.normalized),
            degree: graph.index_of(&r.protein_id).map_or(0, |i| graph.degree(i)),
        })
        .collect();
    hubs.sort_by(|a, b| {
        b.centrality_score
            .total_cmp(&a.centrality_score)
            .then_with(|| a.protein_id.cmp(&b.protein_id))
    });
    hubs.truncate(top_n);
    hubs
}

/// Connected components as protein id groups, largest first.
pub fn functional_clusters(graph: &InteractionGraph) -> Vec<Vec<ProteinId>> {
    graph
        .components()
        .into_iter()
        .map(|c| c.into_iter().map(|i| graph.node(i).clone()).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::centrality::CentralityAnalyzer;
    use crate::graph::GraphBuilder;
    use pretty_assertions::assert_eq;
    use targetscope_common::{InteractionEdge, NetworkQuality};

    fn triangle_with_tail() -> InteractionGraph {
        let mut b = GraphBuilder::new(1);
        for (a, c) in [("A", "B"), ("B", "C"), ("A", "C"), ("C", "D")] {
            b.add_edge(
                InteractionEdge::new(a.into(), c.into(), 800).unwrap(),
                NetworkQuality::Measured,
            );
        }
        b.add_node("Z".into(), NetworkQuality::NoData);
        b.build()
    }

    #[test]
    fn test_properties_of_triangle_with_tail() {
        let g = triangle_with_tail();
        let p = NetworkProperties::compute(&g);
        assert_eq!(p.node_count, 5);
        assert_eq!(p.edge_count, 4);
        assert_eq!(p.component_count, 2);
        assert_eq!(p.largest_component_size, 4);
        assert!((p.density - 0.4).abs() < 1e-12);
        // Triples: A 1, B 1, C 3 → 5; closed: A 1, B 1, C 1 → 3
        assert!((p.transitivity - 0.6).abs() < 1e-12);
        // Local clustering: A 1, B 1, C 1/3, D 0, Z 0
        assert!((p.average_clustering - (7.0 / 3.0) / 5.0).abs() < 1e-12);
        // Hops in {A,B,C,D}: AB1 AC1 AD2 BC1 BD2 CD1 → 8 / 6
        assert!((p.average_path_length - 8.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_graph_properties() {
        let p = NetworkProperties::compute(&InteractionGraph::default());
        assert_eq!(p, NetworkProperties::default());
    }

    #[test]
    fn test_hubs_and_clusters() {
        let g = triangle_with_tail();
        let results = CentralityAnalyzer::default().compute(&g);
        let hubs = identify_hubs(&g, &results, &CentralityWeights::default(), 2);
        assert_eq!(hubs.len(), 2);
        assert_eq!(hubs[0].protein_id.as_str(), "C");
        assert_eq!(hubs[0].degree, 3);

        let clusters = functional_clusters(&g);
        let names: Vec<Vec<&str>> = clusters
            .iter()
            .map(|c| c.iter().map(|p| p.as_str()).collect())
            .collect();
        assert_eq!(names, vec![vec!["A", "B", "C", "D"], vec!["Z"]]);
    }
}
