//! Centrality analysis over the interaction graph.
//!
//! - Degree: neighbour count / (n - 1)
//! - Betweenness: Brandes with Dijkstra on distance = 1 - weight
//! - Closeness: (r - 1) / Σ d(v, u) within v's component
//! - Eigenvector: power iteration on A + I
//! - PageRank: weighted random walk, dangling mass spread uniformly
//!
//! Each measure is min-max normalised independently across the node set.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};

use targetscope_common::{EngineError, NetworkQuality, ProteinId, Result};
use tracing::{debug, info};

use crate::graph::InteractionGraph;
use crate::normalise::min_max;

/// Two path lengths closer than this are considered equal.
const PATH_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralitySettings {
    #[serde(default = "default_damping")]
    pub pagerank_damping: f64,
    #[serde(default = "default_iterations")]
    pub pagerank_max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub pagerank_tolerance: f64,
    #[serde(default = "default_iterations")]
    pub eigenvector_max_iterations: usize,
    #[serde(default = "default_tolerance")]
    pub eigenvector_tolerance: f64,
    /// Floor for edge distances so that a confidence-1000 edge is not free.
    #[serde(default = "default_min_distance")]
    pub min_distance: f64,
}

fn default_damping() -> f64 { 0.85 }
fn default_iterations() -> usize { 100 }
fn default_tolerance() -> f64 { 1e-9 }
fn default_min_distance() -> f64 { 1e-3 }

impl Default for CentralitySettings {
    fn default() -> Self {
        Self {
            pagerank_damping: default_damping(),
            pagerank_max_iterations: default_iterations(),
            pagerank_tolerance: default_tolerance(),
            eigenvector_max_iterations: default_iterations(),
            eigenvector_tolerance: default_tolerance(),
            min_distance: default_min_distance(),
        }
    }
}

impl CentralitySettings {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.pagerank_damping) {
            return Err(EngineError::config(format!(
                "pagerank_damping must be in [0, 1), got {}",
                self.pagerank_damping
            )));
        }
        if self.pagerank_max_iterations == 0 || self.eigenvector_max_iterations == 0 {
            return Err(EngineError::config("iteration limits must be at least 1"));
        }
        if self.min_distance <= 0.0 {
            return Err(EngineError::config("min_distance must be positive"));
        }
        Ok(())
    }
}

/// The five centrality measures for one node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CentralityMeasures {
    pub degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
    pub eigenvector: f64,
    pub pagerank: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityResult {
    pub protein_id: ProteinId,
    pub raw: CentralityMeasures,
    pub normalized: CentralityMeasures,
    pub network_quality: NetworkQuality,
}

/// Weights combining the normalised measures into one centrality score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CentralityWeights {
    #[serde(default = "default_weight")]
    pub degree: f64,
    #[serde(default = "default_weight")]
    pub betweenness: f64,
    #[serde(default = "default_weight")]
    pub closeness: f64,
    #[serde(default = "default_weight")]
    pub eigenvector: f64,
    #[serde(default = "default_weight")]
    pub pagerank: f64,
}

fn default_weight() -> f64 { 0.2 }

impl Default for CentralityWeights {
    fn default() -> Self {
        Self {
            degree: 0.2,
            betweenness: 0.2,
            closeness: 0.2,
            eigenvector: 0.2,
            pagerank: 0.2,
        }
    }
}

impl CentralityWeights {
    pub fn as_array(&self) -> [f64; 5] {
        [self.degree, self.betweenness, self.closeness, self.eigenvector, self.pagerank]
    }

    /// Weights must be non-negative and sum to 1.0 within 1e-6.
    pub fn validate(&self) -> Result<()> {
        let arr = self.as_array();
        if arr.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::config("centrality weights must be non-negative"));
        }
        let sum: f64 = arr.iter().sum();
        if (sum - 1.0).abs() > 1e-6 {
            return Err(EngineError::config(format!(
                "centrality weights must sum to 1.0, got {sum:.6}"
            )));
        }
        Ok(())
    }

    /// Weighted average of normalised measures.
    pub fn composite(&self, m: &CentralityMeasures) -> f64 {
        self.degree * m.degree
            + self.betweenness * m.betweenness
            + self.closeness * m.closeness
            + self.eigenvector * m.eigenvector
            + self.pagerank * m.pagerank
    }
}

/// Min-heap entry for Dijkstra.
#[derive(Debug, Clone, Copy, PartialEq)]
struct State {
    dist: f64,
    node: usize,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub struct CentralityAnalyzer {
    settings: CentralitySettings,
}

impl Default for CentralityAnalyzer {
    fn default() -> Self {
        Self::new(CentralitySettings::default())
    }
}

impl CentralityAnalyzer {
    pub fn new(settings: CentralitySettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &CentralitySettings {
        &self.settings
    }

    /// Compute all five measures for every node.
    pub fn compute(&self, graph: &InteractionGraph) -> BTreeMap<ProteinId, CentralityResult> {
        let n = graph.node_count();
        if n == 0 {
            return BTreeMap::new();
        }

        let degree = self.degree(graph);
        let betweenness = self.betweenness(graph);
        let closeness = self.closeness(graph);
        let eigenvector = self.eigenvector(graph);
        let pagerank = self.pagerank(graph);

        let degree_n = min_max(&degree);
        let betweenness_n = min_max(&betweenness);
        let closeness_n = min_max(&closeness);
        let eigenvector_n = min_max(&eigenvector);
        let pagerank_n = min_max(&pagerank);

        let results: BTreeMap<ProteinId, CentralityResult> = (0..n)
            .map(|i| {
                let id = graph.node(i).clone();
                let result = CentralityResult {
                    protein_id: id.clone(),
                    raw: CentralityMeasures {
                        degree: degree[i],
                        betweenness: betweenness[i],
                        closeness: closeness[i],
                        eigenvector: eigenvector[i],
                        pagerank: pagerank[i],
                    },
                    normalized: CentralityMeasures {
                        degree: degree_n[i],
                        betweenness: betweenness_n[i],
                        closeness: closeness_n[i],
                        eigenvector: eigenvector_n[i],
                        pagerank: pagerank_n[i],
                    },
                    network_quality: graph.quality(i),
                };
                (id, result)
            })
            .collect();

        info!(nodes = n, edges = graph.edge_count(), "Computed centrality measures");
        results
    }

    // ── Degree ─────────────────────────────────────────────────────────────

    pub fn degree(&self, graph: &InteractionGraph) -> Vec<f64> {
        let n = graph.node_count();
        if n < 2 {
            return vec![0.0; n];
        }
        let denom = (n - 1) as f64;
        (0..n).map(|i| graph.degree(i) as f64 / denom).collect()
    }

    // ── Shortest paths ─────────────────────────────────────────────────────

    fn distance(&self, weight: f64) -> f64 {
        (1.0 - weight).max(self.settings.min_distance)
    }

    /// Dijkstra from `source`. Returns distances (infinite when unreachable).
    fn shortest_paths(&self, graph: &InteractionGraph, source: usize) -> Vec<f64> {
        let n = graph.node_count();
        let mut dist = vec![f64::INFINITY; n];
        let mut heap = BinaryHeap::new();
        dist[source] = 0.0;
        heap.push(State { dist: 0.0, node: source });

        while let Some(State { dist: d, node: v }) = heap.pop() {
            if d > dist[v] {
                continue;
            }
            for &(w, weight) in graph.neighbors(v) {
                let alt = d + self.distance(weight);
                if alt < dist[w] {
                    dist[w] = alt;
                    heap.push(State { dist: alt, node: w });
                }
            }
        }
        dist
    }

    // ── Betweenness (Brandes) ──────────────────────────────────────────────

    /// Normalised by 2 / ((n-1)(n-2)) for n > 2 so raw values are comparable
    /// across graph sizes.
    pub fn betweenness(&self, graph: &InteractionGraph) -> Vec<f64> {
        let n = graph.node_count();
        let mut centrality = vec![0.0; n];

        for s in 0..n {
            let mut stack: Vec<usize> = Vec::with_capacity(n);
            let mut pred: Vec<Vec<usize>> = vec![Vec::new(); n];
            let mut sigma = vec![0.0_f64; n];
            let mut dist = vec![f64::INFINITY; n];
            let mut settled = vec![false; n];
            let mut heap = BinaryHeap::new();

            sigma[s] = 1.0;
            dist[s] = 0.0;
            heap.push(State { dist: 0.0, node: s });

            while let Some(State { dist: d, node: v }) = heap.pop() {
                if settled[v] || d > dist[v] + PATH_EPSILON {
                    continue;
                }
                settled[v] = true;
                stack.push(v);

                for &(w, weight) in graph.neighbors(v) {
                    if settled[w] {
                        continue;
                    }
                    let alt = dist[v] + self.distance(weight);
                    if alt < dist[w] - PATH_EPSILON {
                        dist[w] = alt;
                        sigma[w] = sigma[v];
                        pred[w].clear();
                        pred[w].push(v);
                        heap.push(State { dist: alt, node: w });
                    } else if (alt - dist[w]).abs() <= PATH_EPSILON {
                        sigma[w] += sigma[v];
                        pred[w].push(v);
                    }
                }
            }

            // Accumulation
            let mut delta = vec![0.0; n];
            while let Some(w) = stack.pop() {
                for &v in &pred[w] {
                    delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
                }
                if w != s {
                    centrality[w] += delta[w];
                }
            }
        }

        // Each undirected pair is counted from both endpoints
        for c in &mut centrality {
            *c /= 2.0;
        }
        if n > 2 {
            let norm = 2.0 / ((n - 1) * (n - 2)) as f64;
            for c in &mut centrality {
                *c *= norm;
            }
        }
        centrality
    }

    // ── Closeness ──────────────────────────────────────────────────────────

    pub fn closeness(&self, graph: &InteractionGraph) -> Vec<f64> {
        let n = graph.node_count();
        (0..n)
            .map(|v| {
                let dist = self.shortest_paths(graph, v);
                let (reachable, total) = dist
                    .iter()
                    .filter(|d| d.is_finite())
                    .fold((0usize, 0.0_f64), |(r, t), &d| (r + 1, t + d));
                if reachable <= 1 || total <= 0.0 {
                    0.0
                } else {
                    (reachable - 1) as f64 / total
                }
            })
            .collect()
    }

    // ── Eigenvector ────────────────────────────────────────────────────────

    /// Power iteration on A + I; the identity shift guarantees convergence on
    /// bipartite graphs without changing the dominant eigenvector.
    pub fn eigenvector(&self, graph: &InteractionGraph) -> Vec<f64> {
        let n = graph.node_count();
        if n == 0 {
            return vec![];
        }
        let mut x = vec![1.0 / (n as f64).sqrt(); n];

        for iteration in 0..self.settings.eigenvector_max_iterations {
            let mut next: Vec<f64> = (0..n)
                .map(|v| {
                    x[v] + graph
                        .neighbors(v)
                        .iter()
                        .map(|&(w, weight)| weight * x[w])
                        .sum::<f64>()
                })
                .collect();

            let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm <= 0.0 {
                return vec![0.0; n];
            }
            for v in &mut next {
                *v /= norm;
            }

            let diff: f64 = next.iter().zip(&x).map(|(a, b)| (a - b).abs()).sum();
            x = next;
            if diff < self.settings.eigenvector_tolerance {
                debug!("Eigenvector centrality converged in {} iterations", iteration + 1);
                break;
            }
        }
        x
    }

    // ── PageRank ───────────────────────────────────────────────────────────

    pub fn pagerank(&self, graph: &InteractionGraph) -> Vec<f64> {
        let n = graph.node_count();
        if n == 0 {
            return vec![];
        }
        let d = self.settings.pagerank_damping;
        let nf = n as f64;
        let strength: Vec<f64> = (0..n)
            .map(|v| graph.neighbors(v).iter().map(|&(_, w)| w).sum())
            .collect();

        let mut pr = vec![1.0 / nf; n];
        for iteration in 0..self.settings.pagerank_max_iterations {
            let dangling: f64 = (0..n)
                .filter(|&v| strength[v] <= 0.0)
                .map(|v| pr[v])
                .sum();
            let base = (1.0 - d) / nf + d * dangling / nf;

            let next: Vec<f64> = (0..n)
                .map(|v| {
                    let incoming: f64 = graph
                        .neighbors(v)
                        .iter()
                        .filter(|&&(u, _)| strength[u] > 0.0)
                        .map(|&(u, w)| pr[u] * w / strength[u])
                        .sum();
                    base + d * incoming
                })
                .collect();

            let diff: f64 = next.iter().zip(&pr).map(|(a, b)| (a - b).abs()).sum();
            pr = next;
            if diff < self.settings.pagerank_tolerance {
                debug!("PageRank converged in {} iterations", iteration + 1);
                break;
            }
        }
        pr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::GraphBuilder;
    use targetscope_common::InteractionEdge;

    fn graph(edges: &[(&str, &str, u16)], isolated: &[&str]) -> InteractionGraph {
        let mut b = GraphBuilder::new(1);
        for (a, c, s) in edges {
            b.add_edge(
                InteractionEdge::new((*a).into(), (*c).into(), *s).unwrap(),
                NetworkQuality::Measured,
            );
        }
        for id in isolated {
            b.add_node((*id).into(), NetworkQuality::NoData);
        }
        b.build()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_single_node_normalises_to_zero() {
        let g = graph(&[], &["TP53"]);
        let results = CentralityAnalyzer::default().compute(&g);
        let r = &results[&ProteinId::from("TP53")];
        assert_eq!(r.normalized, CentralityMeasures::default());
        assert_eq!(r.raw.closeness, 0.0);
        assert_eq!(r.raw.degree, 0.0);
    }

    #[test]
    fn test_star_centre_dominates() {
        let g = graph(
            &[("HUB", "A", 900), ("HUB", "B", 900), ("HUB", "C", 900), ("HUB", "D", 900)],
            &[],
        );
        let results = CentralityAnalyzer::default().compute(&g);
        let hub = &results[&ProteinId::from("HUB")];
        assert!(approx(hub.raw.degree, 1.0));
        assert!(approx(hub.raw.betweenness, 1.0));
        assert_eq!(hub.normalized.degree, 1.0);
        assert_eq!(hub.normalized.pagerank, 1.0);
        assert_eq!(hub.normalized.eigenvector, 1.0);
        let leaf = &results[&ProteinId::from("A")];
        assert_eq!(leaf.normalized.betweenness, 0.0);
        assert_eq!(leaf.raw.betweenness, 0.0);
    }

    #[test]
    fn test_path_betweenness_middle_node() {
        // A - B - C: B lies on the only A..C path
        let g = graph(&[("A", "B", 500), ("B", "C", 500)], &[]);
        let a = CentralityAnalyzer::default();
        let bc = a.betweenness(&g);
        let b = g.index_of(&"B".into()).unwrap();
        assert!(approx(bc[b], 1.0));
    }

    #[test]
    fn test_betweenness_prefers_strong_edges() {
        // Square A-B-D and A-C-D; the B route carries stronger edges.
        let g = graph(
            &[("A", "B", 900), ("B", "D", 900), ("A", "C", 500), ("C", "D", 500)],
            &[],
        );
        let bc = CentralityAnalyzer::default().betweenness(&g);
        let b = g.index_of(&"B".into()).unwrap();
        let c = g.index_of(&"C".into()).unwrap();
        assert!(bc[b] > bc[c]);
    }

    #[test]
    fn test_closeness_ignores_unreachable_component() {
        let edges = [("A", "B", 800), ("B", "C", 600)];
        let base = graph(&edges, &[]);
        let extended = graph(&[("A", "B", 800), ("B", "C", 600), ("X", "Y", 900)], &["Z"]);
        let a = CentralityAnalyzer::default();
        let c1 = a.closeness(&base);
        let c2 = a.closeness(&extended);
        for id in ["A", "B", "C"] {
            let i1 = base.index_of(&id.into()).unwrap();
            let i2 = extended.index_of(&id.into()).unwrap();
            assert!(approx(c1[i1], c2[i2]), "closeness changed for {id}");
        }
    }

    #[test]
    fn test_full_confidence_edge_has_floor_distance() {
        let g = graph(&[("A", "B", 1000)], &[]);
        let c = CentralityAnalyzer::default().closeness(&g);
        assert!(approx(c[0], 1.0 / 1e-3));
    }

    #[test]
    fn test_pagerank_sums_to_one_with_dangling() {
        let g = graph(&[("A", "B", 700), ("B", "C", 700)], &["D"]);
        let pr = CentralityAnalyzer::default().pagerank(&g);
        let total: f64 = pr.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_weights_validation() {
        assert!(CentralityWeights::default().validate().is_ok());
        let bad = CentralityWeights { degree: 0.5, ..Default::default() };
        assert!(bad.validate().is_err());
        let neg = CentralityWeights {
            degree: -0.2,
            betweenness: 0.6,
            ..Default::default()
        };
        assert!(neg.validate().is_err());
    }

    #[test]
    fn test_compute_is_deterministic() {
        let edges = [("EGFR", "GRB2", 990), ("GRB2", "SOS1", 980), ("EGFR", "ERBB2", 950), ("SOS1", "KRAS", 970)];
        let a = CentralityAnalyzer::default();
        let r1 = a.compute(&graph(&edges, &[]));
        let r2 = a.compute(&graph(&edges, &[]));
        assert_eq!(r1, r2);
    }
}
