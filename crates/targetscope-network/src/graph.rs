//! Undirected weighted interaction graph over `usize` node indices.

use std::collections::{BTreeMap, HashMap, VecDeque};

use targetscope_common::{InteractionEdge, NetworkQuality, ProteinId};
use tracing::debug;

/// Immutable interaction graph. Node indices follow ascending protein id
/// order, so two graphs built from the same inputs are identical.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    nodes: Vec<ProteinId>,
    index: HashMap<ProteinId, usize>,
    quality: Vec<NetworkQuality>,
    /// (neighbour, weight in [0, 1]) sorted by neighbour index
    adjacency: Vec<Vec<(usize, f64)>>,
    edges: Vec<InteractionEdge>,
}

impl InteractionGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[ProteinId] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &ProteinId {
        &self.nodes[idx]
    }

    pub fn index_of(&self, id: &ProteinId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn contains(&self, id: &ProteinId) -> bool {
        self.index.contains_key(id)
    }

    pub fn quality(&self, idx: usize) -> NetworkQuality {
        self.quality[idx]
    }

    pub fn quality_of(&self, id: &ProteinId) -> Option<NetworkQuality> {
        self.index_of(id).map(|i| self.quality[i])
    }

    pub fn neighbors(&self, idx: usize) -> &[(usize, f64)] {
        &self.adjacency[idx]
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.adjacency[idx].len()
    }

    pub fn edges(&self) -> &[InteractionEdge] {
        &self.edges
    }

    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.adjacency[a]
            .binary_search_by_key(&b, |&(n, _)| n)
            .is_ok()
    }

    /// Connected components as index lists, each sorted ascending.
    /// Ordered by size descending, then by first member.
    pub fn components(&self) -> Vec<Vec<usize>> {
        let n = self.nodes.len();
        let mut seen = vec![false; n];
        let mut components = Vec::new();

        for start in 0..n {
            if seen[start] {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::new();
            seen[start] = true;
            queue.push_back(start);
            while let Some(v) = queue.pop_front() {
                component.push(v);
                for &(w, _) in &self.adjacency[v] {
                    if !seen[w] {
                        seen[w] = true;
                        queue.push_back(w);
                    }
                }
            }
            component.sort_unstable();
            components.push(component);
        }

        components.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a[0].cmp(&b[0])));
        components
    }
}

/// Accumulates nodes and edges, deduplicating by canonical pair.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    threshold: u16,
    nodes: BTreeMap<ProteinId, NetworkQuality>,
    edges: BTreeMap<(ProteinId, ProteinId), u16>,
    discarded: usize,
}

impl GraphBuilder {
    /// Edges scoring below `threshold` are discarded on insertion.
    pub fn new(threshold: u16) -> Self {
        Self {
            threshold,
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            discarded: 0,
        }
    }

    /// Insert a node or merge its quality tag with an existing one.
    pub fn add_node(&mut self, id: ProteinId, quality: NetworkQuality) {
        self.nodes
            .entry(id)
            .and_modify(|q| *q = q.merge(quality))
            .or_insert(quality);
    }

    /// Insert an edge; both endpoints inherit `quality`. Returns false when
    /// the edge was below threshold.
    pub fn add_edge(&mut self, edge: InteractionEdge, quality: NetworkQuality) -> bool {
        if edge.confidence_score < self.threshold {
            self.discarded += 1;
            return false;
        }
        self.add_node(edge.protein_a.clone(), quality);
        self.add_node(edge.protein_b.clone(), quality);
        let score = edge.confidence_score;
        self.edges
            .entry(edge.key())
            .and_modify(|s| *s = (*s).max(score))
            .or_insert(score);
        true
    }

    pub fn build(self) -> InteractionGraph {
        let nodes: Vec<ProteinId> = self.nodes.keys().cloned().collect();
        let quality: Vec<NetworkQuality> = self.nodes.values().copied().collect();
        let index: HashMap<ProteinId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i))
            .collect();

        let mut adjacency = vec![Vec::new(); nodes.len()];
        let mut edges = Vec::with_capacity(self.edges.len());
        for ((a, b), score) in self.edges {
            let (Some(&ia), Some(&ib)) = (index.get(&a), index.get(&b)) else {
                continue;
            };
            let Some(edge) = InteractionEdge::new(a, b, score) else {
                continue;
            };
            let w = edge.weight();
            adjacency[ia].push((ib, w));
            adjacency[ib].push((ia, w));
            edges.push(edge);
        }
        for list in &mut adjacency {
            list.sort_by_key(|&(n, _)| n);
        }

        debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            discarded = self.discarded,
            "Built interaction graph"
        );

        InteractionGraph {
            nodes,
            index,
            quality,
            adjacency,
            edges,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(a: &str, b: &str, s: u16) -> InteractionEdge {
        InteractionEdge::new(a.into(), b.into(), s).unwrap()
    }

    #[test]
    fn test_duplicate_edges_keep_max_score() {
        let mut b = GraphBuilder::new(400);
        b.add_edge(edge("TP53", "MDM2", 700), NetworkQuality::Measured);
        b.add_edge(edge("MDM2", "TP53", 950), NetworkQuality::Measured);
        let g = b.build();
        assert_eq!(g.edge_count(), 1);
        assert_eq!(g.edges()[0].confidence_score, 950);
    }

    #[test]
    fn test_below_threshold_discarded() {
        let mut b = GraphBuilder::new(400);
        assert!(!b.add_edge(edge("TP53", "MDM2", 399), NetworkQuality::Measured));
        b.add_node("TP53".into(), NetworkQuality::MeasuredIsolate);
        let g = b.build();
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
        assert_eq!(g.quality_of(&"TP53".into()), Some(NetworkQuality::MeasuredIsolate));
    }

    #[test]
    fn test_quality_merge_on_shared_node() {
        let mut b = GraphBuilder::new(1);
        b.add_node("EGFR".into(), NetworkQuality::NoData);
        b.add_edge(edge("EGFR", "GRB2", 900), NetworkQuality::Fallback);
        let g = b.build();
        assert_eq!(g.quality_of(&"EGFR".into()), Some(NetworkQuality::Fallback));
    }

    #[test]
    fn test_components_ordered_by_size() {
        let mut b = GraphBuilder::new(1);
        b.add_edge(edge("A", "B", 500), NetworkQuality::Measured);
        b.add_edge(edge("X", "Y", 500), NetworkQuality::Measured);
        b.add_edge(edge("Y", "Z", 500), NetworkQuality::Measured);
        b.add_node("Q".into(), NetworkQuality::NoData);
        let g = b.build();
        let comps = g.components();
        assert_eq!(comps.len(), 3);
        assert_eq!(comps[0].len(), 3);
        assert_eq!(comps[1].len(), 2);
        assert_eq!(g.node(comps[2][0]).as_str(), "Q");
    }
}
