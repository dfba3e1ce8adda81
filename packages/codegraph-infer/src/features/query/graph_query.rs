//! Query: immutable graph of nodes, candidate labels, arcs and factors

use crate::errors::{InferenceError, Result};
use crate::shared::models::{Factor, FeatureType, Label, NodeId, NodeKind};
use crate::shared::ports::{LabelChecker, NodeContext};
use rustc_hash::FxHashMap;

/// One node of a query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    /// Node type, as seen by the label checker
    pub kind: NodeKind,
    /// Sorted, deduplicated legal labels (empty: pinned to `unknown`)
    pub candidates: Vec<Label>,
}

/// Pairwise feature instance between two nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairwiseArc {
    pub a: NodeId,
    pub b: NodeId,
    pub kind: FeatureType,
}

/// Immutable query graph.
///
/// Adjacency lists map every node to the arcs and factors it takes part in,
/// so a label change only touches incident terms.
#[derive(Debug, Clone)]
pub struct Query {
    unknown_label: Label,
    nodes: Vec<NodeSpec>,
    arcs: Vec<PairwiseArc>,
    factors: Vec<Factor>,
    node_arcs: Vec<Vec<usize>>,
    node_factors: Vec<Vec<usize>>,
}

impl Query {
    /// Sentinel label for unset / out-of-vocabulary nodes
    pub fn unknown_label(&self) -> Label {
        self.unknown_label
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, node: NodeId) -> &NodeSpec {
        &self.nodes[node]
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// Legal labels of `node`
    pub fn candidates(&self, node: NodeId) -> &[Label] {
        &self.nodes[node].candidates
    }

    pub fn is_candidate(&self, node: NodeId, label: Label) -> bool {
        self.nodes[node].candidates.binary_search(&label).is_ok()
    }

    pub fn arcs(&self) -> &[PairwiseArc] {
        &self.arcs
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    /// Indices into [`Query::arcs`] of arcs touching `node`
    pub fn incident_arcs(&self, node: NodeId) -> &[usize] {
        &self.node_arcs[node]
    }

    /// Indices into [`Query::factors`] of factors containing `node`
    pub fn incident_factors(&self, node: NodeId) -> &[usize] {
        &self.node_factors[node]
    }
}

/// Incremental construction of a [`Query`]
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    unknown_label: Label,
    nodes: Vec<NodeSpec>,
    arcs: Vec<PairwiseArc>,
    factors: Vec<Factor>,
    factor_ids: FxHashMap<Factor, usize>,
}

impl QueryBuilder {
    pub fn new(unknown_label: Label) -> Self {
        Self {
            unknown_label,
            nodes: Vec::new(),
            arcs: Vec::new(),
            factors: Vec::new(),
            factor_ids: FxHashMap::default(),
        }
    }

    /// Add a node with an explicit candidate set
    pub fn add_node(&mut self, kind: NodeKind, candidates: impl IntoIterator<Item = Label>) -> NodeId {
        let mut candidates: Vec<Label> = candidates.into_iter().collect();
        candidates.sort_unstable();
        candidates.dedup();
        self.nodes.push(NodeSpec { kind, candidates });
        self.nodes.len() - 1
    }

    /// Add a node whose candidates come from the label checker
    pub fn add_checked_node(&mut self, kind: NodeKind, checker: &dyn LabelChecker) -> NodeId {
        let context = NodeContext {
            node: self.nodes.len(),
            kind,
        };
        let candidates = checker.permissible_labels(&context);
        self.add_node(kind, candidates)
    }

    /// Add a pairwise arc `a -[kind]- b`
    pub fn add_arc(&mut self, a: NodeId, b: NodeId, kind: FeatureType) -> Result<usize> {
        self.check_node(a)?;
        self.check_node(b)?;
        self.arcs.push(PairwiseArc { a, b, kind });
        Ok(self.arcs.len() - 1)
    }

    /// Add a factor over `nodes`; an identical node set returns the existing
    /// factor's index.
    pub fn add_factor(&mut self, nodes: impl IntoIterator<Item = NodeId>) -> Result<usize> {
        let factor = Factor::new(nodes)?;
        for &node in factor.nodes() {
            self.check_node(node)?;
        }
        if let Some(&existing) = self.factor_ids.get(&factor) {
            return Ok(existing);
        }
        self.factors.push(factor.clone());
        let id = self.factors.len() - 1;
        self.factor_ids.insert(factor, id);
        Ok(id)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn check_node(&self, node: NodeId) -> Result<()> {
        if node >= self.nodes.len() {
            return Err(InferenceError::NodeOutOfRange {
                node,
                num_nodes: self.nodes.len(),
            });
        }
        Ok(())
    }

    /// Freeze into an immutable query
    pub fn build(self) -> Query {
        let mut node_arcs = vec![Vec::new(); self.nodes.len()];
        for (i, arc) in self.arcs.iter().enumerate() {
            node_arcs[arc.a].push(i);
            if arc.b != arc.a {
                node_arcs[arc.b].push(i);
            }
        }

        let mut node_factors = vec![Vec::new(); self.nodes.len()];
        for (i, factor) in self.factors.iter().enumerate() {
            for &node in factor.nodes() {
                node_factors[node].push(i);
            }
        }

        Query {
            unknown_label: self.unknown_label,
            nodes: self.nodes,
            arcs: self.arcs,
            factors: self.factors,
            node_arcs,
            node_factors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EvenLabels;

    impl LabelChecker for EvenLabels {
        fn permissible_labels(&self, context: &NodeContext) -> Vec<Label> {
            if context.kind == 0 {
                vec![]
            } else {
                vec![6, 2, 4, 2]
            }
        }
    }

    #[test]
    fn test_build_adjacency() {
        let mut builder = QueryBuilder::new(0);
        let x = builder.add_node(1, [2, 1]);
        let y = builder.add_node(1, [1]);
        let z = builder.add_node(1, [3]);
        builder.add_arc(x, y, 0).unwrap();
        builder.add_arc(y, z, 1).unwrap();
        builder.add_factor([z, x, y]).unwrap();
        let query = builder.build();

        assert_eq!(query.num_nodes(), 3);
        assert_eq!(query.candidates(x), &[1, 2]);
        assert_eq!(query.incident_arcs(y), &[0, 1]);
        assert_eq!(query.incident_arcs(z), &[1]);
        assert_eq!(query.incident_factors(x), &[0]);
        assert!(query.is_candidate(x, 2));
        assert!(!query.is_candidate(x, 3));
    }

    #[test]
    fn test_self_loop_listed_once() {
        let mut builder = QueryBuilder::new(0);
        let x = builder.add_node(1, [1]);
        builder.add_arc(x, x, 0).unwrap();
        let query = builder.build();
        assert_eq!(query.incident_arcs(x), &[0]);
    }

    #[test]
    fn test_out_of_range_arc_rejected() {
        let mut builder = QueryBuilder::new(0);
        builder.add_node(1, [1]);
        let result = builder.add_arc(0, 5, 0);
        assert!(matches!(
            result,
            Err(InferenceError::NodeOutOfRange { node: 5, .. })
        ));
    }

    #[test]
    fn test_duplicate_factor_reused() {
        let mut builder = QueryBuilder::new(0);
        builder.add_node(1, [1]);
        builder.add_node(1, [1]);
        let first = builder.add_factor([0, 1]).unwrap();
        let second = builder.add_factor([1, 0, 1]).unwrap();
        assert_eq!(first, second);
        assert_eq!(builder.build().factors().len(), 1);
    }

    #[test]
    fn test_checked_node_candidates() {
        let mut builder = QueryBuilder::new(0);
        let pinned = builder.add_checked_node(0, &EvenLabels);
        let open = builder.add_checked_node(1, &EvenLabels);
        let query = builder.build();

        assert!(query.candidates(pinned).is_empty());
        assert_eq!(query.candidates(open), &[2, 4, 6]);
    }
}
