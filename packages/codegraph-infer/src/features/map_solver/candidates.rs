//! Candidate label generation for one node
//!
//! Shared by the local search solver and the pseudo-likelihood beam: labels
//! come from the feature index lists reachable through the node's incident
//! arcs and factors, given the labels of its neighbours, with label
//! frequency as the backoff when no relational evidence reaches the node.

use crate::features::feature_index::FeatureIndex;
use crate::features::query::Assignment;
use crate::shared::models::{Label, LabelFrequencies, NodeId};

/// Bounded candidate generator
#[derive(Debug, Clone, Copy)]
pub struct CandidateGenerator<'a> {
    index: &'a FeatureIndex,
    frequencies: &'a LabelFrequencies,
    limit: usize,
}

impl<'a> CandidateGenerator<'a> {
    /// `limit` caps the entries taken from each ranked list
    pub fn new(index: &'a FeatureIndex, frequencies: &'a LabelFrequencies, limit: usize) -> Self {
        Self {
            index,
            frequencies,
            limit,
        }
    }

    /// Labels suggested by the index for `node`, restricted to the node's
    /// candidate set. Sorted and deduplicated.
    pub fn relational(&self, assignment: &Assignment<'_>, node: NodeId) -> Vec<Label> {
        let query = assignment.query();
        let unknown = query.unknown_label();
        let mut out = Vec::new();

        for &i in query.incident_arcs(node) {
            let arc = query.arcs()[i];
            if arc.a == node && arc.b == node {
                out.extend(
                    self.index
                        .top_pairwise(arc.kind, None, None)
                        .filter(|r| r.feature.a == r.feature.b)
                        .take(self.limit)
                        .map(|r| r.feature.a),
                );
            } else if arc.a == node {
                let other = assignment.label(arc.b);
                if other != unknown {
                    out.extend(
                        self.index
                            .top_pairwise(arc.kind, None, Some(other))
                            .take(self.limit)
                            .map(|r| r.feature.a),
                    );
                }
            } else {
                let other = assignment.label(arc.a);
                if other != unknown {
                    out.extend(
                        self.index
                            .top_pairwise(arc.kind, Some(other), None)
                            .take(self.limit)
                            .map(|r| r.feature.b),
                    );
                }
            }
        }

        let mut fixed = Vec::new();
        for &i in query.incident_factors(node) {
            let factor = &query.factors()[i];
            fixed.clear();
            fixed.extend(
                factor
                    .nodes()
                    .iter()
                    .filter(|&&n| n != node)
                    .map(|&n| assignment.label(n))
                    .filter(|&l| l != unknown),
            );
            fixed.sort_unstable();

            for entry in self.index.top_factors(factor.len(), &fixed).take(self.limit) {
                if let Some(remaining) = entry.feature.remaining_after(&fixed) {
                    out.extend(remaining);
                }
            }
        }

        out.retain(|&l| query.is_candidate(node, l));
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Most frequent labels among the node's candidates
    pub fn frequent(&self, assignment: &Assignment<'_>, node: NodeId) -> Vec<Label> {
        self.frequencies
            .most_frequent_among(assignment.query().candidates(node), self.limit)
    }

    /// Relational candidates plus the frequency backoff, sorted and deduplicated
    pub fn all(&self, assignment: &Assignment<'_>, node: NodeId) -> Vec<Label> {
        let mut out = self.relational(assignment, node);
        out.extend(self.frequent(assignment, node));
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn index(&self) -> &'a FeatureIndex {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::features::query::QueryBuilder;
    use crate::features::weights::WeightStore;
    use crate::shared::models::{FactorFeature, PairwiseFeature};

    #[test]
    fn test_relational_uses_neighbour_label() {
        let store = WeightStore::new();
        store.set(&PairwiseFeature::new(1, 3, 0).into(), 2.0);
        store.set(&PairwiseFeature::new(1, 4, 0).into(), 1.0);
        store.set(&PairwiseFeature::new(2, 9, 0).into(), 7.0);
        let index = FeatureIndex::build(&store, IndexConfig::default());
        let freq = LabelFrequencies::new();

        let mut builder = QueryBuilder::new(0);
        let x = builder.add_node(0, [1, 2]);
        let y = builder.add_node(0, [3, 4, 9]);
        builder.add_arc(x, y, 0).unwrap();
        let query = builder.build();

        let mut a = Assignment::new(&query, &store);
        let generator = CandidateGenerator::new(&index, &freq, 8);
        assert!(generator.relational(&a, y).is_empty());

        a.set_label(x, 1, &store);
        assert_eq!(generator.relational(&a, y), vec![3, 4]);
    }

    #[test]
    fn test_relational_filters_to_candidates() {
        let store = WeightStore::new();
        store.set(&PairwiseFeature::new(5, 1, 0).into(), 2.0);
        store.set(&PairwiseFeature::new(6, 1, 0).into(), 3.0);
        let index = FeatureIndex::build(&store, IndexConfig::default());
        let freq = LabelFrequencies::new();

        let mut builder = QueryBuilder::new(0);
        let x = builder.add_node(0, [5]);
        let y = builder.add_node(0, [1]);
        builder.add_arc(x, y, 0).unwrap();
        let query = builder.build();

        let mut a = Assignment::new(&query, &store);
        a.set_label(y, 1, &store);
        let generator = CandidateGenerator::new(&index, &freq, 8);
        assert_eq!(generator.relational(&a, x), vec![5]);
    }

    #[test]
    fn test_factor_candidates_complete_the_factor() {
        let store = WeightStore::new();
        store.set(&FactorFeature::from_labels([1, 2, 3]).into(), 4.0);
        store.set(&FactorFeature::from_labels([1, 2, 7]).into(), 1.0);
        let index = FeatureIndex::build(&store, IndexConfig::default());
        let freq = LabelFrequencies::new();

        let mut builder = QueryBuilder::new(0);
        let nodes: Vec<_> = (0..3).map(|_| builder.add_node(0, 1..10)).collect();
        builder.add_factor(nodes.clone()).unwrap();
        let query = builder.build();

        let mut a = Assignment::new(&query, &store);
        a.apply_moves(&[(nodes[0], 1), (nodes[1], 2)], &store);
        let generator = CandidateGenerator::new(&index, &freq, 8);
        assert_eq!(generator.relational(&a, nodes[2]), vec![3, 7]);
    }

    #[test]
    fn test_frequency_backoff() {
        let store = WeightStore::new();
        let index = FeatureIndex::new(IndexConfig::default());
        let freq: LabelFrequencies = vec![(2, 10), (3, 5)].into_iter().collect();

        let mut builder = QueryBuilder::new(0);
        let x = builder.add_node(0, [1, 2, 3]);
        let query = builder.build();
        let a = Assignment::new(&query, &store);

        let generator = CandidateGenerator::new(&index, &freq, 2);
        assert_eq!(generator.frequent(&a, x), vec![2, 3]);
        assert_eq!(generator.all(&a, x), vec![2, 3]);
    }
}
