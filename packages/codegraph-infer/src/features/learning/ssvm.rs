//! Margin-rescaled structured SVM update
//!
//! # Algorithm
//! 1. Copy the gold labeling and penalize every gold label by the margin
//! 2. Run local search on the copy (loss-augmented MAP): the result is the
//!    most violating labeling the solver can reach
//! 3. Gradient = active features of gold minus active features of the
//!    violator (multiset counts)
//! 4. Add `learning_rate * count` per feature through the lock-free path
//!
//! Only reads the index and frequency table and writes weights through
//! [`WeightStore::add_delta`], so any number of learners may run at once
//! against the same store (Hogwild).

use super::gradient::FeatureDelta;
use super::stats::PrecisionStats;
use crate::config::LocalSearchConfig;
use crate::features::feature_index::FeatureIndex;
use crate::features::map_solver::LocalSearchSolver;
use crate::features::query::Assignment;
use crate::features::weights::WeightStore;
use crate::shared::models::{Label, LabelFrequencies};

/// Result of one SSVM step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SsvmOutcome {
    /// Gold score under the weights before the update
    pub gold_score: f64,
    /// Violator score (without the margin) before the update
    pub violator_score: f64,
    /// Must-infer nodes where the violator differs from gold
    pub mislabeled_nodes: usize,
    /// Features whose weight changed
    pub updated_features: usize,
    /// Labeling found by loss-augmented inference
    pub violator_labels: Vec<Label>,
}

impl SsvmOutcome {
    /// Whether the gold labeling already wins by the margin
    pub fn is_separated(&self) -> bool {
        self.updated_features == 0
    }
}

pub struct SsvmLearner<'a> {
    weights: &'a WeightStore,
    index: &'a FeatureIndex,
    frequencies: &'a LabelFrequencies,
    search: &'a LocalSearchConfig,
    margin: f64,
}

impl<'a> SsvmLearner<'a> {
    pub fn new(
        weights: &'a WeightStore,
        index: &'a FeatureIndex,
        frequencies: &'a LabelFrequencies,
        search: &'a LocalSearchConfig,
        margin: f64,
    ) -> Self {
        Self {
            weights,
            index,
            frequencies,
            search,
            margin,
        }
    }

    /// One online update from a gold labeling
    pub fn learn(
        &self,
        gold: &Assignment<'_>,
        learning_rate: f64,
        stats: Option<&PrecisionStats>,
    ) -> SsvmOutcome {
        let mut gold = gold.clone();
        gold.clear_penalty();
        gold.rescore(self.weights);

        let mut violator = gold.clone();
        violator.enable_gold_penalty(self.margin);
        LocalSearchSolver::new(self.weights, self.index, self.frequencies, self.search)
            .solve(&mut violator);
        violator.clear_penalty();

        let unknown = gold.query().unknown_label();
        let mut mislabeled_nodes = 0;
        for node in gold.inferred_nodes() {
            let (expected, predicted) = (gold.label(node), violator.label(node));
            if expected != predicted {
                mislabeled_nodes += 1;
            }
            if let Some(stats) = stats {
                stats.record(expected, predicted, unknown);
            }
        }

        let delta = FeatureDelta::between(&gold, &violator);
        delta.apply_concurrent(self.weights, learning_rate);

        SsvmOutcome {
            gold_score: gold.score(),
            violator_score: violator.score(),
            mislabeled_nodes,
            updated_features: delta.len(),
            violator_labels: violator.labels().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::features::query::{Query, QueryBuilder};
    use crate::shared::models::{FeatureKey, PairwiseFeature};

    fn two_node_query() -> Query {
        let mut builder = QueryBuilder::new(0);
        builder.add_node(0, [1, 2]);
        builder.add_node(0, [1, 2]);
        builder.add_arc(0, 1, 0).unwrap();
        builder.build()
    }

    fn key(a: u32, b: u32) -> FeatureKey {
        PairwiseFeature::new(a, b, 0).into()
    }

    #[test]
    fn test_violator_update() {
        let store = WeightStore::new();
        store.set(&key(1, 1), 1.0);
        store.set(&key(2, 2), 0.5);
        let index = FeatureIndex::build(&store, IndexConfig::default());
        let freq = LabelFrequencies::new();
        let search = LocalSearchConfig::default();
        let query = two_node_query();

        let mut gold = Assignment::new(&query, &store);
        gold.apply_moves(&[(0, 1), (1, 1)], &store);

        let learner = SsvmLearner::new(&store, &index, &freq, &search, 1.0);
        let outcome = learner.learn(&gold, 0.1, None);

        assert_eq!(outcome.mislabeled_nodes, 2);
        assert_eq!(outcome.updated_features, 2);
        assert_eq!(outcome.violator_score, 0.5);
        assert_eq!(outcome.violator_labels, vec![2, 2]);
        assert!((store.get(&key(1, 1)) - 1.1).abs() < 1e-12);
        assert!((store.get(&key(2, 2)) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_separated_example_leaves_weights() {
        let store = WeightStore::new();
        store.set(&key(1, 1), 5.0);
        store.set(&key(2, 2), 0.5);
        let index = FeatureIndex::build(&store, IndexConfig::default());
        let freq = LabelFrequencies::new();
        let search = LocalSearchConfig::default();
        let query = two_node_query();

        let mut gold = Assignment::new(&query, &store);
        gold.apply_moves(&[(0, 1), (1, 1)], &store);

        let stats = PrecisionStats::new();
        let learner = SsvmLearner::new(&store, &index, &freq, &search, 1.0);
        let outcome = learner.learn(&gold, 0.1, Some(&stats));

        assert!(outcome.is_separated());
        assert_eq!(store.get(&key(1, 1)), 5.0);
        assert_eq!(stats.snapshot().correct, 2);
    }

    #[test]
    fn test_given_nodes_not_relabeled() {
        let store = WeightStore::new();
        store.set(&key(2, 2), 3.0);
        let index = FeatureIndex::build(&store, IndexConfig::default());
        let freq = LabelFrequencies::new();
        let search = LocalSearchConfig::default();
        let query = two_node_query();

        let mut gold = Assignment::new(&query, &store);
        gold.apply_moves(&[(0, 1), (1, 1)], &store);
        gold.set_must_infer(0, false);

        let learner = SsvmLearner::new(&store, &index, &freq, &search, 1.0);
        let outcome = learner.learn(&gold, 0.5, None);

        // Node 0 stays 1, so (2, 2) is out of reach; (1, 2) scores 0 and
        // beats the penalized gold label.
        assert_eq!(outcome.mislabeled_nodes, 1);
        assert_eq!(store.get(&key(1, 1)), 0.5);
        assert_eq!(store.get(&key(1, 2)), -0.5);
        assert_eq!(store.get(&key(2, 2)), 3.0);
    }
}
