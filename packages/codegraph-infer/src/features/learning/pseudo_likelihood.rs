//! Pseudo-likelihood learning with a bounded beam
//!
//! For each must-infer node, every other node is held at its gold label and
//! the conditional distribution over the node's labels is approximated by a
//! softmax over a beam: the gold label plus the best-scoring index
//! suggestions. The gradient for each beam label `l` is
//! `1[l == gold] - p(l)` on every feature the node activates with `l`.
//!
//! Writes go through [`WeightStore::update_exclusive`], so the learner needs
//! exclusive access to the store.

use crate::config::LocalSearchConfig;
use crate::features::feature_index::FeatureIndex;
use crate::features::map_solver::CandidateGenerator;
use crate::features::query::Assignment;
use crate::features::weights::WeightStore;
use crate::shared::models::{FeatureKey, Label, LabelFrequencies, NodeId};
use rustc_hash::FxHashMap;

/// Result of one pseudo-likelihood step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlOutcome {
    /// Sum of `ln p(gold)` over the visited nodes, before their update
    pub log_likelihood: f64,
    /// Nodes visited
    pub nodes: usize,
    /// Weight updates applied
    pub updated_features: usize,
}

pub struct PseudoLikelihoodLearner<'a> {
    weights: &'a mut WeightStore,
    candidates: CandidateGenerator<'a>,
    beam_size: usize,
}

impl<'a> PseudoLikelihoodLearner<'a> {
    pub fn new(
        weights: &'a mut WeightStore,
        index: &'a FeatureIndex,
        frequencies: &'a LabelFrequencies,
        search: &LocalSearchConfig,
        beam_size: usize,
    ) -> Self {
        Self {
            weights,
            candidates: CandidateGenerator::new(index, frequencies, search.candidate_limit),
            beam_size,
        }
    }

    pub fn learn(&mut self, gold: &Assignment<'_>, learning_rate: f64) -> PlOutcome {
        let unknown = gold.query().unknown_label();
        let mut outcome = PlOutcome::default();

        let nodes: Vec<NodeId> = gold.inferred_nodes().collect();
        for node in nodes {
            let gold_label = gold.label(node);
            if gold_label == unknown || gold.query().candidates(node).is_empty() {
                continue;
            }

            let beam = self.beam(gold, node, gold_label);
            let probabilities = softmax(beam.iter().map(|&(_, score)| score));

            let mut gradient: FxHashMap<FeatureKey, f64> = FxHashMap::default();
            for (&(label, _), &p) in beam.iter().zip(&probabilities) {
                let coefficient = if label == gold_label {
                    outcome.log_likelihood += p.ln();
                    1.0 - p
                } else {
                    -p
                };
                if coefficient == 0.0 {
                    continue;
                }
                for key in gold.features_with(node, label) {
                    *gradient.entry(key).or_insert(0.0) += coefficient;
                }
            }

            for (key, g) in gradient {
                if g != 0.0 {
                    self.weights.update_exclusive(&key, learning_rate * g);
                    outcome.updated_features += 1;
                }
            }
            outcome.nodes += 1;
        }
        outcome
    }

    /// Gold plus the top-scoring suggestions, as `(label, score)` with
    /// scores relative to the gold label
    fn beam(&self, gold: &Assignment<'_>, node: NodeId, gold_label: Label) -> Vec<(Label, f64)> {
        let weights: &WeightStore = &*self.weights;
        let mut scored: Vec<(Label, f64)> = self
            .candidates
            .all(gold, node)
            .into_iter()
            .filter(|&l| l != gold_label)
            .map(|l| (l, gold.label_delta(node, l, weights)))
            .collect();
        scored.sort_by(|x, y| y.1.total_cmp(&x.1).then(x.0.cmp(&y.0)));
        scored.truncate(self.beam_size.saturating_sub(1));
        scored.push((gold_label, 0.0));
        scored
    }
}

fn softmax(scores: impl Iterator<Item = f64> + Clone) -> Vec<f64> {
    let max = scores.clone().fold(f64::NEG_INFINITY, f64::max);
    let exp: Vec<f64> = scores.map(|s| (s - max).exp()).collect();
    let z: f64 = exp.iter().sum();
    exp.into_iter().map(|e| e / z).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexConfig;
    use crate::features::query::{Query, QueryBuilder};
    use crate::shared::models::PairwiseFeature;

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

    fn learn_once(store: &mut WeightStore, gold_labels: &[(NodeId, Label)], beam: usize) -> PlOutcome {
        let query = two_node_query();
        let index = FeatureIndex::build(store, IndexConfig::default());
        let freq = LabelFrequencies::new();
        let search = LocalSearchConfig::default();

        let mut gold = Assignment::new(&query, &*store);
        gold.apply_moves(gold_labels, &*store);
        let mut learner = PseudoLikelihoodLearner::new(store, &index, &freq, &search, beam);
        learner.learn(&gold, 1.0)
    }

    #[test]
    fn test_first_step_gradient() {
        let mut store = WeightStore::new();
        let outcome = learn_once(&mut store, &[(0, 1), (1, 1)], 8);

        // Node 0: uniform beam {1, 2}. Node 1 sees w(1,1,0) = 0.5 already.
        let p_gold = 1.0 / (1.0 + (-0.5f64).exp());
        assert_eq!(outcome.nodes, 2);
        assert!((store.get(&key(2, 1)) + 0.5).abs() < 1e-12);
        assert!((store.get(&key(1, 1)) - (0.5 + (1.0 - p_gold))).abs() < 1e-12);
        assert!((store.get(&key(1, 2)) + (1.0 - p_gold)).abs() < 1e-12);
        assert!((outcome.log_likelihood - (0.5f64.ln() + p_gold.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_likelihood_improves() {
        let mut store = WeightStore::new();
        let first = learn_once(&mut store, &[(0, 2), (1, 1)], 8);
        let second = learn_once(&mut store, &[(0, 2), (1, 1)], 8);
        assert!(second.log_likelihood > first.log_likelihood);
    }

    #[test]
    fn test_beam_of_one_is_a_no_op() {
        let mut store = WeightStore::new();
        let outcome = learn_once(&mut store, &[(0, 1), (1, 1)], 1);
        assert_eq!(outcome.updated_features, 0);
        assert_eq!(outcome.log_likelihood, 0.0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_gold_skipped() {
        let mut store = WeightStore::new();
        let outcome = learn_once(&mut store, &[(0, 1)], 8);
        assert_eq!(outcome.nodes, 1);
    }
}
