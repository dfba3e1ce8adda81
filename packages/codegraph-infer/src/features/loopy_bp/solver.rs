//! Max-product loopy belief propagation
//!
//! Messages are kept in log space, normalized so their maximum is zero, and
//! damped against the previous round. After every round the belief argmax
//! is decoded and scored; the best decoded labeling wins. The starting
//! assignment counts as the first observation only when every must-infer
//! node with candidates already holds one of them. The graph is loopy, so
//! the round cap is the normal exit.

use super::message_graph::MessageGraph;
use crate::config::BeliefPropagationConfig;
use crate::features::query::Assignment;
use crate::shared::models::{Label, LabelFrequencies, NodeId};
use crate::shared::ports::FeatureWeights;
use tracing::debug;

const MIN_IMPROVEMENT: f64 = 1e-9;

/// Statistics of one solver run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BpStats {
    /// Message-passing rounds performed
    pub rounds: usize,
    /// Whether the largest message change fell below the tolerance
    pub converged: bool,
    /// Score of the returned labeling
    pub best_score: f64,
    /// Largest message change in the last round
    pub final_change: f64,
}

/// factor → member position → message over the member's domain
type Messages = Vec<Vec<Vec<f64>>>;

pub struct LoopyBpSolver<'a, W: FeatureWeights + ?Sized> {
    weights: &'a W,
    frequencies: &'a LabelFrequencies,
    config: &'a BeliefPropagationConfig,
}

impl<'a, W: FeatureWeights + ?Sized> LoopyBpSolver<'a, W> {
    pub fn new(
        weights: &'a W,
        frequencies: &'a LabelFrequencies,
        config: &'a BeliefPropagationConfig,
    ) -> Self {
        Self {
            weights,
            frequencies,
            config,
        }
    }

    /// Refine `assignment` in place. A start where every must-infer node
    /// holds a candidate is never made worse.
    pub fn solve(&self, assignment: &mut Assignment<'_>) -> BpStats {
        assignment.rescore(self.weights);
        let graph = MessageGraph::build(assignment, self.weights, self.frequencies, self.config);

        let mut messages: Messages = graph
            .factors
            .iter()
            .map(|factor| {
                factor
                    .vars
                    .iter()
                    .map(|&v| vec![0.0; graph.variables[v].domain.len()])
                    .collect()
            })
            .collect();

        let mut stats = BpStats::default();
        let mut best: Option<(Vec<Label>, f64)> = if holds_candidates(assignment) {
            Some((assignment.labels().to_vec(), assignment.score()))
        } else {
            None
        };
        let mut scratch = assignment.clone();

        loop {
            stats.rounds += 1;
            stats.final_change = self.round(&graph, &mut messages);

            let decoded = decode(&graph, &messages);
            let moves: Vec<(NodeId, Label)> = decoded
                .iter()
                .enumerate()
                .filter(|&(node, &label)| scratch.label(node) != label)
                .map(|(node, &label)| (node, label))
                .collect();
            scratch.apply_moves(&moves, self.weights);

            let improved = best
                .as_ref()
                .map_or(true, |(_, score)| scratch.score() > score + MIN_IMPROVEMENT);
            if improved {
                best = Some((decoded, scratch.score()));
            }

            if stats.final_change <= self.config.tolerance {
                stats.converged = true;
                break;
            }
            if stats.rounds >= self.config.max_rounds {
                break;
            }
        }

        let best_labels = match best {
            Some((labels, _)) => labels,
            None => assignment.labels().to_vec(),
        };

        let moves: Vec<(NodeId, Label)> = best_labels
            .iter()
            .enumerate()
            .filter(|&(node, &label)| assignment.label(node) != label)
            .map(|(node, &label)| (node, label))
            .collect();
        assignment.apply_moves(&moves, self.weights);
        stats.best_score = assignment.score();

        debug!(
            "Loopy BP: {} rounds (converged: {}), last change {:.2e}, score {:.4}",
            stats.rounds, stats.converged, stats.final_change, stats.best_score
        );
        stats
    }

    /// Update every factor→variable message once; returns the largest change
    fn round(&self, graph: &MessageGraph, messages: &mut Messages) -> f64 {
        let damping = self.config.damping;
        let mut change: f64 = 0.0;

        for f in 0..graph.factors.len() {
            let fresh = self.factor_messages(graph, f, messages);
            for (position, mut message) in fresh.into_iter().enumerate() {
                normalize(&mut message);
                let old = &mut messages[f][position];
                for (o, n) in old.iter_mut().zip(message) {
                    let updated = damping * *o + (1.0 - damping) * n;
                    change = change.max((updated - *o).abs());
                    *o = updated;
                }
            }
        }
        change
    }

    /// New (unnormalized) messages from factor `f` to each member
    fn factor_messages(&self, graph: &MessageGraph, f: usize, messages: &Messages) -> Vec<Vec<f64>> {
        let vars = &graph.factors[f].vars;
        let incoming: Vec<Vec<f64>> = vars
            .iter()
            .map(|&v| variable_to_factor(graph, messages, v, f))
            .collect();
        let domains: Vec<&[Label]> = vars
            .iter()
            .map(|&v| graph.variables[v].domain.as_slice())
            .collect();

        let mut out: Vec<Vec<f64>> = domains
            .iter()
            .map(|d| vec![f64::NEG_INFINITY; d.len()])
            .collect();
        let mut labels: Vec<Label> = domains.iter().map(|d| d[0]).collect();

        if graph.configurations(f) <= self.config.max_factor_configurations {
            let mut idx = vec![0usize; vars.len()];
            loop {
                for (j, &i) in idx.iter().enumerate() {
                    labels[j] = domains[j][i];
                }
                let total = graph.potential(f, &labels, self.weights)
                    + idx.iter().enumerate().map(|(j, &i)| incoming[j][i]).sum::<f64>();
                for (j, &i) in idx.iter().enumerate() {
                    let value = total - incoming[j][i];
                    if value > out[j][i] {
                        out[j][i] = value;
                    }
                }
                if !advance(&mut idx, &domains) {
                    break;
                }
            }
        } else {
            // Condition every other member on its incoming argmax.
            let anchors: Vec<usize> = incoming.iter().map(|m| argmax(m)).collect();
            for j in 0..vars.len() {
                for (k, &anchor) in anchors.iter().enumerate() {
                    labels[k] = domains[k][anchor];
                }
                let context: f64 = anchors
                    .iter()
                    .enumerate()
                    .filter(|&(k, _)| k != j)
                    .map(|(k, &anchor)| incoming[k][anchor])
                    .sum();
                for (i, &label) in domains[j].iter().enumerate() {
                    labels[j] = label;
                    out[j][i] = graph.potential(f, &labels, self.weights) + context;
                }
            }
        }
        out
    }
}

/// Whether every must-infer node with candidates holds one of them
fn holds_candidates(assignment: &Assignment<'_>) -> bool {
    let query = assignment.query();
    assignment.inferred_nodes().all(|node| {
        query.candidates(node).is_empty() || query.is_candidate(node, assignment.label(node))
    })
}

/// Unary term plus every factor message into `v` except the one from `skip`
fn variable_to_factor(graph: &MessageGraph, messages: &Messages, v: NodeId, skip: usize) -> Vec<f64> {
    let var = &graph.variables[v];
    let mut out = var.unary.clone();
    for edge in var.edges.iter().filter(|e| e.factor != skip) {
        for (o, m) in out.iter_mut().zip(&messages[edge.factor][edge.position]) {
            *o += m;
        }
    }
    out
}

/// Belief argmax per variable (lowest label on ties)
fn decode(graph: &MessageGraph, messages: &Messages) -> Vec<Label> {
    graph
        .variables
        .iter()
        .map(|var| {
            let mut belief = var.unary.clone();
            for edge in &var.edges {
                for (b, m) in belief.iter_mut().zip(&messages[edge.factor][edge.position]) {
                    *b += m;
                }
            }
            var.domain[argmax(&belief)]
        })
        .collect()
}

/// Odometer step over the joint configuration space
fn advance(idx: &mut [usize], domains: &[&[Label]]) -> bool {
    for j in (0..idx.len()).rev() {
        idx[j] += 1;
        if idx[j] < domains[j].len() {
            return true;
        }
        idx[j] = 0;
    }
    false
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

fn normalize(message: &mut [f64]) {
    let max = message.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_finite() {
        for m in message.iter_mut() {
            *m -= max;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::query::{Query, QueryBuilder};
    use crate::features::weights::WeightStore;
    use crate::shared::models::{FactorFeature, PairwiseFeature};

    fn two_node_query() -> Query {
        let mut builder = QueryBuilder::new(0);
        builder.add_node(0, [1, 2]);
        builder.add_node(0, [1, 2]);
        builder.add_arc(0, 1, 0).unwrap();
        builder.build()
    }

    fn example_weights() -> WeightStore {
        let store = WeightStore::new();
        store.set(&PairwiseFeature::new(1, 1, 0).into(), 5.0);
        store.set(&PairwiseFeature::new(2, 2, 0).into(), 1.0);
        store
    }

    #[test]
    fn test_two_node_map() {
        let store = example_weights();
        let query = two_node_query();
        let freq = LabelFrequencies::new();
        let config = BeliefPropagationConfig::default();
        let solver = LoopyBpSolver::new(&store, &freq, &config);

        let mut a = Assignment::new(&query, &store);
        let stats = solver.solve(&mut a);

        assert_eq!(a.labels(), &[1, 1]);
        assert_eq!(a.score(), 5.0);
        assert_eq!(stats.best_score, 5.0);
        assert!(stats.converged);
        assert!(stats.rounds <= config.max_rounds);
    }

    #[test]
    fn test_given_node_is_clamped() {
        let store = example_weights();
        let query = two_node_query();
        let freq = LabelFrequencies::new();
        let config = BeliefPropagationConfig::default();
        let solver = LoopyBpSolver::new(&store, &freq, &config);

        let mut a = Assignment::new(&query, &store);
        a.set_label(0, 2, &store);
        a.set_must_infer(0, false);
        solver.solve(&mut a);

        assert_eq!(a.labels(), &[2, 2]);
        assert_eq!(a.score(), 1.0);
    }

    #[test]
    fn test_conditioned_factor_messages() {
        let store = WeightStore::new();
        store.set(&FactorFeature::from_labels([1, 2, 3]).into(), 4.0);

        let mut builder = QueryBuilder::new(0);
        let x = builder.add_node(0, [1]);
        let y = builder.add_node(0, [2]);
        let z = builder.add_node(0, [3, 4]);
        builder.add_factor([x, y, z]).unwrap();
        let query = builder.build();

        let mut a = Assignment::new(&query, &store);
        a.apply_moves(&[(x, 1), (y, 2)], &store);
        a.set_must_infer(x, false);
        a.set_must_infer(y, false);

        let freq = LabelFrequencies::new();
        let config = BeliefPropagationConfig::default().max_factor_configurations(1);
        let solver = LoopyBpSolver::new(&store, &freq, &config);
        solver.solve(&mut a);

        assert_eq!(a.labels(), &[1, 2, 3]);
        assert_eq!(a.score(), 4.0);
    }

    #[test]
    fn test_never_worse_than_candidate_start() {
        let store = WeightStore::new();
        store.set(&PairwiseFeature::new(2, 2, 0).into(), 3.0);
        store.set(&PairwiseFeature::new(1, 1, 0).into(), 1.0);
        let query = two_node_query();
        let freq = LabelFrequencies::new();
        let config = BeliefPropagationConfig::default().max_rounds(3);
        let solver = LoopyBpSolver::new(&store, &freq, &config);

        let mut a = Assignment::new(&query, &store);
        a.apply_moves(&[(0, 2), (1, 2)], &store);
        let start = a.score();
        let stats = solver.solve(&mut a);

        assert!(a.score() >= start);
        assert_eq!(stats.best_score, a.score());
        assert!(stats.rounds <= 3);
    }

    #[test]
    fn test_unknown_start_is_not_kept() {
        // Every candidate pair costs weight, the all-unknown start costs nothing.
        let store = WeightStore::new();
        for x in 1..=2 {
            for y in 1..=2 {
                store.set(&PairwiseFeature::new(x, y, 0).into(), -1.0);
            }
        }
        let query = two_node_query();
        let freq = LabelFrequencies::new();
        let config = BeliefPropagationConfig::default();
        let solver = LoopyBpSolver::new(&store, &freq, &config);

        let mut a = Assignment::new(&query, &store);
        let stats = solver.solve(&mut a);

        assert_eq!(a.labels(), &[1, 1]);
        assert_eq!(a.score(), -1.0);
        assert_eq!(stats.best_score, -1.0);
    }
}
