//! Local search MAP solver
//!
//! # Algorithm
//! 1. Reset must-infer nodes to `unknown`
//! 2. Greedy pass: in node id order, give each node its best label among
//!    the index suggestions and the most frequent candidates
//! 3. Repeat until a pass finds no improving move or the pass budget runs out:
//!    - per-node pass: move each node to its best improving candidate
//!    - per-arc pass: move both endpoints of an arc to a top pair of its type
//!
//! Candidate moves come from the feature index; their value is the exact
//! score delta over the node's incident features. The result is a local
//! optimum, not the global MAP. Ties go to the lowest node id, then the
//! lowest label id.

use super::candidates::CandidateGenerator;
use crate::config::LocalSearchConfig;
use crate::features::feature_index::FeatureIndex;
use crate::features::query::Assignment;
use crate::shared::models::{Label, LabelFrequencies, NodeId};
use crate::shared::ports::FeatureWeights;
use tracing::debug;

/// Minimum delta for a move to count as improving
const MIN_IMPROVEMENT: f64 = 1e-9;

/// Statistics of one solver run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchStats {
    /// Optimization passes performed (greedy pass excluded)
    pub passes: usize,
    /// Accepted single-node moves
    pub node_moves: usize,
    /// Accepted two-node arc moves
    pub arc_moves: usize,
    /// Score when optimization started
    pub initial_score: f64,
    /// Score at the local optimum
    pub final_score: f64,
    /// Accepted moves and resulting score of each optimization pass
    pub pass_log: Vec<PassRecord>,
}

/// Outcome of one optimization pass
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PassRecord {
    pub moves: usize,
    pub score: f64,
}

impl SearchStats {
    pub fn total_moves(&self) -> usize {
        self.node_moves + self.arc_moves
    }
}

/// Index-guided hill climbing
pub struct LocalSearchSolver<'a, W: FeatureWeights + ?Sized> {
    weights: &'a W,
    candidates: CandidateGenerator<'a>,
    config: &'a LocalSearchConfig,
}

impl<'a, W: FeatureWeights + ?Sized> LocalSearchSolver<'a, W> {
    pub fn new(
        weights: &'a W,
        index: &'a FeatureIndex,
        frequencies: &'a LabelFrequencies,
        config: &'a LocalSearchConfig,
    ) -> Self {
        Self {
            weights,
            candidates: CandidateGenerator::new(index, frequencies, config.candidate_limit),
            config,
        }
    }

    /// Full MAP inference: reset, greedy initialization, local optimization
    pub fn solve(&self, assignment: &mut Assignment<'_>) -> SearchStats {
        assignment.rescore(self.weights);
        assignment.clear_inferred(self.weights);
        self.initial_greedy_pass(assignment);
        self.optimize(assignment)
    }

    /// Assign every must-infer node its best label given the nodes already
    /// assigned. Nodes without candidates stay `unknown`.
    pub fn initial_greedy_pass(&self, assignment: &mut Assignment<'_>) {
        let nodes: Vec<NodeId> = assignment.inferred_nodes().collect();
        for node in nodes {
            if assignment.query().candidates(node).is_empty() {
                continue;
            }
            let labels = self.candidates.all(assignment, node);
            if let Some((label, _)) = self.best_label(assignment, node, &labels, None) {
                assignment.set_label(node, label, self.weights);
            }
        }
    }

    /// Hill-climb from the current labeling until a local optimum
    pub fn optimize(&self, assignment: &mut Assignment<'_>) -> SearchStats {
        assignment.rescore(self.weights);
        let mut stats = SearchStats {
            initial_score: assignment.score(),
            ..SearchStats::default()
        };

        while stats.passes < self.config.max_passes {
            stats.passes += 1;
            let node_moves = self.per_node_pass(assignment);
            let arc_moves = if self.config.arc_pass {
                self.per_arc_pass(assignment)
            } else {
                0
            };
            stats.node_moves += node_moves;
            stats.arc_moves += arc_moves;
            stats.pass_log.push(PassRecord {
                moves: node_moves + arc_moves,
                score: assignment.score(),
            });

            if node_moves + arc_moves == 0 {
                break;
            }
        }

        stats.final_score = assignment.score();
        debug!(
            "Local search: {} passes, {} node moves, {} arc moves, score {:.4} -> {:.4}",
            stats.passes, stats.node_moves, stats.arc_moves, stats.initial_score, stats.final_score
        );
        stats
    }

    /// One sweep over must-infer nodes; returns accepted moves
    fn per_node_pass(&self, assignment: &mut Assignment<'_>) -> usize {
        let unknown = assignment.query().unknown_label();
        let nodes: Vec<NodeId> = assignment.inferred_nodes().collect();
        let mut moves = 0;

        for node in nodes {
            if assignment.query().candidates(node).is_empty() {
                continue;
            }
            let current = assignment.label(node);
            let labels = if current == unknown {
                self.candidates.all(assignment, node)
            } else {
                self.candidates.relational(assignment, node)
            };

            if let Some((label, delta)) =
                self.best_label(assignment, node, &labels, Some(current))
            {
                if delta > MIN_IMPROVEMENT {
                    assignment.set_label(node, label, self.weights);
                    moves += 1;
                }
            }
        }
        moves
    }

    /// Joint moves of both endpoints of each arc between must-infer nodes
    fn per_arc_pass(&self, assignment: &mut Assignment<'_>) -> usize {
        let query = assignment.query();
        let limit = self.candidates.limit();
        let mut moves = 0;

        for arc in query.arcs() {
            if arc.a == arc.b
                || !assignment.is_must_infer(arc.a)
                || !assignment.is_must_infer(arc.b)
            {
                continue;
            }
            let current = (assignment.label(arc.a), assignment.label(arc.b));

            let mut best: Option<([(NodeId, Label); 2], f64)> = None;
            for entry in self
                .candidates
                .index()
                .top_pairwise(arc.kind, None, None)
                .take(limit)
            {
                let pair = (entry.feature.a, entry.feature.b);
                if pair == current
                    || !query.is_candidate(arc.a, pair.0)
                    || !query.is_candidate(arc.b, pair.1)
                {
                    continue;
                }
                let step = [(arc.a, pair.0), (arc.b, pair.1)];
                let delta = assignment.move_delta(&step, self.weights);
                if best.as_ref().map_or(true, |(_, d)| delta > *d) {
                    best = Some((step, delta));
                }
            }

            if let Some((step, delta)) = best {
                if delta > MIN_IMPROVEMENT {
                    assignment.apply_moves(&step, self.weights);
                    moves += 1;
                }
            }
        }
        moves
    }

    /// Best label of `labels` by exact delta (lowest label on ties),
    /// skipping `exclude`.
    fn best_label(
        &self,
        assignment: &Assignment<'_>,
        node: NodeId,
        labels: &[Label],
        exclude: Option<Label>,
    ) -> Option<(Label, f64)> {
        let mut best: Option<(Label, f64)> = None;
        for &label in labels {
            if Some(label) == exclude {
                continue;
            }
            let delta = assignment.label_delta(node, label, self.weights);
            if best.map_or(true, |(_, d)| delta > d) {
                best = Some((label, delta));
            }
        }
        best
    }
}
