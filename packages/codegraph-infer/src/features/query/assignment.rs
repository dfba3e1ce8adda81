//! Assignment: mutable labeling of one query with incremental score tracking
//!
//! The tracked score always equals the sum of the weights of every active
//! feature at the current labeling (plus the gold penalty while loss
//! augmentation is enabled). Every mutation goes through [`Assignment::apply_moves`],
//! which adds the exact delta over incident arcs and factors only.

use super::graph_query::{PairwiseArc, Query};
use crate::shared::models::{Factor, FactorFeature, FeatureKey, Label, NodeId, PairwiseFeature};
use crate::shared::ports::FeatureWeights;

/// Margin applied to gold labels during loss-augmented inference
#[derive(Debug, Clone)]
struct GoldPenalty {
    gold: Vec<Label>,
    margin: f64,
}

/// Current label per node of one query
#[derive(Debug, Clone)]
pub struct Assignment<'q> {
    query: &'q Query,
    labels: Vec<Label>,
    must_infer: Vec<bool>,
    penalty: Option<GoldPenalty>,
    score: f64,
}

impl<'q> Assignment<'q> {
    /// Every node `unknown` and marked for inference
    pub fn new<W: FeatureWeights + ?Sized>(query: &'q Query, weights: &W) -> Self {
        let mut assignment = Self {
            query,
            labels: vec![query.unknown_label(); query.num_nodes()],
            must_infer: vec![true; query.num_nodes()],
            penalty: None,
            score: 0.0,
        };
        assignment.rescore(weights);
        assignment
    }

    pub fn query(&self) -> &'q Query {
        self.query
    }

    pub fn label(&self, node: NodeId) -> Label {
        self.labels[node]
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Whether the solver may change this node's label
    pub fn is_must_infer(&self, node: NodeId) -> bool {
        self.must_infer[node]
    }

    /// Mark a node as inferred (`true`) or given (`false`)
    pub fn set_must_infer(&mut self, node: NodeId, must_infer: bool) {
        self.must_infer[node] = must_infer;
    }

    /// Nodes the solver may change, in id order
    pub fn inferred_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.labels.len()).filter(move |&n| self.must_infer[n])
    }

    /// Tracked total score
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Set one label, updating the score
    pub fn set_label<W: FeatureWeights + ?Sized>(&mut self, node: NodeId, label: Label, weights: &W) {
        self.apply_moves(&[(node, label)], weights);
    }

    /// Set several labels at once (a later entry for the same node wins)
    pub fn apply_moves<W: FeatureWeights + ?Sized>(
        &mut self,
        moves: &[(NodeId, Label)],
        weights: &W,
    ) {
        let delta = self.move_delta(moves, weights);
        for &(node, label) in moves {
            self.labels[node] = label;
        }
        self.score += delta;
    }

    /// Exact score change of setting `node` to `label`
    pub fn label_delta<W: FeatureWeights + ?Sized>(&self, node: NodeId, label: Label, weights: &W) -> f64 {
        self.move_delta(&[(node, label)], weights)
    }

    /// Exact score change of applying `moves`, computed over the incident
    /// arcs and factors of the moved nodes only.
    pub fn move_delta<W: FeatureWeights + ?Sized>(&self, moves: &[(NodeId, Label)], weights: &W) -> f64 {
        if moves.is_empty() {
            return 0.0;
        }

        let after = |node: NodeId| {
            moves
                .iter()
                .rev()
                .find(|&&(n, _)| n == node)
                .map(|&(_, label)| label)
                .unwrap_or(self.labels[node])
        };
        let before = |node: NodeId| self.labels[node];

        let mut nodes: Vec<NodeId> = moves.iter().map(|&(n, _)| n).collect();
        nodes.sort_unstable();
        nodes.dedup();

        let mut arcs = Vec::new();
        let mut factors = Vec::new();
        for &node in &nodes {
            arcs.extend_from_slice(self.query.incident_arcs(node));
            factors.extend_from_slice(self.query.incident_factors(node));
        }
        if nodes.len() > 1 {
            arcs.sort_unstable();
            arcs.dedup();
            factors.sort_unstable();
            factors.dedup();
        }

        let mut delta = 0.0;
        for &i in &arcs {
            let arc = &self.query.arcs()[i];
            delta += weights.pairwise_weight(&arc_feature(arc, after))
                - weights.pairwise_weight(&arc_feature(arc, before));
        }
        for &i in &factors {
            let factor = &self.query.factors()[i];
            delta += weights.factor_weight(&factor_feature(factor, after))
                - weights.factor_weight(&factor_feature(factor, before));
        }
        for &node in &nodes {
            delta += self.penalty(node, after(node)) - self.penalty(node, before(node));
        }
        delta
    }

    /// Sum of incident feature weights of `node` at the current labeling
    pub fn node_score<W: FeatureWeights + ?Sized>(&self, node: NodeId, weights: &W) -> f64 {
        let label_of = |n: NodeId| self.labels[n];
        let arcs: f64 = self
            .query
            .incident_arcs(node)
            .iter()
            .map(|&i| weights.pairwise_weight(&arc_feature(&self.query.arcs()[i], label_of)))
            .sum();
        let factors: f64 = self
            .query
            .incident_factors(node)
            .iter()
            .map(|&i| weights.factor_weight(&factor_feature(&self.query.factors()[i], label_of)))
            .sum();
        arcs + factors + self.penalty(node, self.labels[node])
    }

    /// Full recomputation of the score (no incremental bookkeeping)
    pub fn recompute_score<W: FeatureWeights + ?Sized>(&self, weights: &W) -> f64 {
        let label_of = |n: NodeId| self.labels[n];
        let arcs: f64 = self
            .query
            .arcs()
            .iter()
            .map(|arc| weights.pairwise_weight(&arc_feature(arc, label_of)))
            .sum();
        let factors: f64 = self
            .query
            .factors()
            .iter()
            .map(|factor| weights.factor_weight(&factor_feature(factor, label_of)))
            .sum();
        arcs + factors + self.total_penalty()
    }

    /// Re-synchronize the tracked score with `weights` (after training writes)
    pub fn rescore<W: FeatureWeights + ?Sized>(&mut self, weights: &W) {
        self.score = self.recompute_score(weights);
    }

    /// Reset every must-infer node to `unknown`
    pub fn clear_inferred<W: FeatureWeights + ?Sized>(&mut self, weights: &W) {
        let unknown = self.query.unknown_label();
        let moves: Vec<(NodeId, Label)> = self
            .inferred_nodes()
            .filter(|&n| self.labels[n] != unknown)
            .map(|n| (n, unknown))
            .collect();
        self.apply_moves(&moves, weights);
    }

    /// Copy labels and inference flags from another assignment of the same query
    pub fn copy_labels_from<W: FeatureWeights + ?Sized>(&mut self, other: &Assignment<'_>, weights: &W) {
        self.labels.clone_from(&other.labels);
        self.must_infer.clone_from(&other.must_infer);
        self.rescore(weights);
    }

    // ------------------------------------------------------------------------
    // Loss augmentation
    // ------------------------------------------------------------------------

    /// Treat the current labels as gold and subtract `margin` from the score
    /// of every node that keeps its gold label.
    pub fn enable_gold_penalty(&mut self, margin: f64) {
        self.clear_penalty();
        self.penalty = Some(GoldPenalty {
            gold: self.labels.clone(),
            margin,
        });
        self.score += self.total_penalty();
    }

    /// Remove the gold penalty from the score
    pub fn clear_penalty(&mut self) {
        self.score -= self.total_penalty();
        self.penalty = None;
    }

    pub fn has_penalty(&self) -> bool {
        self.penalty.is_some()
    }

    /// Penalty contribution of `node` taking `label` (zero or `-margin`)
    pub fn penalty(&self, node: NodeId, label: Label) -> f64 {
        match &self.penalty {
            Some(p) if p.gold[node] == label => -p.margin,
            _ => 0.0,
        }
    }

    fn total_penalty(&self) -> f64 {
        (0..self.labels.len())
            .map(|n| self.penalty(n, self.labels[n]))
            .sum()
    }

    // ------------------------------------------------------------------------
    // Active features
    // ------------------------------------------------------------------------

    /// Multiset of every feature active at the current labeling
    pub fn active_features(&self) -> Vec<FeatureKey> {
        let label_of = |n: NodeId| self.labels[n];
        let mut out = Vec::with_capacity(self.query.arcs().len() + self.query.factors().len());
        out.extend(
            self.query
                .arcs()
                .iter()
                .map(|arc| FeatureKey::Pairwise(arc_feature(arc, label_of))),
        );
        out.extend(
            self.query
                .factors()
                .iter()
                .map(|factor| FeatureKey::Factor(factor_feature(factor, label_of))),
        );
        out
    }

    /// Features incident to `node` if it took `label` (others unchanged)
    pub fn features_with(&self, node: NodeId, label: Label) -> Vec<FeatureKey> {
        let label_of = |n: NodeId| if n == node { label } else { self.labels[n] };
        let mut out = Vec::new();
        for &i in self.query.incident_arcs(node) {
            out.push(FeatureKey::Pairwise(arc_feature(&self.query.arcs()[i], label_of)));
        }
        for &i in self.query.incident_factors(node) {
            out.push(FeatureKey::Factor(factor_feature(&self.query.factors()[i], label_of)));
        }
        out
    }
}

fn arc_feature(arc: &PairwiseArc, label_of: impl Fn(NodeId) -> Label) -> PairwiseFeature {
    PairwiseFeature::new(label_of(arc.a), label_of(arc.b), arc.kind)
}

fn factor_feature(factor: &Factor, label_of: impl Fn(NodeId) -> Label) -> FactorFeature {
    FactorFeature::from_labels(factor.nodes().iter().map(|&n| label_of(n)))
}
