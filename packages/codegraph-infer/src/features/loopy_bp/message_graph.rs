//! Bipartite factor graph derived from a query
//!
//! One variable per query node. Arcs between two distinct nodes become
//! binary factors, query factors become factors over their node-id set, and
//! self-loop arcs fold into the unary term of their node together with the
//! gold penalty of loss-augmented inference.
//!
//! Domains of must-infer nodes hold only candidate labels: the most frequent
//! ones up to the cap, plus the current label when it is a candidate. Only
//! nodes without candidates get the `unknown` label.

use crate::config::BeliefPropagationConfig;
use crate::features::query::Assignment;
use crate::shared::models::{FactorFeature, FeatureType, Label, LabelFrequencies, NodeId, PairwiseFeature};
use crate::shared::ports::FeatureWeights;

/// Position of a variable inside one factor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Edge {
    pub factor: usize,
    pub position: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct Variable {
    /// Sorted labels this variable may take
    pub domain: Vec<Label>,
    /// Log-potential per domain entry
    pub unary: Vec<f64>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Potential {
    Arc(FeatureType),
    Factor,
}

#[derive(Debug, Clone)]
pub(crate) struct GraphFactor {
    /// Member variables (query node ids), in potential argument order
    pub vars: Vec<NodeId>,
    pub potential: Potential,
}

#[derive(Debug, Clone)]
pub(crate) struct MessageGraph {
    pub variables: Vec<Variable>,
    pub factors: Vec<GraphFactor>,
}

impl MessageGraph {
    pub fn build<W: FeatureWeights + ?Sized>(
        assignment: &Assignment<'_>,
        weights: &W,
        frequencies: &LabelFrequencies,
        config: &BeliefPropagationConfig,
    ) -> Self {
        let query = assignment.query();
        let unknown = query.unknown_label();

        let mut variables: Vec<Variable> = (0..query.num_nodes())
            .map(|node| {
                let current = assignment.label(node);
                let candidates = query.candidates(node);
                let mut domain = if !assignment.is_must_infer(node) {
                    vec![current]
                } else if candidates.is_empty() {
                    vec![unknown]
                } else {
                    let mut domain =
                        frequencies.most_frequent_among(candidates, config.max_domain_size);
                    if query.is_candidate(node, current) {
                        domain.push(current);
                    }
                    domain
                };
                domain.sort_unstable();
                domain.dedup();

                let unary = domain
                    .iter()
                    .map(|&label| assignment.penalty(node, label))
                    .collect();
                Variable {
                    domain,
                    unary,
                    edges: Vec::new(),
                }
            })
            .collect();

        let mut factors = Vec::with_capacity(query.arcs().len() + query.factors().len());
        for arc in query.arcs() {
            if arc.a == arc.b {
                let var = &mut variables[arc.a];
                for (i, &label) in var.domain.iter().enumerate() {
                    var.unary[i] += weights.pairwise_weight(&PairwiseFeature::new(label, label, arc.kind));
                }
                continue;
            }
            factors.push(GraphFactor {
                vars: vec![arc.a, arc.b],
                potential: Potential::Arc(arc.kind),
            });
        }
        for factor in query.factors() {
            factors.push(GraphFactor {
                vars: factor.nodes().to_vec(),
                potential: Potential::Factor,
            });
        }

        for (f, factor) in factors.iter().enumerate() {
            for (position, &var) in factor.vars.iter().enumerate() {
                variables[var].edges.push(Edge {
                    factor: f,
                    position,
                });
            }
        }

        Self { variables, factors }
    }

    /// Log-potential of factor `f` with its members labeled `labels`
    pub fn potential<W: FeatureWeights + ?Sized>(&self, f: usize, labels: &[Label], weights: &W) -> f64 {
        match self.factors[f].potential {
            Potential::Arc(kind) => {
                weights.pairwise_weight(&PairwiseFeature::new(labels[0], labels[1], kind))
            }
            Potential::Factor => {
                weights.factor_weight(&FactorFeature::from_labels(labels.iter().copied()))
            }
        }
    }

    /// Size of the joint configuration space of factor `f` (saturating)
    pub fn configurations(&self, f: usize) -> usize {
        self.factors[f]
            .vars
            .iter()
            .fold(1usize, |acc, &v| acc.saturating_mul(self.variables[v].domain.len()))
    }
}
