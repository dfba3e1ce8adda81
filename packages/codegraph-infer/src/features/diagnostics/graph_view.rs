//! Human-readable view of a labeled query graph

use crate::errors::Result;
use crate::features::query::Assignment;
use crate::shared::models::{FactorFeature, FeatureType, Label, NodeId, PairwiseFeature};
use crate::shared::ports::{FeatureWeights, StringTable};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub label: String,
    pub inferred: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcView {
    pub a: NodeId,
    pub b: NodeId,
    pub kind: FeatureType,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorView {
    pub nodes: Vec<NodeId>,
    pub weight: f64,
}

/// Labeled graph with the weight of every active feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphView {
    pub nodes: Vec<NodeView>,
    pub arcs: Vec<ArcView>,
    pub factors: Vec<FactorView>,
    pub score: f64,
}

impl GraphView {
    pub fn build<W: FeatureWeights + ?Sized>(
        assignment: &Assignment<'_>,
        weights: &W,
        strings: &dyn StringTable,
    ) -> Self {
        let query = assignment.query();

        let nodes = (0..query.num_nodes())
            .map(|id| NodeView {
                id,
                label: render_label(strings, assignment.label(id)),
                inferred: assignment.is_must_infer(id),
            })
            .collect();

        let arcs = query
            .arcs()
            .iter()
            .map(|arc| ArcView {
                a: arc.a,
                b: arc.b,
                kind: arc.kind,
                weight: weights.pairwise_weight(&PairwiseFeature::new(
                    assignment.label(arc.a),
                    assignment.label(arc.b),
                    arc.kind,
                )),
            })
            .collect();

        let factors = query
            .factors()
            .iter()
            .map(|factor| FactorView {
                nodes: factor.nodes().to_vec(),
                weight: weights.factor_weight(&FactorFeature::from_labels(
                    factor.nodes().iter().map(|&n| assignment.label(n)),
                )),
            })
            .collect();

        Self {
            nodes,
            arcs,
            factors,
            score: assignment.score(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn render_label(strings: &dyn StringTable, label: Label) -> String {
    strings
        .resolve(label)
        .map(str::to_owned)
        .unwrap_or_else(|| format!("#{}", label))
}
