//! Common test utilities for codegraph-infer
//!
//! Fixtures for the engine's collaborators (label checker, string table)
//! and builders for small weighted query graphs.

#![allow(dead_code)]

use codegraph_infer::config::InferenceConfig;
use codegraph_infer::{
    FeatureKey, GraphInference, Label, LabelChecker, NodeContext, PairwiseFeature, Query,
    StringTable,
};
use std::collections::HashMap;

pub const UNKNOWN: Label = 0;

// ============================================================================
// Collaborator fixtures
// ============================================================================

/// Label checker that allows a fixed label set per node kind
#[derive(Debug, Default)]
pub struct KindLabels {
    by_kind: HashMap<u32, Vec<Label>>,
}

impl KindLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow(mut self, kind: u32, labels: impl IntoIterator<Item = Label>) -> Self {
        self.by_kind.entry(kind).or_default().extend(labels);
        self
    }
}

impl LabelChecker for KindLabels {
    fn permissible_labels(&self, context: &NodeContext) -> Vec<Label> {
        self.by_kind.get(&context.kind).cloned().unwrap_or_default()
    }
}

/// In-memory string table; id 0 is reserved for the unknown label
#[derive(Debug)]
pub struct VecStrings {
    values: Vec<String>,
}

impl VecStrings {
    pub fn new() -> Self {
        Self {
            values: vec!["?".to_owned()],
        }
    }
}

impl StringTable for VecStrings {
    fn intern(&mut self, value: &str) -> Label {
        if let Some(i) = self.values.iter().position(|s| s == value) {
            return i as Label;
        }
        self.values.push(value.to_owned());
        (self.values.len() - 1) as Label
    }

    fn resolve(&self, id: Label) -> Option<&str> {
        self.values.get(id as usize).map(String::as_str)
    }
}

// ============================================================================
// Builders
// ============================================================================

pub fn pair(a: Label, b: Label, kind: u32) -> FeatureKey {
    FeatureKey::Pairwise(PairwiseFeature::new(a, b, kind))
}

/// Engine with the given pairwise weights and a fresh index
pub fn engine_with(config: InferenceConfig, weights: &[((Label, Label, u32), f64)]) -> GraphInference {
    let mut engine = GraphInference::new(config).expect("valid config");
    engine.set_unknown_label(UNKNOWN);
    for &((a, b, kind), w) in weights {
        engine.weights().set(&pair(a, b, kind), w);
    }
    engine.prepare_for_inference();
    engine
}

/// `n` nodes in a path `0 - 1 - ... - n-1`, every arc of type `kind`
pub fn chain_query(n: usize, candidates: &[Label], kind: u32) -> Query {
    let mut builder = codegraph_infer::QueryBuilder::new(UNKNOWN);
    for _ in 0..n {
        builder.add_node(0, candidates.iter().copied());
    }
    for i in 1..n {
        builder.add_arc(i - 1, i, kind).expect("nodes exist");
    }
    builder.build()
}

/// `n` nodes in a cycle (loopy)
pub fn ring_query(n: usize, candidates: &[Label], kind: u32) -> Query {
    let mut builder = codegraph_infer::QueryBuilder::new(UNKNOWN);
    for _ in 0..n {
        builder.add_node(0, candidates.iter().copied());
    }
    for i in 0..n {
        builder.add_arc(i, (i + 1) % n, kind).expect("nodes exist");
    }
    builder.build()
}
