//! Ports (Interfaces) to the engine's collaborators
//!
//! - [`FeatureWeights`]: read-only weight lookup consumed by solvers
//! - [`LabelChecker`]: which labels are legal for a node
//! - [`StringTable`]: label id ↔ string, for human-readable views only

use crate::shared::models::{FactorFeature, Label, NodeId, NodeKind, PairwiseFeature};

// ============================================================================
// Weight lookup
// ============================================================================

/// Read-only view of feature weights.
///
/// This is the only surface the solvers see of the model: the weight store
/// implements it, and tests may supply fixed tables.
pub trait FeatureWeights: Send + Sync {
    /// Weight of a pairwise feature (zero when unknown)
    fn pairwise_weight(&self, feature: &PairwiseFeature) -> f64;

    /// Weight of a factor feature (zero when unknown)
    fn factor_weight(&self, feature: &FactorFeature) -> f64;
}

// ============================================================================
// Label checker
// ============================================================================

/// What the label checker knows about a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeContext {
    pub node: NodeId,
    pub kind: NodeKind,
}

/// Decides which labels may be assigned to a node
pub trait LabelChecker: Send + Sync {
    /// All legal candidate labels for the node; empty means the node is
    /// pinned to `unknown`.
    ///
    /// Consulted once per node when the query is built; solver moves are
    /// checked against the stored candidate set.
    fn permissible_labels(&self, context: &NodeContext) -> Vec<Label>;
}

// ============================================================================
// String table
// ============================================================================

/// String interning table shared with the graph builder
pub trait StringTable {
    /// Id for `value`, allocating one if needed
    fn intern(&mut self, value: &str) -> Label;

    /// String for `id`, if it was interned
    fn resolve(&self, id: Label) -> Option<&str>;
}
