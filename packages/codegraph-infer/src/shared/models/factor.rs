//! Factor: a set of query nodes sharing a higher-order relation

use super::label::NodeId;
use crate::errors::{InferenceError, Result};
use serde::{Deserialize, Serialize};

/// Deduplicated, non-empty, sorted set of node ids.
///
/// Two factors are equal when their node sets are equal; labels play no part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Factor {
    nodes: Vec<NodeId>,
}

impl Factor {
    /// Build a factor from node ids in any order (duplicates are dropped)
    pub fn new(nodes: impl IntoIterator<Item = NodeId>) -> Result<Self> {
        let mut nodes: Vec<NodeId> = nodes.into_iter().collect();
        nodes.sort_unstable();
        nodes.dedup();
        if nodes.is_empty() {
            return Err(InferenceError::invalid_factor("factor must contain at least one node"));
        }
        Ok(Self { nodes })
    }

    /// Member node ids (sorted)
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: factors are never empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.binary_search(&node).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factor_dedups_and_sorts() {
        let factor = Factor::new([4, 1, 4, 2]).unwrap();
        assert_eq!(factor.nodes(), &[1, 2, 4]);
        assert_eq!(factor.len(), 3);
        assert!(factor.contains(2));
        assert!(!factor.contains(3));
    }

    #[test]
    fn test_factor_equality_is_structural() {
        assert_eq!(Factor::new([3, 1]).unwrap(), Factor::new([1, 3, 3]).unwrap());
    }

    #[test]
    fn test_empty_factor_rejected() {
        let result = Factor::new(Vec::<NodeId>::new());
        assert!(matches!(result, Err(InferenceError::InvalidFactor(_))));
    }
}
