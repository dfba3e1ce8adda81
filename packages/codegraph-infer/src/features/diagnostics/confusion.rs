//! Confusion statistics of a labeled assignment

use crate::features::query::Assignment;
use crate::shared::ports::FeatureWeights;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// How many inferred nodes have competing labels.
///
/// A node is confusable when some other candidate scores at least as well
/// as its current label; every such candidate counts as one expected
/// confusion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionStats {
    pub non_confusable_nodes: usize,
    pub confusable_nodes: usize,
    pub expected_confusions: usize,
}

impl AddAssign for ConfusionStats {
    fn add_assign(&mut self, other: Self) {
        self.non_confusable_nodes += other.non_confusable_nodes;
        self.confusable_nodes += other.confusable_nodes;
        self.expected_confusions += other.expected_confusions;
    }
}

pub fn confusion_statistics<W: FeatureWeights + ?Sized>(
    assignment: &Assignment<'_>,
    weights: &W,
) -> ConfusionStats {
    let query = assignment.query();
    let mut stats = ConfusionStats::default();

    for node in assignment.inferred_nodes() {
        let current = assignment.label(node);
        let candidates = query.candidates(node);
        if candidates.is_empty() {
            continue;
        }
        let rivals = candidates
            .iter()
            .filter(|&&label| label != current)
            .filter(|&&label| assignment.label_delta(node, label, weights) >= 0.0)
            .count();

        if rivals == 0 {
            stats.non_confusable_nodes += 1;
        } else {
            stats.confusable_nodes += 1;
            stats.expected_confusions += rivals;
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::query::QueryBuilder;
    use crate::features::weights::WeightStore;
    use crate::shared::models::PairwiseFeature;

    #[test]
    fn test_counts_rivals() {
        let store = WeightStore::new();
        store.set(&PairwiseFeature::new(1, 1, 0).into(), 5.0);
        store.set(&PairwiseFeature::new(1, 3, 0).into(), 5.0);

        let mut builder = QueryBuilder::new(0);
        let x = builder.add_node(0, [1, 2]);
        let y = builder.add_node(0, [1, 2, 3]);
        builder.add_node(0, Vec::<u32>::new());
        builder.add_arc(x, y, 0).unwrap();
        let query = builder.build();

        let mut a = Assignment::new(&query, &store);
        a.apply_moves(&[(x, 1), (y, 1)], &store);

        // x: 2 loses 5. y: 3 ties with 1, 2 loses.
        let stats = confusion_statistics(&a, &store);
        assert_eq!(
            stats,
            ConfusionStats {
                non_confusable_nodes: 1,
                confusable_nodes: 1,
                expected_confusions: 1,
            }
        );
    }
}
