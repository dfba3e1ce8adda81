//! Weighted feature keys
//!
//! Two kinds of keys index the weight store:
//! - [`PairwiseFeature`]: (label of endpoint a, label of endpoint b, relation type)
//! - [`FactorFeature`]: the sorted multiset of labels assigned to a factor's members
//!
//! Both are immutable value types with structural equality and a derived hash.

use super::label::{FeatureType, Label};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary relation instance between two labeled nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairwiseFeature {
    /// Label of the first endpoint
    pub a: Label,
    /// Label of the second endpoint
    pub b: Label,
    /// Relation type
    pub kind: FeatureType,
}

impl PairwiseFeature {
    pub fn new(a: Label, b: Label, kind: FeatureType) -> Self {
        Self { a, b, kind }
    }
}

impl fmt::Display for PairwiseFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} -[{}]- {})", self.a, self.kind, self.b)
    }
}

/// Higher-order feature: labels of all members of a factor, order-free.
///
/// Stored as a sorted multiset so two factors whose members carry the same
/// labels (in any order) share one weight.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactorFeature {
    labels: Vec<Label>,
}

impl FactorFeature {
    /// Build from member labels in any order
    pub fn from_labels(labels: impl IntoIterator<Item = Label>) -> Self {
        let mut labels: Vec<Label> = labels.into_iter().collect();
        labels.sort_unstable();
        Self { labels }
    }

    /// Sorted member labels
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Factor arity
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Whether `fixed` (sorted) is a sub-multiset of this feature's labels
    pub fn contains_all(&self, fixed: &[Label]) -> bool {
        self.remaining_after(fixed).is_some()
    }

    /// Labels left once `fixed` (sorted) is removed, or `None` if `fixed`
    /// is not a sub-multiset.
    pub fn remaining_after(&self, fixed: &[Label]) -> Option<Vec<Label>> {
        let mut remaining = Vec::with_capacity(self.labels.len());
        let mut i = 0;
        for &label in &self.labels {
            if i < fixed.len() && fixed[i] == label {
                i += 1;
            } else if i < fixed.len() && fixed[i] < label {
                return None;
            } else {
                remaining.push(label);
            }
        }
        if i == fixed.len() {
            Some(remaining)
        } else {
            None
        }
    }
}

impl fmt::Display for FactorFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, label) in self.labels.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", label)?;
        }
        write!(f, "}}")
    }
}

/// Any weight-store key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKey {
    Pairwise(PairwiseFeature),
    Factor(FactorFeature),
}

impl From<PairwiseFeature> for FeatureKey {
    fn from(f: PairwiseFeature) -> Self {
        FeatureKey::Pairwise(f)
    }
}

impl From<FactorFeature> for FeatureKey {
    fn from(f: FactorFeature) -> Self {
        FeatureKey::Factor(f)
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKey::Pairwise(p) => p.fmt(f),
            FeatureKey::Factor(x) => x.fmt(f),
        }
    }
}
