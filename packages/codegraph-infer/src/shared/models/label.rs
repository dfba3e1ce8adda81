//! Label identifiers and the corpus-wide label frequency table

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Interned label id (string table id of a predicted value)
pub type Label = u32;

/// Dense node id inside one query
pub type NodeId = usize;

/// Relation type of a pairwise feature
pub type FeatureType = u32;

/// Node type, passed to the label checker
pub type NodeKind = u32;

/// Corpus-wide label counts, used as backoff when no relational evidence
/// reaches a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFrequencies {
    counts: FxHashMap<Label, u64>,
}

impl LabelFrequencies {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one occurrence of `label`
    pub fn record(&mut self, label: Label) {
        *self.counts.entry(label).or_insert(0) += 1;
    }

    /// Overwrite the count for `label`
    pub fn set(&mut self, label: Label, count: u64) {
        self.counts.insert(label, count);
    }

    /// Count for `label` (zero when never seen)
    pub fn count(&self, label: Label) -> u64 {
        self.counts.get(&label).copied().unwrap_or(0)
    }

    /// Number of distinct labels seen
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn clear(&mut self) {
        self.counts.clear();
    }

    /// All (label, count) pairs sorted by label
    pub fn entries(&self) -> Vec<(Label, u64)> {
        let mut entries: Vec<_> = self.counts.iter().map(|(&l, &c)| (l, c)).collect();
        entries.sort_unstable();
        entries
    }

    /// Up to `limit` labels of `candidates`, most frequent first.
    ///
    /// Ties are broken by lowest label id so the result is deterministic.
    pub fn most_frequent_among(&self, candidates: &[Label], limit: usize) -> Vec<Label> {
        let mut ranked: Vec<Label> = candidates.to_vec();
        ranked.sort_unstable_by(|&x, &y| self.count(y).cmp(&self.count(x)).then(x.cmp(&y)));
        ranked.dedup();
        ranked.truncate(limit);
        ranked
    }
}

impl FromIterator<(Label, u64)> for LabelFrequencies {
    fn from_iter<I: IntoIterator<Item = (Label, u64)>>(iter: I) -> Self {
        Self {
            counts: iter.into_iter().collect(),
        }
    }
}
