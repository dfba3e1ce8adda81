//! Ranked lists keyed by a partial labeling

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// One index entry: a feature and its weight at rebuild time
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked<T> {
    pub weight: f64,
    pub feature: T,
}

/// Map from key to a list sorted by descending weight, truncated to top-K.
#[derive(Debug, Clone)]
pub(crate) struct RankedTable<K, T> {
    lists: FxHashMap<K, Vec<Ranked<T>>>,
}

impl<K: Eq + Hash, T: Ord> RankedTable<K, T> {
    pub(crate) fn new() -> Self {
        Self {
            lists: FxHashMap::default(),
        }
    }

    pub(crate) fn push(&mut self, key: K, weight: f64, feature: T) {
        self.lists
            .entry(key)
            .or_default()
            .push(Ranked { weight, feature });
    }

    /// Sort every list (weight descending, then feature ascending) and keep
    /// the first `top_k` entries.
    pub(crate) fn finalize(&mut self, top_k: usize) {
        for list in self.lists.values_mut() {
            list.sort_by(|x, y| {
                y.weight
                    .total_cmp(&x.weight)
                    .then_with(|| x.feature.cmp(&y.feature))
            });
            list.truncate(top_k);
            list.shrink_to_fit();
        }
    }

    pub(crate) fn get(&self, key: &K) -> &[Ranked<T>] {
        self.lists.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of keys
    pub(crate) fn len(&self) -> usize {
        self.lists.len()
    }

    pub(crate) fn clear(&mut self) {
        self.lists.clear();
    }
}
