//! Feature-count difference between two labelings

use crate::features::query::Assignment;
use crate::features::weights::WeightStore;
use crate::shared::models::FeatureKey;
use rustc_hash::FxHashMap;

/// Signed multiset difference of active features (`target - other`).
///
/// Zero entries are dropped, so an empty delta means both labelings activate
/// exactly the same features.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureDelta {
    counts: FxHashMap<FeatureKey, i64>,
}

impl FeatureDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Active features of `target` counted +1, those of `other` counted -1
    pub fn between(target: &Assignment<'_>, other: &Assignment<'_>) -> Self {
        let mut delta = Self::new();
        for key in target.active_features() {
            delta.add(key, 1);
        }
        for key in other.active_features() {
            delta.add(key, -1);
        }
        delta
    }

    pub fn add(&mut self, key: FeatureKey, count: i64) {
        let entry = self.counts.entry(key.clone()).or_insert(0);
        *entry += count;
        if *entry == 0 {
            self.counts.remove(&key);
        }
    }

    pub fn count(&self, key: &FeatureKey) -> i64 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Non-zero entries sorted by key
    pub fn entries(&self) -> Vec<(FeatureKey, i64)> {
        let mut out: Vec<_> = self.counts.iter().map(|(k, &c)| (k.clone(), c)).collect();
        out.sort_by(|x, y| x.0.cmp(&y.0));
        out
    }

    /// Add `learning_rate * count` to every key through the lock-free path
    pub fn apply_concurrent(&self, weights: &WeightStore, learning_rate: f64) {
        for (key, &count) in &self.counts {
            weights.add_delta(key, learning_rate * count as f64);
        }
    }
}
