//! WeightStore: pairwise and factor weight tables behind one key space

use super::table::WeightTable;
use crate::shared::models::{FactorFeature, FeatureKey, PairwiseFeature};
use crate::shared::ports::FeatureWeights;

/// All learned feature weights.
///
/// Shared by reference between concurrent SSVM workers; only
/// [`WeightStore::add_delta`] is meant for concurrent writers.
#[derive(Debug, Default)]
pub struct WeightStore {
    pairwise: WeightTable<PairwiseFeature>,
    factors: WeightTable<FactorFeature>,
}

impl WeightStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Weight for any key (zero if absent)
    pub fn get(&self, key: &FeatureKey) -> f64 {
        match key {
            FeatureKey::Pairwise(f) => self.pairwise.get(f),
            FeatureKey::Factor(f) => self.factors.get(f),
        }
    }

    /// Hogwild-safe additive update
    pub fn add_delta(&self, key: &FeatureKey, delta: f64) {
        match key {
            FeatureKey::Pairwise(f) => self.pairwise.add_delta(f, delta),
            FeatureKey::Factor(f) => self.factors.add_delta(f, delta),
        }
    }

    /// Overwrite a weight
    pub fn set(&self, key: &FeatureKey, value: f64) {
        match key {
            FeatureKey::Pairwise(f) => self.pairwise.set(f, value),
            FeatureKey::Factor(f) => self.factors.set(f, value),
        }
    }

    /// Create a zero-weight entry if missing
    pub fn ensure(&self, key: &FeatureKey) {
        match key {
            FeatureKey::Pairwise(f) => self.pairwise.ensure(f),
            FeatureKey::Factor(f) => self.factors.ensure(f),
        }
    }

    /// Single-writer additive update
    pub fn update_exclusive(&mut self, key: &FeatureKey, delta: f64) {
        match key {
            FeatureKey::Pairwise(f) => self.pairwise.update_exclusive(f, delta),
            FeatureKey::Factor(f) => self.factors.update_exclusive(f, delta),
        }
    }

    /// Set every known key to `value`
    pub fn fill(&mut self, value: f64) {
        self.pairwise.fill(value);
        self.factors.fill(value);
    }

    pub fn clear(&mut self) {
        self.pairwise.clear();
        self.factors.clear();
    }

    pub fn pairwise(&self) -> &WeightTable<PairwiseFeature> {
        &self.pairwise
    }

    pub fn factors(&self) -> &WeightTable<FactorFeature> {
        &self.factors
    }

    /// Total number of keys
    pub fn len(&self) -> usize {
        self.pairwise.len() + self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairwise.is_empty() && self.factors.is_empty()
    }

    /// All entries, sorted by key
    pub fn entries(&self) -> Vec<(FeatureKey, f64)> {
        let mut out: Vec<(FeatureKey, f64)> = self
            .pairwise
            .entries()
            .into_iter()
            .map(|(k, w)| (FeatureKey::Pairwise(k), w))
            .chain(
                self.factors
                    .entries()
                    .into_iter()
                    .map(|(k, w)| (FeatureKey::Factor(k), w)),
            )
            .collect();
        out.sort_by(|x, y| x.0.cmp(&y.0));
        out
    }

    /// Whether every stored weight is finite
    pub fn all_finite(&self) -> bool {
        let mut finite = true;
        self.pairwise.for_each(|_, w| finite &= w.is_finite());
        self.factors.for_each(|_, w| finite &= w.is_finite());
        finite
    }
}

impl FeatureWeights for WeightStore {
    fn pairwise_weight(&self, feature: &PairwiseFeature) -> f64 {
        self.pairwise.get(feature)
    }

    fn factor_weight(&self, feature: &FactorFeature) -> f64 {
        self.factors.get(feature)
    }
}
