//! FeatureIndex - ranked best-feature lookups
//!
//! Built by one pass over the [`WeightStore`]:
//!
//! ```text
//! pairwise:  kind            → top-K features of that relation type
//!            (kind, a-label) → top-K features whose a endpoint has that label
//!            (kind, b-label) → top-K features whose b endpoint has that label
//! factors:   size                    → top-K factor features of that arity
//!            (size, label)           → ... containing label         (depth one)
//!            (size, label, label)    → ... containing both labels   (depth two)
//! ```
//!
//! Every lookup has the same shape: "top-K features consistent with a partial
//! labeling". The index is a pure function of the weights at rebuild time and
//! goes stale as soon as training writes again; callers rebuild explicitly
//! and must not rebuild concurrently with training.

use super::ranked::{Ranked, RankedTable};
use crate::config::IndexConfig;
use crate::features::weights::WeightStore;
use crate::shared::models::{FactorFeature, FeatureType, Label, PairwiseFeature};
use tracing::{debug, info};

/// Ranked caches of the highest-weight features per partial labeling
#[derive(Debug, Clone)]
pub struct FeatureIndex {
    by_kind: RankedTable<FeatureType, PairwiseFeature>,
    by_a: RankedTable<(FeatureType, Label), PairwiseFeature>,
    by_b: RankedTable<(FeatureType, Label), PairwiseFeature>,
    factors_by_size: RankedTable<usize, FactorFeature>,
    factors_depth_one: RankedTable<(usize, Label), FactorFeature>,
    factors_depth_two: RankedTable<(usize, Label, Label), FactorFeature>,
    config: IndexConfig,
    indexed_features: usize,
}

impl FeatureIndex {
    /// Empty index (every lookup yields nothing until rebuilt)
    pub fn new(config: IndexConfig) -> Self {
        Self {
            by_kind: RankedTable::new(),
            by_a: RankedTable::new(),
            by_b: RankedTable::new(),
            factors_by_size: RankedTable::new(),
            factors_depth_one: RankedTable::new(),
            factors_depth_two: RankedTable::new(),
            config,
            indexed_features: 0,
        }
    }

    /// Build a fresh index from `weights`
    pub fn build(weights: &WeightStore, config: IndexConfig) -> Self {
        let mut index = Self::new(config);
        index.rebuild(weights);
        index
    }

    /// Discard all lists and re-rank from `weights`
    pub fn rebuild(&mut self, weights: &WeightStore) {
        self.clear();

        weights.pairwise().for_each(|feature, weight| {
            self.by_kind.push(feature.kind, weight, *feature);
            self.by_a.push((feature.kind, feature.a), weight, *feature);
            self.by_b.push((feature.kind, feature.b), weight, *feature);
        });

        let mut pairs: Vec<(Label, Label)> = Vec::new();
        weights.factors().for_each(|feature, weight| {
            let size = feature.len();
            let labels = feature.labels();
            self.factors_by_size.push(size, weight, feature.clone());

            let mut previous = None;
            for &label in labels {
                if previous != Some(label) {
                    self.factors_depth_one
                        .push((size, label), weight, feature.clone());
                }
                previous = Some(label);
            }

            pairs.clear();
            for i in 0..labels.len() {
                for j in (i + 1)..labels.len() {
                    pairs.push((labels[i], labels[j]));
                }
            }
            pairs.sort_unstable();
            pairs.dedup();
            for &(x, y) in &pairs {
                self.factors_depth_two
                    .push((size, x, y), weight, feature.clone());
            }
        });

        let pairwise_k = self.config.pairwise_top_k;
        let factor_k = self.config.factor_top_k;
        self.by_kind.finalize(pairwise_k);
        self.by_a.finalize(pairwise_k);
        self.by_b.finalize(pairwise_k);
        self.factors_by_size.finalize(factor_k);
        self.factors_depth_one.finalize(factor_k);
        self.factors_depth_two.finalize(factor_k);

        self.indexed_features = weights.len();
        debug!(
            "Pairwise lists: {} by kind, {} by a, {} by b",
            self.by_kind.len(),
            self.by_a.len(),
            self.by_b.len()
        );
        info!(
            "Rebuilt feature index over {} features ({} factor shapes)",
            self.indexed_features,
            self.factors_by_size.len()
        );
    }

    /// Drop every list
    pub fn clear(&mut self) {
        self.by_kind.clear();
        self.by_a.clear();
        self.by_b.clear();
        self.factors_by_size.clear();
        self.factors_depth_one.clear();
        self.factors_depth_two.clear();
        self.indexed_features = 0;
    }

    /// Top pairwise features of relation `kind` consistent with the given
    /// endpoint labels (either, both, or neither may be fixed).
    ///
    /// With both endpoints fixed the answer is the `(kind, a)` list filtered
    /// on `b`: a feature outside that list's top-K is not returned even if
    /// its key exists. Read exact keys from the [`WeightStore`].
    pub fn top_pairwise(
        &self,
        kind: FeatureType,
        a: Option<Label>,
        b: Option<Label>,
    ) -> impl Iterator<Item = &Ranked<PairwiseFeature>> + '_ {
        let list = match (a, b) {
            (Some(a), _) => self.by_a.get(&(kind, a)),
            (None, Some(b)) => self.by_b.get(&(kind, b)),
            (None, None) => self.by_kind.get(&kind),
        };
        list.iter()
            .filter(move |entry| b.map_or(true, |b| entry.feature.b == b))
    }

    /// Top factor features of arity `size` containing every label of
    /// `fixed` (as a multiset). Up to two fixed labels hit a dedicated table;
    /// more are answered from the depth-two table and filtered.
    pub fn top_factors(
        &self,
        size: usize,
        fixed: &[Label],
    ) -> impl Iterator<Item = &Ranked<FactorFeature>> + '_ {
        let mut fixed = fixed.to_vec();
        fixed.sort_unstable();
        let list = match fixed.len() {
            0 => self.factors_by_size.get(&size),
            1 => self.factors_depth_one.get(&(size, fixed[0])),
            _ => self.factors_depth_two.get(&(size, fixed[0], fixed[1])),
        };
        list.iter()
            .filter(move |entry| fixed.len() <= 2 || entry.feature.contains_all(&fixed))
    }

    /// Number of weight-store keys seen by the last rebuild
    pub fn indexed_features(&self) -> usize {
        self.indexed_features
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }
}
