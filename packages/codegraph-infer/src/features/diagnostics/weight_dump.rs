//! Learned-weight dump for debugging

use crate::features::weights::WeightStore;
use crate::shared::models::FeatureKey;
use tracing::{debug, info};

/// Up to `limit` entries, highest weight first (ties by key)
pub fn top_weights(weights: &WeightStore, limit: usize) -> Vec<(FeatureKey, f64)> {
    let mut entries = weights.entries();
    entries.sort_by(|x, y| y.1.total_cmp(&x.1).then_with(|| x.0.cmp(&y.0)));
    entries.truncate(limit);
    entries
}

/// Log every weight (sorted) at debug level and a summary at info level
pub fn log_weights(weights: &WeightStore) {
    let entries = top_weights(weights, usize::MAX);
    for (key, weight) in &entries {
        debug!("{:>12.6}  {}", weight, key);
    }
    let positive = entries.iter().filter(|(_, w)| *w > 0.0).count();
    info!(
        "Model has {} features ({} pairwise, {} factor, {} positive)",
        entries.len(),
        weights.pairwise().len(),
        weights.factors().len(),
        positive
    );
}
