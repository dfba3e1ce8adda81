//! Model snapshot (msgpack)
//!
//! # Format
//!
//! ```text
//! ModelSnapshot (rmp-serde, named fields)
//! ├── version          u32, must equal SNAPSHOT_VERSION
//! ├── unknown_label    Label
//! ├── label_frequency  [(Label, count)]       sorted by label
//! ├── pairwise         [(PairwiseFeature, w)] sorted by key
//! └── factors          [(FactorFeature, w)]   sorted by key
//! ```
//!
//! Entries are sorted so equal models encode to equal bytes.

use crate::errors::{InferenceError, Result};
use crate::features::weights::WeightStore;
use crate::shared::models::{FactorFeature, Label, LabelFrequencies, PairwiseFeature};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to resume inference or training
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    pub version: u32,
    pub unknown_label: Label,
    pub label_frequency: Vec<(Label, u64)>,
    pub pairwise: Vec<(PairwiseFeature, f64)>,
    pub factors: Vec<(FactorFeature, f64)>,
}

impl ModelSnapshot {
    /// Copy the current model state
    pub fn capture(weights: &WeightStore, frequencies: &LabelFrequencies, unknown_label: Label) -> Self {
        let mut pairwise = weights.pairwise().entries();
        pairwise.sort_by(|x, y| x.0.cmp(&y.0));
        let mut factors = weights.factors().entries();
        factors.sort_by(|x, y| x.0.cmp(&y.0));

        Self {
            version: SNAPSHOT_VERSION,
            unknown_label,
            label_frequency: frequencies.entries(),
            pairwise,
            factors,
        }
    }

    /// Fresh weight store holding the snapshot's weights
    pub fn weights(&self) -> WeightStore {
        let store = WeightStore::new();
        for (feature, weight) in &self.pairwise {
            store.pairwise().set(feature, *weight);
        }
        for (feature, weight) in &self.factors {
            store.factors().set(feature, *weight);
        }
        store
    }

    pub fn frequencies(&self) -> LabelFrequencies {
        self.label_frequency.iter().copied().collect()
    }

    pub fn num_features(&self) -> usize {
        self.pairwise.len() + self.factors.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    /// Decode and check the format version
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let snapshot: Self = rmp_serde::from_slice(bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(InferenceError::UnsupportedSnapshot {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        Ok(snapshot)
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        info!(
            "Saved model to {} ({} features, {} bytes)",
            path.as_ref().display(),
            self.num_features(),
            bytes.len()
        );
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let snapshot = Self::from_bytes(&bytes)?;
        info!(
            "Loaded model from {} ({} features, {} labels)",
            path.as_ref().display(),
            snapshot.num_features(),
            snapshot.label_frequency.len()
        );
        Ok(snapshot)
    }
}
