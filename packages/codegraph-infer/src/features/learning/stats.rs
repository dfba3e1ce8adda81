//! Training precision counters
//!
//! Shared by reference between Hogwild workers, so every counter is atomic.

use crate::shared::models::Label;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-node prediction outcomes accumulated over training
#[derive(Debug, Default)]
pub struct PrecisionStats {
    correct: AtomicU64,
    incorrect: AtomicU64,
    unknown: AtomicU64,
}

/// Point-in-time copy of [`PrecisionStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrecisionSnapshot {
    pub correct: u64,
    pub incorrect: u64,
    pub unknown: u64,
}

impl PrecisionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction against its gold label
    pub fn record(&self, gold: Label, predicted: Label, unknown_label: Label) {
        let counter = if predicted == unknown_label {
            &self.unknown
        } else if predicted == gold {
            &self.correct
        } else {
            &self.incorrect
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PrecisionSnapshot {
        PrecisionSnapshot {
            correct: self.correct.load(Ordering::Relaxed),
            incorrect: self.incorrect.load(Ordering::Relaxed),
            unknown: self.unknown.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.correct.store(0, Ordering::Relaxed);
        self.incorrect.store(0, Ordering::Relaxed);
        self.unknown.store(0, Ordering::Relaxed);
    }
}

impl PrecisionSnapshot {
    pub fn total(&self) -> u64 {
        self.correct + self.incorrect + self.unknown
    }

    /// Correct over all non-unknown predictions (0 when there are none)
    pub fn precision(&self) -> f64 {
        let predicted = self.correct + self.incorrect;
        if predicted == 0 {
            0.0
        } else {
            self.correct as f64 / predicted as f64
        }
    }

    /// Share of predictions that were not `unknown`
    pub fn recall(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            (self.correct + self.incorrect) as f64 / total as f64
        }
    }
}
