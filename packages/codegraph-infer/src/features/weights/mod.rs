//! Weight Store
//!
//! Hash-keyed feature weights with Hogwild-safe additive updates.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ WeightStore                                  │
//! │   pairwise: WeightTable<PairwiseFeature>     │
//! │   factors:  WeightTable<FactorFeature>       │
//! │              └─ DashMap<K, AtomicWeight>     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! - `add_delta` may be called from many training threads on the same key;
//!   each cell is updated with a compare-and-swap loop, so no delta is lost.
//! - `update_exclusive` / `set` are for single-threaded callers
//!   (pseudo-likelihood, model load).
//! - Missing keys read as zero and are created on first write.

mod atomic_weight;
mod store;
mod table;

pub use atomic_weight::AtomicWeight;
pub use store::WeightStore;
pub use table::WeightTable;
