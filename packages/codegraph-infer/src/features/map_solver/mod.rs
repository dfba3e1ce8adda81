//! MAP inference by local search
//!
//! ```text
//! Assignment ──► greedy init ──► per-node pass ──► per-arc pass ──┐
//!                                     ▲                           │
//!                                     └──── moves > 0 ◄───────────┘
//! ```
//!
//! Candidates for each move come from [`FeatureIndex`](crate::FeatureIndex)
//! lookups; the label frequency table backs off when a node has no labeled
//! neighbours.

mod candidates;
mod local_search;

pub use candidates::CandidateGenerator;
pub use local_search::{LocalSearchSolver, PassRecord, SearchStats};
