//! Loopy belief propagation
//!
//! Alternative MAP path over the same [`Query`](crate::Query) /
//! [`Assignment`](crate::Assignment) types. It reads weights through the
//! [`FeatureWeights`](crate::FeatureWeights) port only and never touches the
//! feature index.

mod message_graph;
mod solver;

pub use solver::{BpStats, LoopyBpSolver};
