//! Query / Assignment model
//!
//! A [`Query`] is built once (externally) and never changes; an
//! [`Assignment`] borrows it and carries the mutable labeling plus its
//! running score. Assignments never outlive or move between queries.

mod assignment;
mod graph_query;

pub use assignment::Assignment;
pub use graph_query::{NodeSpec, PairwiseArc, Query, QueryBuilder};
