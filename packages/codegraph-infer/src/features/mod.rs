//! Feature modules
//!
//! Dependency order (leaves first):
//! weights → feature_index → query → map_solver / loopy_bp → learning
//! persistence and diagnostics read from all of the above.

pub mod diagnostics;
pub mod feature_index;
pub mod learning;
pub mod loopy_bp;
pub mod map_solver;
pub mod persistence;
pub mod query;
pub mod weights;
