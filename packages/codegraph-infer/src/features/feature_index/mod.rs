//! Feature Index
//!
//! Turns "what is the best move that sets node X to label L" into a bounded
//! lookup instead of a scan over every feature.

mod index;
mod ranked;

pub use index::FeatureIndex;
pub use ranked::Ranked;
