//! Diagnostics: confusion statistics, graph views, weight dumps
//!
//! Reporting only; nothing here changes model state.

mod confusion;
mod graph_view;
mod weight_dump;

pub use confusion::{confusion_statistics, ConfusionStats};
pub use graph_view::{ArcView, FactorView, GraphView, NodeView};
pub use weight_dump::{log_weights, top_weights};
