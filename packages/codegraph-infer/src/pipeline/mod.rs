//! Pipeline orchestration

mod graph_inference;

pub use graph_inference::{BatchOutcome, GraphInference, SolverStats};
