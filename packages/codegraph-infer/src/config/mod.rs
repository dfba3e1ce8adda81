//! Configuration System
//!
//! Two levels of control:
//! - Level 1: Preset - one-liner defaults for a workload
//! - Level 2: Section override - closures or a YAML v1 document
//!
//! # Examples
//!
//! ```rust,ignore
//! use codegraph_infer::config::{InferenceConfig, Preset, SolverKind};
//!
//! let config = InferenceConfig::preset(Preset::Balanced)
//!     .learning(|c| c.svm_margin(0.5).beam_size(4))
//!     .solver(SolverKind::LoopyBp);
//! config.validate()?;
//!
//! let config = InferenceConfig::from_yaml("training.yaml")?;
//! ```

pub mod error;
pub mod inference_config;
pub mod preset;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use inference_config::{
    BeliefPropagationConfig, IndexConfig, InferenceConfig, LearningConfig, LocalSearchConfig,
    SolverKind,
};
pub use preset::Preset;
