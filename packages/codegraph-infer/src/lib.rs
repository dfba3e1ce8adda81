/*
 * Codegraph Infer - Structured Prediction over Code Graphs
 *
 * Feature-First Hexagonal Architecture:
 * - shared/      : Common models (labels, feature keys, factors) and ports
 * - features/    : Vertical slices (weights → index → query → solvers → learning)
 * - pipeline/    : GraphInference orchestration
 * - config/      : Validated configuration (presets + YAML)
 *
 * Concurrency:
 * - Lock-free weight cells for Hogwild SSVM training
 * - Rayon work-stealing for batch training
 */

#![allow(clippy::type_complexity)] // Index tables are keyed by composite tuples
#![allow(clippy::new_without_default)] // Default impl not always needed
#![allow(clippy::needless_range_loop)] // Range loop for indexing parallel arrays

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and collaborator ports
pub mod shared;

/// Feature modules (weights, index, query, solvers, learners)
pub mod features;

/// GraphInference orchestration
pub mod pipeline;

/// Configuration system
pub mod config;

/// Error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports for Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{InferenceConfig, Preset, SolverKind};
pub use errors::{InferenceError, Result};
pub use features::feature_index::FeatureIndex;
pub use features::query::{Assignment, Query, QueryBuilder};
pub use features::weights::WeightStore;
pub use pipeline::GraphInference;
pub use shared::models::{
    Factor, FactorFeature, FeatureKey, FeatureType, Label, LabelFrequencies, NodeId, NodeKind,
    PairwiseFeature,
};
pub use shared::ports::{FeatureWeights, LabelChecker, NodeContext, StringTable};
