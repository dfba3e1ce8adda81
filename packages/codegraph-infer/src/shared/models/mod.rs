//! Domain models shared across feature slices

pub mod factor;
pub mod feature;
pub mod label;

pub use factor::Factor;
pub use feature::{FactorFeature, FeatureKey, PairwiseFeature};
pub use label::{FeatureType, Label, LabelFrequencies, NodeId, NodeKind};
