//! Shared models and ports
//!
//! Types used by every feature slice: labels, feature keys, factor node sets,
//! and the traits through which the engine talks to its collaborators.

pub mod models;
pub mod ports;
