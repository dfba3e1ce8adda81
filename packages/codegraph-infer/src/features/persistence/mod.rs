//! Model persistence

mod snapshot;

pub use snapshot::{ModelSnapshot, SNAPSHOT_VERSION};
