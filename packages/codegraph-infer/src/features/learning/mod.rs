//! Weight learning
//!
//! | Learner | Writes through | Concurrency |
//! |---------|----------------|-------------|
//! | [`SsvmLearner`] | `WeightStore::add_delta` (`&self`) | many workers, Hogwild |
//! | [`PseudoLikelihoodLearner`] | `WeightStore::update_exclusive` (`&mut self`) | single caller |

mod gradient;
mod pseudo_likelihood;
mod ssvm;
mod stats;

pub use gradient::FeatureDelta;
pub use pseudo_likelihood::{PlOutcome, PseudoLikelihoodLearner};
pub use ssvm::{SsvmLearner, SsvmOutcome};
pub use stats::{PrecisionSnapshot, PrecisionStats};
