//!
//! globally-available parts
//!
pub use crate::common::{Emission, State, Token, Transition};
pub use crate::error::{HmmError, Result};
pub use crate::hmm::Hmm;
pub use crate::model::ModelParameters;
pub use crate::observation::{ObservationSequence, Observations, TaggedSequence};
pub use crate::prob::LogProb;
