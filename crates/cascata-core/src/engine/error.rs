use thiserror::Error;

use super::config::ConfigError;
use crate::core::models::state::TopologyError;

/// Fatal conditions of the evolution engine.
///
/// Kinematically rejected candidates are deliberately *not* represented
/// here: a rejected sampling point means "no emission" and is handled by a
/// local retry inside the scheduler. Everything below indicates a defect in
/// model registration or state setup and aborts the event.
#[derive(Debug, Error)]
pub enum CascadeError {
    #[error("Emission model contract violated by '{model}': {reason}")]
    ModelContract { model: &'static str, reason: String },

    #[error("Colour topology corrupted: {source}")]
    Topology {
        #[from]
        source: TopologyError,
    },

    #[error("Invalid cascade configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Internal logic error: {0}")]
    Internal(String),
}
