use thiserror::Error;

use courier_core::ResponseError;

use crate::config::ConfigError;

/// Crate-level convenience error.
///
/// A thin wrapper over the capability errors; remote failures reach the
/// consumer through [`crate::Receiver::get`] and can be folded in here.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DealerError {
    /// The named service is not declared in the dealer configuration.
    #[error("unknown service `{0}`")]
    UnknownService(String),

    #[error(transparent)]
    Remote(#[from] ResponseError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
