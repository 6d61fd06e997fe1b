//! Configuration error types.

use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("listen host must not be empty")]
    EmptyHost,

    #[error("server address must not be empty")]
    EmptyAddress,

    #[error("invalid max message size {bytes}: must be > 0")]
    InvalidMaxMessageBytes { bytes: usize },

    #[error("invalid channel capacity {capacity}: must be > 0")]
    InvalidChannelCapacity { capacity: usize },

    #[error("unknown invalid-message policy '{value}': must be \"terminate\" or \"skip\"")]
    UnknownPolicy { value: String },

    #[error("invalid listen address '{address}': {message}")]
    InvalidListenAddress { address: String, message: String },
}
