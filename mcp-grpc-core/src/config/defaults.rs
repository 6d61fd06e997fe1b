//! Centralized default values for the bridge.
//!
//! Defaults are used when neither a CLI flag nor an environment variable
//! provides a value. CLI flags are applied on top of [`BridgeDefaults::from_env`].

use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs};
use std::str::FromStr;

use tracing::warn;

use super::ConfigError;

/// What the server does with a message it cannot classify or whose
/// identifier the engine cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InvalidMessagePolicy {
    /// Tear down the session.
    #[default]
    Terminate,
    /// Drop the message with a WARN event and keep receiving.
    Skip,
}

impl FromStr for InvalidMessagePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "terminate" => Ok(Self::Terminate),
            "skip" => Ok(Self::Skip),
            _ => Err(ConfigError::UnknownPolicy {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for InvalidMessagePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Terminate => "terminate",
            Self::Skip => "skip",
        })
    }
}

/// Centralized default values for server and client roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeDefaults {
    /// Interface the server binds.
    pub host: String,

    /// Port the server binds.
    pub port: u16,

    /// Server address the client dials. A missing scheme means `http://`.
    pub address: String,

    /// Largest encoded gRPC message accepted, and largest NDJSON line read.
    pub max_message_bytes: usize,

    /// Capacity of the per-stream outgoing message queues.
    pub channel_capacity: usize,

    pub on_invalid_message: InvalidMessagePolicy,
}

impl Default for BridgeDefaults {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50051,
            address: "http://localhost:50051".to_string(),
            max_message_bytes: 10 * 1024 * 1024, // 10 MiB
            channel_capacity: 32,
            on_invalid_message: InvalidMessagePolicy::Terminate,
        }
    }
}

impl BridgeDefaults {
    /// Create defaults from environment variables.
    ///
    /// # Environment Variables
    /// - `MCP_GRPC_HOST`
    /// - `MCP_GRPC_PORT`
    /// - `MCP_GRPC_ADDRESS`
    /// - `MCP_GRPC_MAX_MESSAGE_BYTES`
    /// - `MCP_GRPC_CHANNEL_CAPACITY`
    /// - `MCP_GRPC_ON_INVALID_MESSAGE` (`terminate` or `skip`)
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            host: parse_env_warn("MCP_GRPC_HOST", default.host),
            port: parse_env_warn("MCP_GRPC_PORT", default.port),
            address: parse_env_warn("MCP_GRPC_ADDRESS", default.address),
            max_message_bytes: parse_env_warn(
                "MCP_GRPC_MAX_MESSAGE_BYTES",
                default.max_message_bytes,
            ),
            channel_capacity: parse_env_warn("MCP_GRPC_CHANNEL_CAPACITY", default.channel_capacity),
            on_invalid_message: parse_env_warn(
                "MCP_GRPC_ON_INVALID_MESSAGE",
                default.on_invalid_message,
            ),
        }
    }

    /// Validate that configured values are usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        if self.max_message_bytes == 0 {
            return Err(ConfigError::InvalidMaxMessageBytes {
                bytes: self.max_message_bytes,
            });
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidChannelCapacity {
                capacity: self.channel_capacity,
            });
        }
        Ok(())
    }

    /// Resolve `host:port` into the socket address to bind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidListenAddress`] when the host does not
    /// resolve.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let display = format!("{}:{}", self.host, self.port);
        let invalid = |message: String| ConfigError::InvalidListenAddress {
            address: display.clone(),
            message,
        };
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("host resolved to no addresses".to_string()))
    }

    /// Client dial target with an explicit scheme.
    pub fn client_endpoint(&self) -> String {
        if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("http://{}", self.address)
        }
    }
}

/// Parse an environment variable with a warning on invalid values.
fn parse_env_warn<T: FromStr + fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(val) => match val.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    env_var = name,
                    value = %val,
                    default = %default,
                    "Invalid value for environment variable, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}
