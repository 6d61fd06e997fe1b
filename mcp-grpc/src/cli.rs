//! CLI argument types for `mcp-grpc serve` and `mcp-grpc client`.
//!
//! Defined apart from `main.rs` so integration tests can parse them directly.
//! Every flag is optional; unset flags fall back to [`BridgeDefaults::from_env`].

use clap::{Args, ValueEnum};
use mcp_grpc_core::config::{BridgeDefaults, InvalidMessagePolicy};

// ─────────────────────────────────────────────────────────────────────────────
// Serve Subcommand Args
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for `mcp-grpc serve`.
///
/// Runs the gRPC server with the demo tool engine behind it.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind [env: MCP_GRPC_HOST, default: 0.0.0.0].
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind [env: MCP_GRPC_PORT, default: 50051].
    #[arg(long)]
    pub port: Option<u16>,

    /// Run the engine in integer-id mode: string ids are rejected.
    #[arg(long)]
    pub integer_ids: bool,

    /// What to do with a message that cannot be classified
    /// [env: MCP_GRPC_ON_INVALID_MESSAGE, default: terminate].
    #[arg(long, value_enum)]
    pub on_invalid_message: Option<CliInvalidMessagePolicy>,

    /// Largest accepted gRPC message in bytes [env: MCP_GRPC_MAX_MESSAGE_BYTES].
    #[arg(long)]
    pub max_message_bytes: Option<usize>,

    /// Enable debug logging.
    #[arg(long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Overlay the flags that were given onto `defaults`.
    pub fn apply(&self, mut defaults: BridgeDefaults) -> BridgeDefaults {
        if let Some(host) = &self.host {
            defaults.host = host.clone();
        }
        if let Some(port) = self.port {
            defaults.port = port;
        }
        if let Some(policy) = self.on_invalid_message {
            defaults.on_invalid_message = policy.into();
        }
        if let Some(bytes) = self.max_message_bytes {
            defaults.max_message_bytes = bytes;
        }
        defaults
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Client Subcommand Args
// ─────────────────────────────────────────────────────────────────────────────

/// Arguments for `mcp-grpc client`.
///
/// Reads NDJSON JSON-RPC messages from stdin, sends them over the gRPC
/// stream, and writes replies to stdout.
#[derive(Args, Debug)]
pub struct ClientArgs {
    /// Server address [env: MCP_GRPC_ADDRESS, default: http://localhost:50051].
    #[arg(long)]
    pub address: Option<String>,

    /// Largest accepted line and gRPC message in bytes
    /// [env: MCP_GRPC_MAX_MESSAGE_BYTES].
    #[arg(long)]
    pub max_message_bytes: Option<usize>,

    /// Enable debug logging.
    #[arg(long)]
    pub verbose: bool,
}

impl ClientArgs {
    /// Overlay the flags that were given onto `defaults`.
    pub fn apply(&self, mut defaults: BridgeDefaults) -> BridgeDefaults {
        if let Some(address) = &self.address {
            defaults.address = address.clone();
        }
        if let Some(bytes) = self.max_message_bytes {
            defaults.max_message_bytes = bytes;
        }
        defaults
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Value Enums
// ─────────────────────────────────────────────────────────────────────────────

/// CLI spelling of [`InvalidMessagePolicy`].
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CliInvalidMessagePolicy {
    /// Tear down the stream.
    Terminate,
    /// Drop the message and keep the stream open.
    Skip,
}

impl From<CliInvalidMessagePolicy> for InvalidMessagePolicy {
    fn from(p: CliInvalidMessagePolicy) -> Self {
        match p {
            CliInvalidMessagePolicy::Terminate => InvalidMessagePolicy::Terminate,
            CliInvalidMessagePolicy::Skip => InvalidMessagePolicy::Skip,
        }
    }
}
