//! mcp-grpc: carry JSON-RPC 2.0 (MCP) over a bidirectional gRPC stream.
//!
//! - [`server`]: a tonic `JsonRpcService` that runs one sequential
//!   [`server::StreamSession`] per stream against a [`mcp_grpc_core::HostEngine`].
//! - [`client`]: the stdio correlator that turns NDJSON lines into wire
//!   messages and wire replies back into lines.
//! - [`demo`]: a small tool server engine used by `mcp-grpc serve`.

pub mod cli;
pub mod client;
pub mod demo;
pub mod error;
pub mod server;
