//! mcp-grpc core: message-model translation between JSON-RPC 2.0 and a
//! bidirectional gRPC stream.
//!
//! This library holds everything that has invariants: the protobuf wire
//! schema, identifier encoding, message classification, the structured value
//! codec, the host-engine message model and boundary trait, and the inbound
//! and outbound translators. The `mcp-grpc` crate drives these from a
//! per-connection stream session (server role) and from the stdio correlator
//! (client role).
//!
//! # Data flow
//!
//! ```text
//! wire message ──► Identifier::from_wire + classify ──► translate::to_host ──► HostEngine
//!                                                                               │
//! wire message ◄──────────────── translate::to_wire ◄── HostMessage reply ◄─────┘
//! ```

pub mod classify;
pub mod config;
pub mod engine;
pub mod host;
pub mod id;
pub mod proto;
pub mod translate;
pub mod value;

pub use classify::{ClassificationError, MessageKind, Presence, classify};
pub use engine::{ConnectionContext, EngineError, HostEngine, IdSupport, Notifier, ReplySender};
pub use host::{DocumentError, HostError, HostMessage};
pub use id::{Identifier, IdentifierError};
pub use translate::{Inbound, TranslateError, to_host, to_wire};
pub use value::PayloadError;

/// JSON-RPC protocol version emitted when a wire message leaves it unset.
pub const JSONRPC_VERSION: &str = "2.0";
