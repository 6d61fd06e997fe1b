//! Error types for the server session, the stdio client and the CLI.
//!
//! `FramingError` covers NDJSON line handling on the client: size limits,
//! malformed JSON, version validation, batch rejection and IO. It is local to
//! one line except for `Io`.
//!
//! `SessionError` ends one server stream. `ClientError` and `ServeError` end
//! the process.

use std::net::SocketAddr;

use mcp_grpc_core::config::ConfigError;
use mcp_grpc_core::{DocumentError, EngineError, MessageKind, TranslateError};

/// Errors that can occur when parsing or rendering one NDJSON line.
#[derive(Debug, thiserror::Error)]
pub enum FramingError {
    /// A single NDJSON line exceeds the configured maximum size.
    ///
    /// Checked before JSON parsing. Default limit: 10 MiB.
    #[error("Message exceeds maximum size of {max_bytes} bytes")]
    MessageTooLarge {
        /// The configured maximum message size in bytes.
        max_bytes: usize,
    },

    /// The line is not valid JSON, or its structure is invalid for JSON-RPC.
    #[error("Malformed JSON: {reason}")]
    MalformedJson {
        /// Human-readable description of the parse failure.
        reason: String,
    },

    /// The `jsonrpc` field is absent from the JSON object.
    #[error("Missing required jsonrpc field")]
    MissingVersion,

    /// The `jsonrpc` field is present but not `"2.0"`.
    #[error("Unsupported JSON-RPC version: {version}")]
    UnsupportedVersion {
        /// The version string found in the message.
        version: String,
    },

    /// The message is a JSON array, i.e. a JSON-RPC batch.
    #[error("JSON-RPC batch requests (arrays) are not supported")]
    UnsupportedBatch,

    /// Well-formed JSON that is not a valid JSON-RPC message.
    #[error("Invalid JSON-RPC message: {0}")]
    InvalidMessage(DocumentError),

    /// The message has no representation on the other side of the bridge.
    #[error("Untranslatable message: {0}")]
    Translate(#[from] TranslateError),

    /// An underlying IO error occurred while reading stdin or writing stdout.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<DocumentError> for FramingError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::Malformed { reason } => FramingError::MalformedJson { reason },
            DocumentError::MissingVersion => FramingError::MissingVersion,
            DocumentError::UnsupportedVersion { version } => {
                FramingError::UnsupportedVersion { version }
            }
            other => FramingError::InvalidMessage(other),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Server Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that end one server stream session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Receiving from the peer failed for a reason other than end-of-stream.
    #[error("Transport error: {source}")]
    Transport {
        /// Status reported by the transport.
        source: tonic::Status,
    },

    /// An inbound message or an engine reply could not be translated.
    #[error("Translation failed: {0}")]
    Translate(#[from] TranslateError),

    /// The host engine failed.
    #[error("Host engine failed: {0}")]
    Engine(#[from] EngineError),

    /// An inbound message could not be rendered as a text document.
    #[error("Failed to render message for engine: {source}")]
    Render {
        /// Render failure.
        source: DocumentError,
    },

    /// The engine replied with a document that is not valid JSON-RPC.
    #[error("Invalid engine reply: {source}")]
    InvalidReply {
        /// Parse failure.
        source: DocumentError,
    },

    /// The engine answered a request with something other than a reply.
    #[error("Engine answered a request with a {kind} instead of a reply")]
    UnexpectedReply {
        /// Kind of the document the engine produced.
        kind: MessageKind,
    },

    /// The response stream is gone; the peer disconnected.
    #[error("Reply stream closed by peer")]
    Closed,
}

impl SessionError {
    /// Status sent to the peer when the session ends with this error.
    pub fn to_status(&self) -> tonic::Status {
        match self {
            SessionError::Transport { source } => source.clone(),
            SessionError::Translate(e) if e.is_message_local() => {
                tonic::Status::invalid_argument(self.to_string())
            }
            SessionError::Translate(_)
            | SessionError::Engine(_)
            | SessionError::Render { .. }
            | SessionError::InvalidReply { .. }
            | SessionError::UnexpectedReply { .. } => tonic::Status::internal(self.to_string()),
            SessionError::Closed => tonic::Status::cancelled(self.to_string()),
        }
    }
}

/// Errors that stop `mcp-grpc serve`.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("gRPC server error: {0}")]
    Transport(#[from] tonic::transport::Error),
}

// ─────────────────────────────────────────────────────────────────────────────
// Client Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that stop `mcp-grpc client`.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The server could not be reached.
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        source: tonic::transport::Error,
    },

    /// The server refused to open the stream.
    #[error("Failed to open stream: {source}")]
    Open { source: tonic::Status },

    /// The stream failed after it was opened.
    #[error("Transport error: {source}")]
    Transport { source: tonic::Status },

    /// The request stream was closed while messages were still being sent.
    #[error("Send failed: request stream closed")]
    SendClosed,

    /// Reading stdin or writing stdout failed.
    #[error("Framing error: {0}")]
    Framing(#[from] FramingError),
}
