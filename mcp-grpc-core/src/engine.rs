//! Host-engine boundary.
//!
//! A [`HostEngine`] is the externally-owned protocol engine that sits behind
//! the bridge: it receives one JSON-RPC text document at a time and returns
//! the reply document, if any. Dispatch and business logic live entirely on
//! the engine side.
//!
//! Each call carries a [`ConnectionContext`] instead of relying on any
//! ambient "current stream" lookup. The context holds a [`Notifier`] bound to
//! the session's own reply channel, so an engine can push notifications onto
//! the same stream it is answering.

use std::net::SocketAddr;
use std::sync::LazyLock;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::value::RawValue;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::host::HostMessage;
use crate::id::Identifier;
use crate::proto::GenericJsonRpcMessage;
use crate::translate::{TranslateError, to_wire};

// ─────────────────────────────────────────────────────────────────────────────
// Engine trait
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier kinds an engine can accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdSupport {
    /// String and integer identifiers.
    #[default]
    Any,
    /// Integer identifiers only; a string identifier is rejected, never
    /// coerced.
    NumberOnly,
}

impl IdSupport {
    /// Whether an identifier of this kind may be forwarded to the engine.
    /// Absent identifiers are always accepted.
    pub fn accepts(self, id: &Identifier) -> bool {
        match (self, id) {
            (_, Identifier::Absent | Identifier::Number(_)) => true,
            (IdSupport::Any, Identifier::String(_)) => true,
            (IdSupport::NumberOnly, Identifier::String(_)) => false,
        }
    }
}

/// Engine-side failure. Fatal to the session that observed it.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine failed: {reason}")]
    Failed { reason: String },

    #[error("notification could not be translated: {0}")]
    Notify(#[from] TranslateError),

    #[error("reply stream closed")]
    Closed,
}

/// The protocol engine behind the bridge.
#[async_trait]
pub trait HostEngine: Send + Sync + 'static {
    /// Identifier kinds this engine can handle.
    fn id_support(&self) -> IdSupport;

    /// Handle one JSON-RPC text document.
    ///
    /// Returns the reply document for requests, `None` when there is nothing
    /// to send back.
    async fn handle(
        &self,
        ctx: &ConnectionContext,
        document: &str,
    ) -> Result<Option<String>, EngineError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Reply channel
// ─────────────────────────────────────────────────────────────────────────────

/// Item type of the server-side response stream.
pub type ReplyItem = Result<GenericJsonRpcMessage, tonic::Status>;

/// Send half of one session's response stream.
#[derive(Debug, Clone)]
pub struct ReplySender {
    tx: mpsc::Sender<ReplyItem>,
}

impl ReplySender {
    pub fn new(tx: mpsc::Sender<ReplyItem>) -> Self {
        Self { tx }
    }

    /// Queue a wire message. Waits while the channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Closed`] once the peer has gone away.
    pub async fn send(&self, message: GenericJsonRpcMessage) -> Result<(), EngineError> {
        self.tx.send(Ok(message)).await.map_err(|_| EngineError::Closed)
    }

    /// Terminate the response stream with a gRPC status.
    pub async fn fail(&self, status: tonic::Status) {
        // Nothing to do if the peer is already gone.
        let _ = self.tx.send(Err(status)).await;
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Engine-facing handle for pushing notifications onto the session stream.
#[derive(Debug, Clone)]
pub struct Notifier {
    replies: ReplySender,
}

impl Notifier {
    pub fn new(replies: ReplySender) -> Self {
        Self { replies }
    }

    /// Send a notification. `params`, when given, must be a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Notify`] if the params have no structured form,
    /// [`EngineError::Closed`] if the stream is gone.
    pub async fn notify(
        &self,
        method: &str,
        params: Option<Box<RawValue>>,
    ) -> Result<(), EngineError> {
        let message = HostMessage::Notification {
            method: method.to_string(),
            params,
        };
        let wire = to_wire(&message, &Identifier::Absent)?;
        tracing::debug!(method, "Engine notification queued");
        self.replies.send(wire).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connection context
// ─────────────────────────────────────────────────────────────────────────────

/// Per-connection information handed to every engine call.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    session_id: Uuid,
    peer: Option<SocketAddr>,
    notifier: Notifier,
}

impl ConnectionContext {
    pub fn new(session_id: Uuid, peer: Option<SocketAddr>, notifier: Notifier) -> Self {
        Self {
            session_id,
            peer,
            notifier,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }
}

/// Process-unique upper 64 bits, drawn once from `Uuid::new_v4()`.
static SESSION_PREFIX: LazyLock<u64> = LazyLock::new(|| (Uuid::new_v4().as_u128() >> 64) as u64);

static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a session id without a CSPRNG call per session.
///
/// Upper half is the process prefix, lower half a counter; version and
/// variant bits are set so the result parses as a v4 UUID.
pub fn fast_session_id() -> Uuid {
    let counter = SESSION_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut combined = ((*SESSION_PREFIX as u128) << 64) | (counter as u128);
    combined = (combined & !(0xF_u128 << 76)) | (0x4_u128 << 76);
    combined = (combined & !(0x3_u128 << 62)) | (0x2_u128 << 62);
    Uuid::from_u128(combined)
}
