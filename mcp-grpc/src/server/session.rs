//! Per-stream session loop.
//!
//! One [`StreamSession`] drives one gRPC stream strictly in sequence:
//! receive, translate, hand to the engine, and for requests translate and
//! send the engine's reply before receiving again. A slow engine call blocks
//! further receives on this stream only.

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use mcp_grpc_core::config::InvalidMessagePolicy;
use mcp_grpc_core::engine::fast_session_id;
use mcp_grpc_core::proto::GenericJsonRpcMessage;
use mcp_grpc_core::{
    ClassificationError, ConnectionContext, HostEngine, HostMessage, MessageKind, Notifier,
    ReplySender, TranslateError, to_host, to_wire,
};
use uuid::Uuid;

use crate::error::SessionError;

/// Inbound half of a stream as the session sees it.
pub type InboundStream =
    Pin<Box<dyn Stream<Item = Result<GenericJsonRpcMessage, tonic::Status>> + Send>>;

/// One open stream bound to a host engine.
pub struct StreamSession<E> {
    session_id: Uuid,
    engine: Arc<E>,
    replies: ReplySender,
    ctx: ConnectionContext,
    on_invalid_message: InvalidMessagePolicy,
}

impl<E: HostEngine> StreamSession<E> {
    pub fn new(
        engine: Arc<E>,
        replies: ReplySender,
        peer: Option<SocketAddr>,
        on_invalid_message: InvalidMessagePolicy,
    ) -> Self {
        let session_id = fast_session_id();
        let ctx = ConnectionContext::new(session_id, peer, Notifier::new(replies.clone()));
        Self {
            session_id,
            engine,
            replies,
            ctx,
            on_invalid_message,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run until the peer ends the stream (`Ok`) or a fatal error occurs.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] on a transport failure, a translation failure
    /// (unless the invalid-message policy is `skip` and the failure is local
    /// to the message), an engine failure, or a closed reply stream. A
    /// message whose `Id` has no kind is always dropped with a WARN.
    pub async fn run(self, mut inbound: InboundStream) -> Result<(), SessionError> {
        let session_id = self.session_id;
        let support = self.engine.id_support();
        tracing::debug!(%session_id, peer = ?self.ctx.peer(), ?support, "session started");

        loop {
            let wire = match inbound.next().await {
                None => {
                    tracing::debug!(%session_id, "peer closed the stream");
                    return Ok(());
                }
                Some(Err(status)) => return Err(SessionError::Transport { source: status }),
                Some(Ok(wire)) => wire,
            };

            let inbound_msg = match to_host(wire, support) {
                Ok(m) => m,
                // An id that cannot be read is never answered or reported to
                // the peer, whatever the policy.
                Err(TranslateError::Classification(ClassificationError::UnrecognizedIdKind)) => {
                    tracing::warn!(%session_id, "inbound message has an unrecognized id kind, dropping");
                    continue;
                }
                Err(e) if e.is_message_local() => {
                    tracing::warn!(%session_id, error = %e, "invalid inbound message");
                    match self.on_invalid_message {
                        InvalidMessagePolicy::Skip => continue,
                        InvalidMessagePolicy::Terminate => return Err(e.into()),
                    }
                }
                Err(e) => return Err(e.into()),
            };

            let kind = inbound_msg.kind;
            let document = inbound_msg
                .message
                .to_document()
                .map_err(|source| SessionError::Render { source })?;
            tracing::debug!(
                %session_id,
                kind = %kind,
                id = %inbound_msg.id,
                method = inbound_msg.message.method().unwrap_or_default(),
                "forwarding to engine"
            );

            let reply = self.engine.handle(&self.ctx, &document).await?;

            match (kind, reply) {
                (MessageKind::Request, Some(text)) => {
                    let reply = HostMessage::from_document(&text)
                        .map_err(|source| SessionError::InvalidReply { source })?;
                    if !matches!(
                        reply.kind(),
                        MessageKind::Response | MessageKind::ErrorResponse
                    ) {
                        return Err(SessionError::UnexpectedReply { kind: reply.kind() });
                    }
                    let wire = to_wire(&reply, &inbound_msg.id)?;
                    self.replies
                        .send(wire)
                        .await
                        .map_err(|_| SessionError::Closed)?;
                }
                (MessageKind::Request, None) => {
                    tracing::warn!(
                        %session_id,
                        id = %inbound_msg.id,
                        "engine returned no reply for request"
                    );
                }
                (kind, Some(_)) => {
                    tracing::warn!(
                        %session_id,
                        kind = %kind,
                        "engine replied to a message that expects no reply, dropping"
                    );
                }
                (_, None) => {}
            }
        }
    }
}
