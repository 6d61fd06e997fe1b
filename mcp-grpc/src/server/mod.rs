//! gRPC server role: the `JsonRpcService` implementation and bootstrap.
//!
//! Every `Transport` call gets its own [`StreamSession`] task. Concurrency
//! exists only across streams; within a stream messages are handled one at a
//! time.

mod session;

pub use session::{InboundStream, StreamSession};

use std::future::Future;
use std::sync::Arc;

use mcp_grpc_core::config::{BridgeDefaults, InvalidMessagePolicy};
use mcp_grpc_core::engine::ReplyItem;
use mcp_grpc_core::proto::GenericJsonRpcMessage;
use mcp_grpc_core::proto::json_rpc_service_server::{JsonRpcService, JsonRpcServiceServer};
use mcp_grpc_core::{HostEngine, ReplySender};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_stream::wrappers::{ReceiverStream, TcpListenerStream};
use tonic::transport::Server;
use tonic::{Request, Response, Status, Streaming};

use crate::error::ServeError;

/// Per-stream settings shared by every session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub channel_capacity: usize,
    pub on_invalid_message: InvalidMessagePolicy,
}

impl From<&BridgeDefaults> for SessionOptions {
    fn from(d: &BridgeDefaults) -> Self {
        Self {
            channel_capacity: d.channel_capacity,
            on_invalid_message: d.on_invalid_message,
        }
    }
}

/// `JsonRpcService` backed by a host engine.
pub struct BridgeService<E> {
    engine: Arc<E>,
    options: SessionOptions,
}

impl<E: HostEngine> BridgeService<E> {
    pub fn new(engine: E, options: SessionOptions) -> Self {
        Self {
            engine: Arc::new(engine),
            options,
        }
    }
}

#[tonic::async_trait]
impl<E: HostEngine> JsonRpcService for BridgeService<E> {
    type TransportStream = ReceiverStream<ReplyItem>;

    async fn transport(
        &self,
        request: Request<Streaming<GenericJsonRpcMessage>>,
    ) -> Result<Response<Self::TransportStream>, Status> {
        let peer = request.remote_addr();
        let inbound: InboundStream = Box::pin(request.into_inner());

        let (tx, rx) = mpsc::channel(self.options.channel_capacity);
        let replies = ReplySender::new(tx);
        let session = StreamSession::new(
            self.engine.clone(),
            replies.clone(),
            peer,
            self.options.on_invalid_message,
        );
        let session_id = session.session_id();
        tracing::info!(%session_id, peer = ?peer, "stream opened");

        tokio::spawn(async move {
            match session.run(inbound).await {
                Ok(()) => tracing::info!(%session_id, "stream closed"),
                Err(e) => {
                    tracing::error!(%session_id, error = %e, "session terminated");
                    replies.fail(e.to_status()).await;
                }
            }
        });

        Ok(Response::new(ReceiverStream::new(rx)))
    }
}

/// Bind `host:port` from `defaults` and serve until Ctrl+C.
///
/// # Errors
///
/// Returns [`ServeError`] on invalid configuration, bind failure, or a fatal
/// transport error.
pub async fn serve<E: HostEngine>(defaults: &BridgeDefaults, engine: E) -> Result<(), ServeError> {
    defaults.validate()?;
    let addr = defaults.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServeError::Bind { addr, source })?;
    tracing::info!(%addr, "gRPC server listening");

    serve_with_listener(listener, defaults, engine, shutdown_signal()).await
}

/// Serve on an already-bound listener until `shutdown` resolves.
///
/// # Errors
///
/// Returns [`ServeError::Transport`] on a fatal transport error.
pub async fn serve_with_listener<E, F>(
    listener: TcpListener,
    defaults: &BridgeDefaults,
    engine: E,
    shutdown: F,
) -> Result<(), ServeError>
where
    E: HostEngine,
    F: Future<Output = ()> + Send,
{
    let service = JsonRpcServiceServer::new(BridgeService::new(engine, defaults.into()))
        .max_decoding_message_size(defaults.max_message_bytes)
        .max_encoding_message_size(defaults.max_message_bytes);

    Server::builder()
        .add_service(service)
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await?;
    tracing::info!("gRPC server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("interrupt received, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for interrupt");
            std::future::pending::<()>().await;
        }
    }
}
