//! Client role: the stdio correlator.
//!
//! Two flows share one bidirectional stream, split by direction so neither
//! needs a lock:
//!
//! - [`outbound_flow`] owns the `mpsc::Sender` feeding the request stream and
//!   turns NDJSON input lines into wire messages, typing each identifier from
//!   its JSON kind.
//! - [`inbound_flow`] owns the response stream and writes each reply back as a
//!   line with the identifier in its original kind.
//!
//! Closing input half-closes the request stream; the process ends when the
//! server closes its side (even if input is still open) or on Ctrl+C.

mod inbound;
pub mod line;
mod outbound;

pub use inbound::inbound_flow;
pub use outbound::outbound_flow;

use futures_util::Stream;
use mcp_grpc_core::config::BridgeDefaults;
use mcp_grpc_core::proto::GenericJsonRpcMessage;
use mcp_grpc_core::proto::json_rpc_service_client::JsonRpcServiceClient;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::transport::{Channel, Endpoint};

use crate::error::ClientError;

/// Dial the server named by `defaults.address`.
///
/// # Errors
///
/// Returns [`ClientError::Connect`] when the address is invalid or the server
/// is unreachable.
pub async fn connect(defaults: &BridgeDefaults) -> Result<JsonRpcServiceClient<Channel>, ClientError> {
    let address = defaults.client_endpoint();
    let endpoint = Endpoint::from_shared(address.clone()).map_err(|source| ClientError::Connect {
        address: address.clone(),
        source,
    })?;
    let channel = endpoint
        .connect()
        .await
        .map_err(|source| ClientError::Connect {
            address: address.clone(),
            source,
        })?;
    tracing::info!(%address, "connected");

    Ok(JsonRpcServiceClient::new(channel)
        .max_decoding_message_size(defaults.max_message_bytes)
        .max_encoding_message_size(defaults.max_message_bytes))
}

/// Open one stream and run both flows over it until both finish.
///
/// # Errors
///
/// Returns the first error from either flow, or [`ClientError::Open`] if the
/// server rejects the stream.
pub async fn run_flows<R, W>(
    client: &mut JsonRpcServiceClient<Channel>,
    reader: R,
    writer: W,
    defaults: &BridgeDefaults,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (tx, rx) = mpsc::channel(defaults.channel_capacity);
    let response = client
        .transport(ReceiverStream::new(rx))
        .await
        .map_err(|source| ClientError::Open { source })?;
    let responses = Box::pin(response.into_inner());

    drive_flows(reader, tx, responses, writer, defaults.max_message_bytes).await
}

/// Run both flows until the response stream ends.
///
/// End of input only half-closes the request side; the server may still be
/// answering. The response stream ending stops everything, even when input
/// is still open.
///
/// # Errors
///
/// Returns the first error from either flow.
pub async fn drive_flows<R, S, W>(
    reader: R,
    tx: mpsc::Sender<GenericJsonRpcMessage>,
    responses: S,
    writer: W,
    max_bytes: usize,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
    S: Stream<Item = Result<GenericJsonRpcMessage, tonic::Status>> + Unpin,
    W: AsyncWrite + Unpin,
{
    let outbound = outbound_flow(reader, tx, max_bytes);
    let inbound = inbound_flow(responses, writer);
    tokio::pin!(outbound, inbound);

    let mut input_done = false;
    loop {
        tokio::select! {
            result = &mut inbound => return result,
            result = &mut outbound, if !input_done => {
                result?;
                input_done = true;
            }
        }
    }
}

/// Run the stdio client: stdin → server → stdout, until the server closes
/// the stream or Ctrl+C.
///
/// # Errors
///
/// See [`connect`] and [`run_flows`].
pub async fn run_client(defaults: &BridgeDefaults) -> Result<(), ClientError> {
    defaults.validate()?;
    let mut client = connect(defaults).await?;
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();

    tokio::select! {
        biased;
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, shutting down");
            Ok(())
        }
        result = run_flows(&mut client, stdin, stdout, defaults) => result,
    }
}
