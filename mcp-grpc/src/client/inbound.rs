//! Inbound flow: wire messages from the stream → NDJSON lines on the writer.

use futures_util::{Stream, StreamExt};
use mcp_grpc_core::proto::GenericJsonRpcMessage;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{ClientError, FramingError};

use super::line::format_line;

/// Write every received message as one line until the stream ends.
///
/// End-of-stream is a clean exit. Messages that cannot be rendered are
/// logged and skipped.
///
/// # Errors
///
/// Returns [`ClientError::Transport`] for a transport failure and
/// [`ClientError::Framing`] when writing fails.
pub async fn inbound_flow<S, W>(mut responses: S, mut writer: W) -> Result<(), ClientError>
where
    S: Stream<Item = Result<GenericJsonRpcMessage, tonic::Status>> + Unpin,
    W: AsyncWrite + Unpin,
{
    loop {
        let wire = match responses.next().await {
            None => {
                tracing::debug!("server closed the stream");
                return Ok(());
            }
            Some(Err(status)) => return Err(ClientError::Transport { source: status }),
            Some(Ok(wire)) => wire,
        };

        let line = match format_line(wire) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "received message cannot be rendered, skipping");
                continue;
            }
        };

        writer
            .write_all(line.as_bytes())
            .await
            .map_err(FramingError::Io)?;
        writer.flush().await.map_err(FramingError::Io)?;
    }
}
