//! Outbound flow: NDJSON lines from the reader → wire messages on the stream.

use mcp_grpc_core::proto::GenericJsonRpcMessage;
use mcp_grpc_core::to_wire;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;

use crate::error::{ClientError, FramingError};

use super::line::{bounded_read_line, parse_line};

/// Read lines until EOF, sending each valid message on `tx`.
///
/// Malformed lines are logged and skipped. Returning drops `tx`, which
/// half-closes the request stream.
///
/// # Errors
///
/// Returns [`ClientError::Framing`] on a read failure and
/// [`ClientError::SendClosed`] when the request stream is gone.
pub async fn outbound_flow<R: AsyncBufRead + Unpin>(
    mut reader: R,
    tx: mpsc::Sender<GenericJsonRpcMessage>,
    max_bytes: usize,
) -> Result<(), ClientError> {
    let mut raw_buf = Vec::new();
    let mut line_no = 0u64;

    loop {
        raw_buf.clear();

        let bytes_read = match bounded_read_line(&mut reader, &mut raw_buf, max_bytes).await {
            Ok(n) => n,
            Err(FramingError::MessageTooLarge { max_bytes }) => {
                line_no += 1;
                tracing::warn!(line_no, max_bytes, "input line exceeded size limit, skipping");
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if bytes_read == 0 {
            tracing::debug!("input EOF, closing request stream");
            return Ok(());
        }
        line_no += 1;

        let Ok(line) = std::str::from_utf8(&raw_buf) else {
            tracing::warn!(line_no, len = raw_buf.len(), "input line is not valid UTF-8, skipping");
            continue;
        };
        if line.trim().is_empty() {
            continue;
        }

        let message = match parse_line(line, max_bytes) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(line_no, error = %e, "malformed input line, skipping");
                continue;
            }
        };
        let wire = match to_wire(&message, message.id()) {
            Ok(w) => w,
            Err(e) => {
                tracing::warn!(line_no, error = %e, "input line cannot be sent, skipping");
                continue;
            }
        };

        tracing::debug!(
            line_no,
            kind = %message.kind(),
            id = %message.id(),
            "sending message"
        );
        tx.send(wire).await.map_err(|_| ClientError::SendClosed)?;
    }
}
