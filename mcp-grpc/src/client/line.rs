//! NDJSON line codec for the stdio side of the client.
//!
//! Pure parse/format functions plus the bounded line reader. The flows in
//! [`super::outbound`] and [`super::inbound`] call these per line.

use mcp_grpc_core::proto::GenericJsonRpcMessage;
use mcp_grpc_core::{HostMessage, IdSupport, to_host};

use crate::error::FramingError;

/// Parse one NDJSON line into a host message.
///
/// Performs size validation, batch rejection and JSON-RPC validation in
/// sequence. The identifier keeps its JSON kind: `"id": 1` becomes an integer
/// identifier, `"id": "1"` a string one.
///
/// # Errors
///
/// Returns [`FramingError`] for:
/// - Oversized lines (`MessageTooLarge`), checked before JSON parsing
/// - Empty lines and invalid JSON (`MalformedJson`)
/// - JSON arrays (`UnsupportedBatch`)
/// - Missing or wrong `jsonrpc` version
/// - Invalid ids or field combinations (`InvalidMessage`)
pub fn parse_line(line: &str, max_bytes: usize) -> Result<HostMessage, FramingError> {
    if line.len() > max_bytes {
        return Err(FramingError::MessageTooLarge { max_bytes });
    }

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(FramingError::MalformedJson {
            reason: "empty message".to_string(),
        });
    }
    if trimmed.starts_with('[') {
        return Err(FramingError::UnsupportedBatch);
    }

    Ok(HostMessage::from_document(trimmed)?)
}

/// Render a wire message as one NDJSON line, newline included.
///
/// # Errors
///
/// Returns [`FramingError::Translate`] if the wire message cannot be
/// classified or its payload has no JSON form.
pub fn format_line(wire: GenericJsonRpcMessage) -> Result<String, FramingError> {
    let inbound = to_host(wire, IdSupport::Any)?;
    let mut line = inbound.message.to_document()?;
    line.push('\n');
    Ok(line)
}

/// Read a single line from an async buffered reader, enforcing a byte limit.
///
/// Bytes are accumulated raw so multi-byte UTF-8 characters split across
/// internal buffer boundaries stay intact. An oversized line is discarded up
/// to its newline so the next read starts on a fresh line; the number of
/// bytes thrown away is logged at DEBUG.
///
/// # Returns
///
/// - `Ok(n)` where `n > 0`: a complete line was read into `buf`
/// - `Ok(0)`: EOF reached
/// - `Err(FramingError::MessageTooLarge)`: line exceeded `max_bytes`
/// - `Err(FramingError::Io)`: underlying I/O error
pub async fn bounded_read_line<R: tokio::io::AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
    max_bytes: usize,
) -> Result<usize, FramingError> {
    use tokio::io::AsyncBufReadExt;

    let mut total = 0usize;
    loop {
        let available = reader.fill_buf().await.map_err(FramingError::Io)?;

        // EOF: whatever was gathered is the final, unterminated line.
        if available.is_empty() {
            return Ok(total);
        }

        match available.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                let to_consume = pos + 1;
                if total + to_consume > max_bytes {
                    reader.consume(to_consume);
                    return Err(oversized(buf, total + to_consume, max_bytes));
                }

                buf.extend_from_slice(&available[..to_consume]);
                total += to_consume;
                reader.consume(to_consume);
                return Ok(total);
            }
            None => {
                let len = available.len();
                if total + len > max_bytes {
                    reader.consume(len);
                    let rest = skip_line(reader).await?;
                    return Err(oversized(buf, total + len + rest, max_bytes));
                }

                buf.extend_from_slice(available);
                total += len;
                reader.consume(len);
            }
        }
    }
}

/// Drop the partial line from `buf` and report the skip.
fn oversized(buf: &mut Vec<u8>, skipped: usize, max_bytes: usize) -> FramingError {
    buf.clear();
    tracing::debug!(skipped, max_bytes, "oversized input line discarded");
    FramingError::MessageTooLarge { max_bytes }
}

/// Consume bytes up to and including the next newline, or to EOF.
///
/// Returns how many bytes were consumed.
async fn skip_line<R: tokio::io::AsyncBufRead + Unpin>(
    reader: &mut R,
) -> Result<usize, FramingError> {
    use tokio::io::AsyncBufReadExt;

    let mut skipped = 0usize;
    loop {
        let chunk = reader.fill_buf().await?;
        if chunk.is_empty() {
            return Ok(skipped);
        }
        match chunk.iter().position(|&b| b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(skipped + pos + 1);
            }
            None => {
                let len = chunk.len();
                reader.consume(len);
                skipped += len;
            }
        }
    }
}
