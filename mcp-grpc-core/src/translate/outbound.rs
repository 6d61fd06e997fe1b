use crate::JSONRPC_VERSION;
use crate::classify::{Presence, classify};
use crate::host::HostMessage;
use crate::id::Identifier;
use crate::proto::{GenericJsonRpcMessage, JsonRpcError};
use crate::value::{json_to_value, raw_to_struct};

use super::TranslateError;

/// Translate a host message into a wire message.
///
/// `captured` is the identifier recorded when the corresponding request
/// arrived. Replies always carry it, whatever id the reply document itself
/// names; a mismatch is logged. Notifications never carry an identifier.
/// Error `data` is copied through.
///
/// # Errors
///
/// - [`TranslateError::Payload`] when params or result are not JSON objects.
/// - [`TranslateError::Classification`] when a request or reply would leave
///   without an identifier.
pub fn to_wire(
    message: &HostMessage,
    captured: &Identifier,
) -> Result<GenericJsonRpcMessage, TranslateError> {
    let own = message.id();
    if own.is_present() && own != captured {
        tracing::warn!(
            reply_id = %own,
            captured_id = %captured,
            "Reply id differs from request id, using request id"
        );
    }

    let mut wire = GenericJsonRpcMessage {
        jsonrpc: JSONRPC_VERSION.to_string(),
        ..Default::default()
    };
    match message {
        HostMessage::Request { method, params, .. } => {
            wire.typed_id = captured.to_wire();
            wire.method = method.clone();
            wire.params = params.as_deref().map(raw_to_struct).transpose()?;
        }
        HostMessage::Notification { method, params } => {
            wire.method = method.clone();
            wire.params = params.as_deref().map(raw_to_struct).transpose()?;
        }
        HostMessage::Response { result, .. } => {
            wire.typed_id = captured.to_wire();
            wire.result = Some(raw_to_struct(result)?);
        }
        HostMessage::Error { error, .. } => {
            wire.typed_id = captured.to_wire();
            wire.error = Some(JsonRpcError {
                code: error.code,
                message: error.message.clone(),
                data: error.data.as_ref().map(json_to_value),
            });
        }
    }

    // An empty method name reads as absent on the wire, and an absent
    // captured id drops the identifier; reject what the far side could not
    // classify.
    classify(Presence {
        id: wire.typed_id.is_some(),
        method: !wire.method.is_empty(),
        result: wire.result.is_some(),
        error: wire.error.is_some(),
    })?;
    Ok(wire)
}
