//! Wire ⇄ host message translation.
//!
//! - [`to_host`] (inbound): wire message → [`HostMessage`], decoding the
//!   identifier, classifying, and re-serializing the structured bags as raw
//!   JSON text.
//! - [`to_wire`] (outbound): [`HostMessage`] → wire message, attaching the
//!   identifier captured when the request arrived.

mod inbound;
mod outbound;

pub use inbound::to_host;
pub use outbound::to_wire;

use crate::classify::{ClassificationError, MessageKind};
use crate::host::HostMessage;
use crate::id::Identifier;
use crate::value::PayloadError;

/// Result of inbound translation.
#[derive(Debug, Clone)]
pub struct Inbound {
    pub kind: MessageKind,
    /// Identifier as decoded from the wire; the reply must carry this exact
    /// value.
    pub id: Identifier,
    pub message: HostMessage,
}

/// Errors translating between wire and host forms.
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error(transparent)]
    Classification(#[from] ClassificationError),

    /// The target engine cannot represent this identifier kind.
    #[error("identifier {id} is not supported by the host engine")]
    UnsupportedIdentifierKind { id: Identifier },

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

impl TranslateError {
    /// True when the failure concerns only the offending message, so a
    /// session configured to skip bad messages can keep running. Payload
    /// conversion failures are never message-local.
    pub fn is_message_local(&self) -> bool {
        match self {
            TranslateError::Classification(_) | TranslateError::UnsupportedIdentifierKind { .. } => {
                true
            }
            TranslateError::Payload(_) => false,
        }
    }
}
