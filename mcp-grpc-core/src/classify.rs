//! Message-kind classification from field presence.
//!
//! Pure function of four booleans: identifier present, method present, result
//! present, error present. Exactly four of the sixteen combinations are valid:
//!
//! | id | method | result | error | kind |
//! |---|---|---|---|---|
//! | yes | yes | no | no | `Request` |
//! | yes | no | yes | no | `Response` |
//! | yes | no | no | yes | `ErrorResponse` |
//! | no | yes | no | no | `Notification` |
//!
//! Everything else is rejected. The classifier never guesses. It is shared by
//! the wire side (inbound translation) and the text side (host reply
//! documents), so both directions agree on what a well-formed message is.

use std::fmt;

/// Which of the four discriminating fields a message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Presence {
    pub id: bool,
    pub method: bool,
    pub result: bool,
    pub error: bool,
}

impl Presence {
    /// All sixteen presence combinations, in a fixed order.
    pub fn all() -> impl Iterator<Item = Presence> {
        (0u8..16).map(|bits| Presence {
            id: bits & 0b1000 != 0,
            method: bits & 0b0100 != 0,
            result: bits & 0b0010 != 0,
            error: bits & 0b0001 != 0,
        })
    }
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (set, name) in [
            (self.id, "id"),
            (self.method, "method"),
            (self.result, "result"),
            (self.error, "error"),
        ] {
            if set {
                if !first {
                    f.write_str("+")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        if first {
            f.write_str("<none>")?;
        }
        Ok(())
    }
}

/// The four JSON-RPC message kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// `id` + `method`: a call expecting exactly one reply.
    Request,
    /// `method` without `id`: fire-and-forget.
    Notification,
    /// `id` + `result`: successful reply.
    Response,
    /// `id` + `error`: failed reply.
    ErrorResponse,
}

impl MessageKind {
    /// True for the only kind that expects a reply.
    pub fn expects_reply(self) -> bool {
        matches!(self, MessageKind::Request)
    }

    /// Short lowercase name used in log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            MessageKind::Request => "request",
            MessageKind::Notification => "notification",
            MessageKind::Response => "response",
            MessageKind::ErrorResponse => "error_response",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message that cannot be interpreted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassificationError {
    /// The presence combination matches none of the four kinds.
    #[error("invalid field combination: {presence}")]
    InvalidCombination { presence: Presence },

    /// A wire `Id` was present with no kind set.
    #[error("unrecognized identifier kind")]
    UnrecognizedIdKind,
}

/// Classify a message from field presence.
///
/// # Errors
///
/// Returns [`ClassificationError::InvalidCombination`] for any of the twelve
/// combinations outside the table in the module docs.
pub fn classify(presence: Presence) -> Result<MessageKind, ClassificationError> {
    let Presence {
        id,
        method,
        result,
        error,
    } = presence;
    match (id, method, result, error) {
        (true, true, false, false) => Ok(MessageKind::Request),
        (true, false, true, false) => Ok(MessageKind::Response),
        (true, false, false, true) => Ok(MessageKind::ErrorResponse),
        (false, true, false, false) => Ok(MessageKind::Notification),
        _ => Err(ClassificationError::InvalidCombination { presence }),
    }
}
