//! Identifier codec: the JSON-RPC call identifier in its wire and text forms.
//!
//! The identifier is a tagged union of *absent*, *string* and *integer*.
//! Presence distinguishes messages that take part in a call (request,
//! response, error) from fire-and-forget notifications.
//!
//! # Type preservation
//!
//! Never coerce between kinds. A request carrying `"id": 1` is answered with
//! `"id": 1`, not `"id": "1"` and not `"id": 1.0`. The wire form keeps the kind
//! in the `Id.kind` oneof; the text form keeps it in the JSON value type.
//!
//! # Numeric coercion policy
//!
//! JSON has a single number type, so a text identifier such as `1.9` or
//! `1e300` has to be mapped onto `i64`. [`Identifier::from_json`] truncates
//! toward zero and saturates at `i64::MIN` / `i64::MAX`:
//!
//! | text id | decoded |
//! |---|---|
//! | `7` | `Number(7)` |
//! | `1.9` | `Number(1)` |
//! | `-1.9` | `Number(-1)` |
//! | `1e300` | `Number(i64::MAX)` |
//! | `18446744073709551615` | `Number(i64::MAX)` |

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::classify::ClassificationError;
use crate::proto;

/// A JSON-RPC call identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Identifier {
    /// No identifier: the message is a notification.
    #[default]
    Absent,
    /// String identifier (e.g. `"id": "abc-123"`).
    String(String),
    /// Integer identifier (e.g. `"id": 1`).
    Number(i64),
}

/// Errors decoding an identifier from its JSON text form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    /// The `id` value is a boolean, array or object.
    #[error("unsupported id type: {found}")]
    UnsupportedType {
        /// JSON type name of the offending value.
        found: &'static str,
    },
}

impl Identifier {
    /// Returns true unless this is [`Identifier::Absent`].
    pub fn is_present(&self) -> bool {
        !matches!(self, Identifier::Absent)
    }

    /// Returns true for [`Identifier::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Identifier::Absent)
    }

    /// Decode the identifier field of a wire message.
    ///
    /// A missing `Id` submessage decodes to [`Identifier::Absent`]. An `Id`
    /// whose `kind` oneof is unset cannot be interpreted and is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`ClassificationError::UnrecognizedIdKind`] when the `Id`
    /// submessage is present but carries no kind.
    pub fn from_wire(id: Option<&proto::Id>) -> Result<Self, ClassificationError> {
        let Some(id) = id else {
            return Ok(Identifier::Absent);
        };
        match &id.kind {
            Some(proto::id::Kind::Str(s)) => Ok(Identifier::String(s.clone())),
            Some(proto::id::Kind::Num(n)) => Ok(Identifier::Number(*n)),
            None => Err(ClassificationError::UnrecognizedIdKind),
        }
    }

    /// Encode into the wire form. [`Identifier::Absent`] encodes as no `Id`.
    pub fn to_wire(&self) -> Option<proto::Id> {
        let kind = match self {
            Identifier::Absent => return None,
            Identifier::String(s) => proto::id::Kind::Str(s.clone()),
            Identifier::Number(n) => proto::id::Kind::Num(*n),
        };
        Some(proto::Id { kind: Some(kind) })
    }

    /// Decode the `id` member of a JSON-RPC text message.
    ///
    /// A missing member and an explicit `null` both decode to
    /// [`Identifier::Absent`]. Numbers follow the module-level coercion
    /// policy: truncate toward zero, saturate at the `i64` bounds.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::UnsupportedType`] for booleans, arrays and
    /// objects.
    pub fn from_json(value: Option<&Value>) -> Result<Self, IdentifierError> {
        match value {
            None | Some(Value::Null) => Ok(Identifier::Absent),
            Some(Value::String(s)) => Ok(Identifier::String(s.clone())),
            Some(Value::Number(n)) => Ok(Identifier::Number(number_to_i64(n))),
            Some(Value::Bool(_)) => Err(IdentifierError::UnsupportedType { found: "boolean" }),
            Some(Value::Array(_)) => Err(IdentifierError::UnsupportedType { found: "array" }),
            Some(Value::Object(_)) => Err(IdentifierError::UnsupportedType { found: "object" }),
        }
    }

    /// Encode as a JSON value, or `None` when absent.
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Identifier::Absent => None,
            Identifier::String(s) => Some(Value::String(s.clone())),
            Identifier::Number(n) => Some(Value::from(*n)),
        }
    }
}

/// Coerce a JSON number to `i64`: exact when it fits, otherwise truncated
/// toward zero with saturation (`f64 as i64` saturates by definition).
fn number_to_i64(n: &serde_json::Number) -> i64 {
    if let Some(i) = n.as_i64() {
        return i;
    }
    if n.as_u64().is_some() {
        // Only reachable for u64 values above i64::MAX.
        return i64::MAX;
    }
    n.as_f64().map_or(0, |f| f.trunc() as i64)
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Identifier::Number(n) => serializer.serialize_i64(*n),
            Identifier::String(s) => serializer.serialize_str(s),
            Identifier::Absent => serializer.serialize_none(),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Number(n)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::String(s.to_owned())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::String(s)
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Absent => f.write_str("<absent>"),
            Identifier::String(s) => write!(f, "{s:?}"),
            Identifier::Number(n) => write!(f, "{n}"),
        }
    }
}
