//! Structured-value codec: JSON text ⇄ `google.protobuf.Struct`.
//!
//! The bag is order-irrelevant and carries every number as an IEEE-754 double.
//! Conversion is therefore faithful except for numbers:
//!
//! - A double that is integral and within ±2^53 is rendered back as a JSON
//!   integer, so `{"n": 3}` survives the round trip as `{"n": 3}` and not as
//!   `{"n": 3.0}`.
//! - An integer whose magnitude exceeds 2^53 cannot be held exactly. It is
//!   stored as the nearest double and a WARN event is emitted when it enters
//!   the bag.
//! - Non-finite doubles (possible on the wire, impossible in JSON) fail the
//!   conversion.

use prost_types::value::Kind;
use prost_types::{ListValue, Struct, Value as ProtoValue};
use serde_json::value::RawValue;
use serde_json::{Map, Number, Value};

/// Largest magnitude at which every integer is exactly representable as f64.
pub const MAX_EXACT_INTEGER: u64 = 1 << 53;

/// Errors converting a payload between its text and bag forms.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    /// The payload text is not valid JSON.
    #[error("payload is not valid JSON: {reason}")]
    InvalidJson { reason: String },

    /// The payload is valid JSON but not an object, so it has no bag form.
    #[error("payload must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// The bag holds NaN or an infinity, which JSON cannot represent.
    #[error("non-finite number in structured value")]
    NonFiniteNumber,

    /// Serializing the converted value failed.
    #[error("failed to serialize payload: {reason}")]
    Serialize { reason: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// JSON → bag
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a JSON object into a `Struct`.
///
/// # Errors
///
/// Returns [`PayloadError::NotAnObject`] if `value` is not an object.
pub fn json_to_struct(value: &Value) -> Result<Struct, PayloadError> {
    match value {
        Value::Object(map) => Ok(map_to_struct(map)),
        other => Err(PayloadError::NotAnObject {
            found: json_type_name(other),
        }),
    }
}

/// Parse raw JSON text and convert it into a `Struct`.
///
/// # Errors
///
/// Returns [`PayloadError::InvalidJson`] for unparseable text and
/// [`PayloadError::NotAnObject`] for anything but an object.
pub fn raw_to_struct(raw: &RawValue) -> Result<Struct, PayloadError> {
    let value: Value = serde_json::from_str(raw.get()).map_err(|e| PayloadError::InvalidJson {
        reason: e.to_string(),
    })?;
    json_to_struct(&value)
}

/// Convert any JSON value into a `google.protobuf.Value`.
pub fn json_to_value(value: &Value) -> ProtoValue {
    let kind = match value {
        Value::Null => Kind::NullValue(0),
        Value::Bool(b) => Kind::BoolValue(*b),
        Value::Number(n) => Kind::NumberValue(number_to_f64(n)),
        Value::String(s) => Kind::StringValue(s.clone()),
        Value::Array(items) => Kind::ListValue(ListValue {
            values: items.iter().map(json_to_value).collect(),
        }),
        Value::Object(map) => Kind::StructValue(map_to_struct(map)),
    };
    ProtoValue { kind: Some(kind) }
}

fn map_to_struct(map: &Map<String, Value>) -> Struct {
    Struct {
        fields: map
            .iter()
            .map(|(k, v)| (k.clone(), json_to_value(v)))
            .collect(),
    }
}

fn number_to_f64(n: &Number) -> f64 {
    let exceeds = match (n.as_i64(), n.as_u64()) {
        (Some(i), _) => i.unsigned_abs() > MAX_EXACT_INTEGER,
        (None, Some(u)) => u > MAX_EXACT_INTEGER,
        (None, None) => false,
    };
    if exceeds {
        tracing::warn!(
            value = %n,
            "Integer exceeds 2^53 and loses precision in structured value"
        );
    }
    n.as_f64().unwrap_or_default()
}

// ─────────────────────────────────────────────────────────────────────────────
// bag → JSON
// ─────────────────────────────────────────────────────────────────────────────

/// Convert a `Struct` into a JSON object.
///
/// # Errors
///
/// Returns [`PayloadError::NonFiniteNumber`] if any nested number is NaN or
/// infinite.
pub fn struct_to_json(bag: &Struct) -> Result<Value, PayloadError> {
    let mut map = Map::with_capacity(bag.fields.len());
    for (key, value) in &bag.fields {
        map.insert(key.clone(), value_to_json(value)?);
    }
    Ok(Value::Object(map))
}

/// Convert a `Struct` into raw JSON text for a host engine.
///
/// # Errors
///
/// See [`struct_to_json`].
pub fn struct_to_raw(bag: &Struct) -> Result<Box<RawValue>, PayloadError> {
    let json = struct_to_json(bag)?;
    serde_json::value::to_raw_value(&json).map_err(|e| PayloadError::Serialize {
        reason: e.to_string(),
    })
}

/// Convert a `google.protobuf.Value` into JSON. An unset kind maps to `null`.
///
/// # Errors
///
/// Returns [`PayloadError::NonFiniteNumber`] for NaN or infinities.
pub fn value_to_json(value: &ProtoValue) -> Result<Value, PayloadError> {
    match &value.kind {
        None | Some(Kind::NullValue(_)) => Ok(Value::Null),
        Some(Kind::BoolValue(b)) => Ok(Value::Bool(*b)),
        Some(Kind::NumberValue(f)) => f64_to_json(*f),
        Some(Kind::StringValue(s)) => Ok(Value::String(s.clone())),
        Some(Kind::ListValue(list)) => list
            .values
            .iter()
            .map(value_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Some(Kind::StructValue(bag)) => struct_to_json(bag),
    }
}

fn f64_to_json(f: f64) -> Result<Value, PayloadError> {
    if !f.is_finite() {
        return Err(PayloadError::NonFiniteNumber);
    }
    if f.fract() == 0.0 && f.abs() <= MAX_EXACT_INTEGER as f64 {
        return Ok(Value::from(f as i64));
    }
    Number::from_f64(f)
        .map(Value::Number)
        .ok_or(PayloadError::NonFiniteNumber)
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
