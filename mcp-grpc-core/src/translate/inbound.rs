use crate::JSONRPC_VERSION;
use crate::classify::{ClassificationError, MessageKind, Presence, classify};
use crate::engine::IdSupport;
use crate::host::{HostError, HostMessage};
use crate::id::Identifier;
use crate::proto::GenericJsonRpcMessage;
use crate::value::{struct_to_raw, value_to_json};

use super::{Inbound, TranslateError};

/// Translate a wire message into the host engine's message model.
///
/// An empty protocol-version string is read as `"2.0"`. Notification params
/// are carried through. Only identifiers the engine declares support for are
/// forwarded; a string id bound for an integer-only engine is rejected.
///
/// # Errors
///
/// - [`TranslateError::Classification`] for an `Id` with no kind or an invalid
///   field combination.
/// - [`TranslateError::UnsupportedIdentifierKind`] when `support` rejects the
///   identifier.
/// - [`TranslateError::Payload`] when a bag holds a non-finite number.
pub fn to_host(wire: GenericJsonRpcMessage, support: IdSupport) -> Result<Inbound, TranslateError> {
    let id = Identifier::from_wire(wire.typed_id.as_ref())?;
    let presence = Presence {
        id: id.is_present(),
        method: !wire.method.is_empty(),
        result: wire.result.is_some(),
        error: wire.error.is_some(),
    };
    let kind = classify(presence)?;

    if !support.accepts(&id) {
        return Err(TranslateError::UnsupportedIdentifierKind { id });
    }
    if !wire.jsonrpc.is_empty() && wire.jsonrpc != JSONRPC_VERSION {
        tracing::warn!(
            version = %wire.jsonrpc,
            "Unexpected jsonrpc version on wire message, treating as 2.0"
        );
    }

    let params = wire.params.as_ref().map(struct_to_raw).transpose()?;
    let message = match (kind, wire.result, wire.error) {
        (MessageKind::Request, _, _) => HostMessage::Request {
            id: id.clone(),
            method: wire.method,
            params,
        },
        (MessageKind::Notification, _, _) => HostMessage::Notification {
            method: wire.method,
            params,
        },
        (MessageKind::Response, Some(result), _) => HostMessage::Response {
            id: id.clone(),
            result: struct_to_raw(&result)?,
        },
        (MessageKind::ErrorResponse, _, Some(error)) => HostMessage::Error {
            id: id.clone(),
            error: HostError {
                code: error.code,
                message: error.message,
                data: error.data.as_ref().map(value_to_json).transpose()?,
            },
        },
        // classify() guarantees the field for its kind is present.
        _ => return Err(ClassificationError::InvalidCombination { presence }.into()),
    };

    Ok(Inbound { kind, id, message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{Id, JsonRpcError, id::Kind};
    use crate::value::{json_to_struct, json_to_value};
    use serde_json::{Value, json};

    fn num_id(n: i64) -> Option<Id> {
        Some(Id {
            kind: Some(Kind::Num(n)),
        })
    }

    fn str_id(s: &str) -> Option<Id> {
        Some(Id {
            kind: Some(Kind::Str(s.to_string())),
        })
    }

    fn bag(v: Value) -> Option<prost_types::Struct> {
        Some(json_to_struct(&v).unwrap())
    }

    fn parse(raw: &serde_json::value::RawValue) -> Value {
        serde_json::from_str(raw.get()).unwrap()
    }

    #[test]
    fn test_request_translation() {
        let wire = GenericJsonRpcMessage {
            jsonrpc: "2.0".into(),
            typed_id: num_id(42),
            method: "hello_world".into(),
            params: bag(json!({"name": "Bob"})),
            ..Default::default()
        };
        let inbound = to_host(wire, IdSupport::Any).unwrap();
        assert_eq!(inbound.kind, MessageKind::Request);
        assert_eq!(inbound.id, Identifier::Number(42));
        match inbound.message {
            HostMessage::Request { id, method, params } => {
                assert_eq!(id, Identifier::Number(42));
                assert_eq!(method, "hello_world");
                assert_eq!(parse(&params.unwrap()), json!({"name": "Bob"}));
            }
            other => panic!("expected request, got {other:?}"),
        }
    }

    #[test]
    fn test_notification_params_carried() {
        let wire = GenericJsonRpcMessage {
            method: "notifications/initialized".into(),
            params: bag(json!({"x": 1})),
            ..Default::default()
        };
        let inbound = to_host(wire, IdSupport::Any).unwrap();
        assert_eq!(inbound.kind, MessageKind::Notification);
        match inbound.message {
            HostMessage::Notification { params, .. } => {
                assert_eq!(parse(&params.unwrap()), json!({"x": 1}));
            }
            other => panic!("expected notification, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_version_normalised() {
        let wire = GenericJsonRpcMessage {
            typed_id: num_id(1),
            method: "ping".into(),
            ..Default::default()
        };
        let inbound = to_host(wire, IdSupport::Any).unwrap();
        let doc = inbound.message.to_document().unwrap();
        assert!(doc.starts_with(r#"{"jsonrpc":"2.0""#));
    }

    #[test]
    fn test_id_without_anything_fails() {
        let wire = GenericJsonRpcMessage {
            typed_id: num_id(1),
            ..Default::default()
        };
        let err = to_host(wire, IdSupport::Any).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::Classification(ClassificationError::InvalidCombination { .. })
        ));
    }

    #[test]
    fn test_id_without_kind_fails() {
        let wire = GenericJsonRpcMessage {
            typed_id: Some(Id { kind: None }),
            method: "ping".into(),
            ..Default::default()
        };
        let err = to_host(wire, IdSupport::Any).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::Classification(ClassificationError::UnrecognizedIdKind)
        ));
    }

    #[test]
    fn test_number_only_engine_rejects_string_id() {
        let wire = GenericJsonRpcMessage {
            typed_id: str_id("abc"),
            method: "ping".into(),
            ..Default::default()
        };
        let err = to_host(wire, IdSupport::NumberOnly).unwrap_err();
        assert!(matches!(
            err,
            TranslateError::UnsupportedIdentifierKind { id: Identifier::String(ref s) } if s == "abc"
        ));
    }

    #[test]
    fn test_number_only_engine_accepts_number_id() {
        let wire = GenericJsonRpcMessage {
            typed_id: num_id(9),
            method: "ping".into(),
            ..Default::default()
        };
        assert!(to_host(wire, IdSupport::NumberOnly).is_ok());
    }

    #[test]
    fn test_response_translation() {
        let wire = GenericJsonRpcMessage {
            typed_id: str_id("abc"),
            result: bag(json!({"ok": true})),
            ..Default::default()
        };
        let inbound = to_host(wire, IdSupport::Any).unwrap();
        assert_eq!(inbound.kind, MessageKind::Response);
        assert_eq!(
            inbound.message.to_document().unwrap(),
            r#"{"jsonrpc":"2.0","id":"abc","result":{"ok":true}}"#
        );
    }

    #[test]
    fn test_error_translation_keeps_data() {
        let wire = GenericJsonRpcMessage {
            typed_id: num_id(3),
            error: Some(JsonRpcError {
                code: -32601,
                message: "Method not found".into(),
                data: Some(json_to_value(&json!({"method": "nope"}))),
            }),
            ..Default::default()
        };
        let inbound = to_host(wire, IdSupport::Any).unwrap();
        match inbound.message {
            HostMessage::Error { error, .. } => {
                assert_eq!(error.code, -32601);
                assert_eq!(error.data, Some(json!({"method": "nope"})));
            }
            other => panic!("expected error, got {other:?}"),
        }
    }
}
