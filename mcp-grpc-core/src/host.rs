//! Host-engine message model.
//!
//! A [`HostMessage`] is what the protocol engine on either end of the bridge
//! speaks: one JSON-RPC 2.0 text document, with payloads kept as raw JSON text
//! so the engine owns their parsing and validation.
//!
//! Documents are parsed field by field rather than through a typed struct so
//! that presence is observed exactly: `"result": null` is a present result,
//! while `"id": null` is an absent identifier.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_json::value::RawValue;

use crate::JSONRPC_VERSION;
use crate::classify::{ClassificationError, MessageKind, Presence, classify};
use crate::id::{Identifier, IdentifierError};

static ABSENT: Identifier = Identifier::Absent;

/// One JSON-RPC message in host-engine form.
#[derive(Debug, Clone)]
pub enum HostMessage {
    Request {
        id: Identifier,
        method: String,
        params: Option<Box<RawValue>>,
    },
    Notification {
        method: String,
        params: Option<Box<RawValue>>,
    },
    Response {
        id: Identifier,
        result: Box<RawValue>,
    },
    Error {
        id: Identifier,
        error: HostError,
    },
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Errors parsing or rendering a JSON-RPC text document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("malformed JSON-RPC document: {reason}")]
    Malformed { reason: String },

    #[error("missing required jsonrpc field")]
    MissingVersion,

    #[error("unsupported jsonrpc version: {version}")]
    UnsupportedVersion { version: String },

    #[error("invalid id: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("method must be a string")]
    InvalidMethod,

    #[error("invalid error object: {reason}")]
    InvalidError { reason: String },

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("failed to render document: {reason}")]
    Render { reason: String },
}

#[derive(Serialize)]
struct DocumentOut<'a> {
    jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a Identifier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<&'a RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a RawValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a HostError>,
}

impl HostMessage {
    /// The message kind this variant represents.
    pub fn kind(&self) -> MessageKind {
        match self {
            HostMessage::Request { .. } => MessageKind::Request,
            HostMessage::Notification { .. } => MessageKind::Notification,
            HostMessage::Response { .. } => MessageKind::Response,
            HostMessage::Error { .. } => MessageKind::ErrorResponse,
        }
    }

    /// The identifier, or [`Identifier::Absent`] for notifications.
    pub fn id(&self) -> &Identifier {
        match self {
            HostMessage::Request { id, .. }
            | HostMessage::Response { id, .. }
            | HostMessage::Error { id, .. } => id,
            HostMessage::Notification { .. } => &ABSENT,
        }
    }

    /// The method name for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            HostMessage::Request { method, .. } | HostMessage::Notification { method, .. } => {
                Some(method)
            }
            HostMessage::Response { .. } | HostMessage::Error { .. } => None,
        }
    }

    /// Render as one JSON-RPC 2.0 text document on a single line.
    ///
    /// Fields appear in the order `jsonrpc, id, method, params, result, error`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError::Render`] if serialization fails.
    pub fn to_document(&self) -> Result<String, DocumentError> {
        let mut out = DocumentOut {
            jsonrpc: JSONRPC_VERSION,
            id: None,
            method: None,
            params: None,
            result: None,
            error: None,
        };
        match self {
            HostMessage::Request { id, method, params } => {
                out.id = Some(id).filter(|id| id.is_present());
                out.method = Some(method.as_str());
                out.params = params.as_deref();
            }
            HostMessage::Notification { method, params } => {
                out.method = Some(method.as_str());
                out.params = params.as_deref();
            }
            HostMessage::Response { id, result } => {
                out.id = Some(id).filter(|id| id.is_present());
                out.result = Some(result.as_ref());
            }
            HostMessage::Error { id, error } => {
                out.id = Some(id).filter(|id| id.is_present());
                out.error = Some(error);
            }
        }
        serde_json::to_string(&out).map_err(|e| DocumentError::Render {
            reason: e.to_string(),
        })
    }

    /// Parse one JSON-RPC 2.0 text document.
    ///
    /// The `jsonrpc` member is required and must be `"2.0"`.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentError`] for malformed JSON, non-object documents, a
    /// missing or wrong version, an invalid id or method, or a field combination that
    /// [`classify`] rejects.
    pub fn from_document(text: &str) -> Result<Self, DocumentError> {
        let mut fields: BTreeMap<String, Box<RawValue>> =
            serde_json::from_str(text).map_err(|e| DocumentError::Malformed {
                reason: e.to_string(),
            })?;

        let raw_version = fields
            .remove("jsonrpc")
            .ok_or(DocumentError::MissingVersion)?;
        match parse_raw(&raw_version)? {
            Value::String(v) if v == JSONRPC_VERSION => {}
            Value::String(v) => return Err(DocumentError::UnsupportedVersion { version: v }),
            _ => {
                return Err(DocumentError::UnsupportedVersion {
                    version: raw_version.get().to_string(),
                });
            }
        }

        let id = match fields.remove("id") {
            Some(raw) => Identifier::from_json(Some(&parse_raw(&raw)?))?,
            None => Identifier::Absent,
        };
        let method = match fields.remove("method") {
            Some(raw) => match parse_raw(&raw)? {
                Value::String(s) => Some(s),
                _ => return Err(DocumentError::InvalidMethod),
            },
            None => None,
        };
        let params = fields.remove("params");
        let result = fields.remove("result");
        let error = match fields.remove("error") {
            Some(raw) => Some(serde_json::from_str::<HostError>(raw.get()).map_err(|e| {
                DocumentError::InvalidError {
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };

        let presence = Presence {
            id: id.is_present(),
            method: method.is_some(),
            result: result.is_some(),
            error: error.is_some(),
        };
        let message = match (classify(presence)?, method, result, error) {
            (MessageKind::Request, Some(method), _, _) => HostMessage::Request { id, method, params },
            (MessageKind::Notification, Some(method), _, _) => {
                HostMessage::Notification { method, params }
            }
            (MessageKind::Response, _, Some(result), _) => HostMessage::Response { id, result },
            (MessageKind::ErrorResponse, _, _, Some(error)) => HostMessage::Error { id, error },
            // classify() only returns a kind whose fields are present.
            _ => return Err(ClassificationError::InvalidCombination { presence }.into()),
        };
        Ok(message)
    }
}

fn parse_raw(raw: &RawValue) -> Result<Value, DocumentError> {
    serde_json::from_str(raw.get()).map_err(|e| DocumentError::Malformed {
        reason: e.to_string(),
    })
}
