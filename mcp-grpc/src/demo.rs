//! Demo host engine: a minimal MCP tool server with one `hello_world` tool.
//!
//! Answers `initialize`, `ping`, `tools/list` and `tools/call`. Unknown
//! methods get `-32601`, unknown tools and bad `tools/call` params `-32602`.
//! Notifications and responses from the client are accepted silently.
//!
//! When a `tools/call` carries `params._meta.progressToken`, a
//! `notifications/progress` is pushed on the same stream before the result.

use async_trait::async_trait;
use mcp_grpc_core::{
    ConnectionContext, EngineError, HostEngine, HostError, HostMessage, IdSupport,
};
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::{Map, Value, json};

/// MCP protocol revision advertised in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const SERVER_NAME: &str = "mcp-grpc-demo";

/// JSON-RPC "Method not found".
pub const METHOD_NOT_FOUND: i32 = -32601;

/// JSON-RPC "Invalid params".
pub const INVALID_PARAMS: i32 = -32602;

const HELLO_TOOL: &str = "hello_world";

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
    #[serde(default, rename = "_meta")]
    meta: Option<CallMeta>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallMeta {
    progress_token: Option<Value>,
}

/// The demo tool server.
#[derive(Debug, Clone, Default)]
pub struct DemoEngine {
    id_support: IdSupport,
}

impl DemoEngine {
    pub fn new(id_support: IdSupport) -> Self {
        Self { id_support }
    }

    async fn dispatch(
        &self,
        ctx: &ConnectionContext,
        method: &str,
        params: Option<&RawValue>,
    ) -> Result<Result<Value, HostError>, EngineError> {
        let outcome = match method {
            "initialize" => Ok(json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": { "tools": { "listChanged": false } },
                "serverInfo": {
                    "name": SERVER_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                },
            })),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": [hello_tool_definition()] })),
            "tools/call" => self.call_tool(ctx, params).await?,
            other => Err(HostError {
                code: METHOD_NOT_FOUND,
                message: "Method not found".to_string(),
                data: Some(json!({ "method": other })),
            }),
        };
        Ok(outcome)
    }

    async fn call_tool(
        &self,
        ctx: &ConnectionContext,
        params: Option<&RawValue>,
    ) -> Result<Result<Value, HostError>, EngineError> {
        let raw = params.map_or("{}", RawValue::get);
        let call: CallToolParams = match serde_json::from_str(raw) {
            Ok(c) => c,
            Err(e) => {
                return Ok(Err(HostError {
                    code: INVALID_PARAMS,
                    message: format!("Invalid params: {e}"),
                    data: None,
                }));
            }
        };

        if call.name != HELLO_TOOL {
            return Ok(Err(HostError {
                code: INVALID_PARAMS,
                message: format!("Unknown tool: {}", call.name),
                data: Some(json!({ "tool": call.name })),
            }));
        }

        if let Some(token) = call.meta.and_then(|m| m.progress_token) {
            let progress = json!({ "progressToken": token, "progress": 1, "total": 1 });
            let params = serde_json::value::to_raw_value(&progress).map_err(|e| {
                EngineError::Failed {
                    reason: e.to_string(),
                }
            })?;
            ctx.notifier()
                .notify("notifications/progress", Some(params))
                .await?;
        }

        let result = match call.arguments.get("name").and_then(Value::as_str) {
            Some(name) => tool_text(&format!("Hello, {name}!"), false),
            None => tool_text("required argument \"name\" not found", true),
        };
        Ok(Ok(result))
    }
}

fn hello_tool_definition() -> Value {
    json!({
        "name": HELLO_TOOL,
        "description": "Say hello to someone",
        "inputSchema": {
            "type": "object",
            "properties": {
                "name": {
                    "type": "string",
                    "description": "Name of the person to greet",
                },
            },
            "required": ["name"],
        },
    })
}

fn tool_text(text: &str, is_error: bool) -> Value {
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": is_error,
    })
}

#[async_trait]
impl HostEngine for DemoEngine {
    fn id_support(&self) -> IdSupport {
        self.id_support
    }

    async fn handle(
        &self,
        ctx: &ConnectionContext,
        document: &str,
    ) -> Result<Option<String>, EngineError> {
        let message = HostMessage::from_document(document).map_err(|e| EngineError::Failed {
            reason: e.to_string(),
        })?;

        let (id, method, params) = match message {
            HostMessage::Request { id, method, params } => (id, method, params),
            HostMessage::Notification { method, .. } => {
                tracing::debug!(session_id = %ctx.session_id(), %method, "notification received");
                return Ok(None);
            }
            HostMessage::Response { id, .. } | HostMessage::Error { id, .. } => {
                tracing::debug!(session_id = %ctx.session_id(), %id, "client reply ignored");
                return Ok(None);
            }
        };

        let reply = match self.dispatch(ctx, &method, params.as_deref()).await? {
            Ok(result) => HostMessage::Response {
                id,
                result: serde_json::value::to_raw_value(&result).map_err(|e| {
                    EngineError::Failed {
                        reason: e.to_string(),
                    }
                })?,
            },
            Err(error) => HostMessage::Error { id, error },
        };

        reply.to_document().map(Some).map_err(|e| EngineError::Failed {
            reason: e.to_string(),
        })
    }
}
