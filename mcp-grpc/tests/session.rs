//! In-memory stream session tests.
//!
//! Drives `StreamSession::run` with a channel-backed inbound stream and reads
//! the reply channel directly; no network involved.

use std::sync::Arc;

use async_trait::async_trait;
use mcp_grpc::demo::DemoEngine;
use mcp_grpc::error::SessionError;
use mcp_grpc::server::{InboundStream, StreamSession};
use mcp_grpc_core::config::InvalidMessagePolicy;
use mcp_grpc_core::engine::ReplyItem;
use mcp_grpc_core::proto::id::Kind;
use mcp_grpc_core::proto::{GenericJsonRpcMessage, Id};
use mcp_grpc_core::value::{json_to_struct, struct_to_json, value_to_json};
use mcp_grpc_core::{
    ClassificationError, ConnectionContext, EngineError, HostEngine, IdSupport, TranslateError,
};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

// ─────────────────────────────────────────────────────────────────────────────
// Test Harness
// ─────────────────────────────────────────────────────────────────────────────

/// Engine that answers every document with the same canned reply.
struct FixedReplyEngine {
    reply: Option<String>,
}

#[async_trait]
impl HostEngine for FixedReplyEngine {
    fn id_support(&self) -> IdSupport {
        IdSupport::Any
    }

    async fn handle(
        &self,
        _ctx: &ConnectionContext,
        _document: &str,
    ) -> Result<Option<String>, EngineError> {
        Ok(self.reply.clone())
    }
}

struct Harness {
    inbound: mpsc::Sender<Result<GenericJsonRpcMessage, tonic::Status>>,
    replies: mpsc::Receiver<ReplyItem>,
    task: JoinHandle<Result<(), SessionError>>,
}

fn start<E: HostEngine>(engine: E, policy: InvalidMessagePolicy) -> Harness {
    let (in_tx, in_rx) = mpsc::channel(8);
    let (out_tx, out_rx) = mpsc::channel(8);
    let session = StreamSession::new(
        Arc::new(engine),
        mcp_grpc_core::ReplySender::new(out_tx),
        None,
        policy,
    );
    let inbound: InboundStream = Box::pin(ReceiverStream::new(in_rx));
    let task = tokio::spawn(session.run(inbound));
    Harness {
        inbound: in_tx,
        replies: out_rx,
        task,
    }
}

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

fn request(id: Option<Id>, method: &str, params: Value) -> GenericJsonRpcMessage {
    GenericJsonRpcMessage {
        jsonrpc: "2.0".into(),
        typed_id: id,
        method: method.into(),
        params: Some(json_to_struct(&params).unwrap()),
        ..Default::default()
    }
}

fn notification(method: &str) -> GenericJsonRpcMessage {
    GenericJsonRpcMessage {
        jsonrpc: "2.0".into(),
        method: method.into(),
        ..Default::default()
    }
}

fn hello(id: Option<Id>, name: &str) -> GenericJsonRpcMessage {
    request(
        id,
        "tools/call",
        json!({"name": "hello_world", "arguments": {"name": name}}),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Request / Reply
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_request_reply_keeps_integer_id() {
    let mut h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);

    h.inbound.send(Ok(hello(num_id(42), "Bob"))).await.unwrap();
    let reply = h.replies.recv().await.unwrap().unwrap();

    assert_eq!(reply.jsonrpc, "2.0");
    assert_eq!(reply.typed_id.unwrap().kind, Some(Kind::Num(42)));
    let result = struct_to_json(&reply.result.unwrap()).unwrap();
    assert_eq!(result["content"][0]["text"], json!("Hello, Bob!"));

    drop(h.inbound);
    h.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_request_reply_keeps_string_id() {
    let mut h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);

    h.inbound
        .send(Ok(request(str_id("abc"), "ping", json!({}))))
        .await
        .unwrap();
    let reply = h.replies.recv().await.unwrap().unwrap();
    assert_eq!(reply.typed_id.unwrap().kind, Some(Kind::Str("abc".into())));
    assert!(reply.result.is_some());
}

#[tokio::test]
async fn test_notification_yields_nothing_and_session_resumes() {
    let mut h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);

    h.inbound
        .send(Ok(notification("notifications/initialized")))
        .await
        .unwrap();
    h.inbound.send(Ok(hello(num_id(2), "Ann"))).await.unwrap();

    // The first thing on the reply channel is the answer to the request.
    let reply = h.replies.recv().await.unwrap().unwrap();
    assert_eq!(reply.typed_id.unwrap().kind, Some(Kind::Num(2)));

    drop(h.inbound);
    h.task.await.unwrap().unwrap();
    assert!(h.replies.recv().await.is_none());
}

#[tokio::test]
async fn test_error_reply_keeps_data() {
    let mut h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);

    h.inbound
        .send(Ok(request(num_id(5), "tools/call", json!({"name": "nope"}))))
        .await
        .unwrap();
    let reply = h.replies.recv().await.unwrap().unwrap();
    let error = reply.error.unwrap();

    assert_eq!(error.code, -32602);
    assert_eq!(
        value_to_json(&error.data.unwrap()).unwrap(),
        json!({"tool": "nope"})
    );
}

#[tokio::test]
async fn test_reply_to_notification_is_dropped() {
    let engine = FixedReplyEngine {
        reply: Some(r#"{"jsonrpc":"2.0","id":1,"result":{}}"#.to_string()),
    };
    let mut h = start(engine, InvalidMessagePolicy::Terminate);

    h.inbound.send(Ok(notification("x"))).await.unwrap();
    drop(h.inbound);

    h.task.await.unwrap().unwrap();
    assert!(h.replies.recv().await.is_none());
}

#[tokio::test]
async fn test_reply_id_mismatch_uses_request_id() {
    let engine = FixedReplyEngine {
        reply: Some(r#"{"jsonrpc":"2.0","id":"other","result":{}}"#.to_string()),
    };
    let mut h = start(engine, InvalidMessagePolicy::Terminate);

    h.inbound
        .send(Ok(request(num_id(9), "ping", json!({}))))
        .await
        .unwrap();
    let reply = h.replies.recv().await.unwrap().unwrap();
    assert_eq!(reply.typed_id.unwrap().kind, Some(Kind::Num(9)));
}

#[tokio::test]
async fn test_non_reply_document_is_fatal() {
    let engine = FixedReplyEngine {
        reply: Some(r#"{"jsonrpc":"2.0","method":"oops"}"#.to_string()),
    };
    let h = start(engine, InvalidMessagePolicy::Terminate);

    h.inbound
        .send(Ok(request(num_id(1), "ping", json!({}))))
        .await
        .unwrap();
    let err = h.task.await.unwrap().unwrap_err();
    assert!(matches!(err, SessionError::UnexpectedReply { .. }));
}

// ─────────────────────────────────────────────────────────────────────────────
// Stream End & Errors
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_end_of_stream_is_clean() {
    let h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);
    drop(h.inbound);
    assert!(h.task.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_transport_error_is_fatal() {
    let h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);
    h.inbound
        .send(Err(tonic::Status::unavailable("connection reset")))
        .await
        .unwrap();

    let err = h.task.await.unwrap().unwrap_err();
    assert!(matches!(err, SessionError::Transport { .. }));
}

#[tokio::test]
async fn test_id_without_method_terminates_by_default() {
    let h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);
    let bad = GenericJsonRpcMessage {
        typed_id: num_id(1),
        ..Default::default()
    };
    h.inbound.send(Ok(bad)).await.unwrap();

    let err = h.task.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Translate(TranslateError::Classification(
            ClassificationError::InvalidCombination { .. }
        ))
    ));
}

#[tokio::test]
async fn test_skip_policy_keeps_session_alive() {
    let mut h = start(DemoEngine::default(), InvalidMessagePolicy::Skip);
    let bad = GenericJsonRpcMessage {
        typed_id: num_id(1),
        ..Default::default()
    };
    h.inbound.send(Ok(bad)).await.unwrap();
    h.inbound.send(Ok(hello(num_id(3), "Cy"))).await.unwrap();

    let reply = h.replies.recv().await.unwrap().unwrap();
    assert_eq!(reply.typed_id.unwrap().kind, Some(Kind::Num(3)));

    drop(h.inbound);
    h.task.await.unwrap().unwrap();
}

fn kindless_id() -> Option<Id> {
    Some(Id { kind: None })
}

#[tokio::test]
async fn test_unrecognized_id_kind_is_dropped_under_terminate() {
    let mut h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);
    h.inbound
        .send(Ok(request(kindless_id(), "ping", json!({}))))
        .await
        .unwrap();
    h.inbound
        .send(Ok(request(num_id(2), "ping", json!({}))))
        .await
        .unwrap();

    // The first thing the peer sees is the answer to the second request.
    let reply = h.replies.recv().await.unwrap().unwrap();
    assert_eq!(reply.typed_id.unwrap().kind, Some(Kind::Num(2)));
    assert!(reply.result.is_some());

    drop(h.inbound);
    h.task.await.unwrap().unwrap();
    assert!(h.replies.recv().await.is_none());
}

#[tokio::test]
async fn test_unrecognized_id_kind_is_dropped_under_skip() {
    let mut h = start(DemoEngine::default(), InvalidMessagePolicy::Skip);
    h.inbound
        .send(Ok(request(kindless_id(), "ping", json!({}))))
        .await
        .unwrap();
    h.inbound.send(Ok(hello(num_id(4), "Eve"))).await.unwrap();

    let reply = h.replies.recv().await.unwrap().unwrap();
    assert_eq!(reply.typed_id.unwrap().kind, Some(Kind::Num(4)));

    drop(h.inbound);
    h.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_integer_only_engine_rejects_string_id() {
    let h = start(
        DemoEngine::new(IdSupport::NumberOnly),
        InvalidMessagePolicy::Terminate,
    );
    h.inbound
        .send(Ok(request(str_id("abc"), "ping", json!({}))))
        .await
        .unwrap();

    let err = h.task.await.unwrap().unwrap_err();
    assert!(matches!(
        err,
        SessionError::Translate(TranslateError::UnsupportedIdentifierKind { .. })
    ));
}

#[tokio::test]
async fn test_progress_notification_precedes_result() {
    let mut h = start(DemoEngine::default(), InvalidMessagePolicy::Terminate);
    h.inbound
        .send(Ok(request(
            num_id(7),
            "tools/call",
            json!({
                "name": "hello_world",
                "arguments": {"name": "Dee"},
                "_meta": {"progressToken": 7}
            }),
        )))
        .await
        .unwrap();

    let first = h.replies.recv().await.unwrap().unwrap();
    assert_eq!(first.method, "notifications/progress");
    assert!(first.typed_id.is_none());

    let second = h.replies.recv().await.unwrap().unwrap();
    assert_eq!(second.typed_id.unwrap().kind, Some(Kind::Num(7)));
}
