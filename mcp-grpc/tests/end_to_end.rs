//! Loopback tests: a real gRPC server on an ephemeral port and the NDJSON
//! client flows driven from in-memory buffers.

use mcp_grpc::client::{connect, run_flows};
use mcp_grpc::demo::DemoEngine;
use mcp_grpc::error::ClientError;
use mcp_grpc::server::serve_with_listener;
use mcp_grpc_core::IdSupport;
use mcp_grpc_core::config::{BridgeDefaults, InvalidMessagePolicy};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

// ─────────────────────────────────────────────────────────────────────────────
// Test Harness
// ─────────────────────────────────────────────────────────────────────────────

struct Server {
    defaults: BridgeDefaults,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl Server {
    async fn start(id_support: IdSupport, policy: InvalidMessagePolicy) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let defaults = BridgeDefaults {
            address: format!("http://{addr}"),
            on_invalid_message: policy,
            ..BridgeDefaults::default()
        };

        let (shutdown, rx) = oneshot::channel::<()>();
        let server_defaults = defaults.clone();
        let task = tokio::spawn(async move {
            serve_with_listener(
                listener,
                &server_defaults,
                DemoEngine::new(id_support),
                async {
                    let _ = rx.await;
                },
            )
            .await
            .unwrap();
        });

        Self {
            defaults,
            shutdown,
            task,
        }
    }

    /// Feed `input` through one client stream and return the output lines.
    async fn exchange(&self, input: &str) -> Result<Vec<Value>, ClientError> {
        let mut client = connect(&self.defaults).await?;
        let mut output = Vec::new();
        run_flows(&mut client, input.as_bytes(), &mut output, &self.defaults).await?;

        let text = String::from_utf8(output).unwrap();
        Ok(text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect())
    }

    async fn stop(self) {
        let _ = self.shutdown.send(());
        self.task.await.unwrap();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_initialize_round_trip_keeps_integer_id() {
    let server = Server::start(IdSupport::Any, InvalidMessagePolicy::Terminate).await;

    let lines = server
        .exchange("{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n")
        .await
        .unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["jsonrpc"], json!("2.0"));
    assert_eq!(lines[0]["id"], json!(1));
    assert_eq!(lines[0]["result"]["serverInfo"]["name"], json!("mcp-grpc-demo"));

    server.stop().await;
}

#[tokio::test]
async fn test_string_id_comes_back_as_string() {
    let server = Server::start(IdSupport::Any, InvalidMessagePolicy::Terminate).await;

    let lines = server
        .exchange("{\"jsonrpc\":\"2.0\",\"id\":\"1\",\"method\":\"ping\"}\n")
        .await
        .unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["id"], json!("1"));
    assert_eq!(lines[0]["result"], json!({}));

    server.stop().await;
}

#[tokio::test]
async fn test_session_flow_in_order() {
    let server = Server::start(IdSupport::Any, InvalidMessagePolicy::Terminate).await;

    let input = concat!(
        "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"initialize\",\"params\":{}}\n",
        "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
        "\n",
        "not json\n",
        "{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"tools/list\"}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":3,\"method\":\"tools/call\",\"params\":{\"name\":\"hello_world\",\"arguments\":{\"name\":\"Bob\"}}}\n",
        "{\"jsonrpc\":\"2.0\",\"id\":4,\"method\":\"tools/call\",\"params\":{\"name\":\"nope\"}}\n",
    );
    let lines = server.exchange(input).await.unwrap();

    let ids: Vec<&Value> = lines.iter().map(|l| &l["id"]).collect();
    assert_eq!(ids, vec![&json!(1), &json!(2), &json!(3), &json!(4)]);
    assert_eq!(lines[1]["result"]["tools"][0]["name"], json!("hello_world"));
    assert_eq!(lines[2]["result"]["content"][0]["text"], json!("Hello, Bob!"));
    assert_eq!(lines[3]["error"]["code"], json!(-32602));
    assert_eq!(lines[3]["error"]["data"], json!({"tool": "nope"}));

    server.stop().await;
}

#[tokio::test]
async fn test_progress_notification_reaches_client() {
    let server = Server::start(IdSupport::Any, InvalidMessagePolicy::Terminate).await;

    let lines = server
        .exchange(concat!(
            "{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"tools/call\",\"params\":",
            "{\"name\":\"hello_world\",\"arguments\":{\"name\":\"A\"},\"_meta\":{\"progressToken\":\"p\"}}}\n",
        ))
        .await
        .unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["method"], json!("notifications/progress"));
    assert!(lines[0].get("id").is_none());
    assert_eq!(lines[0]["params"]["progressToken"], json!("p"));
    assert_eq!(lines[1]["id"], json!(9));

    server.stop().await;
}

#[tokio::test]
async fn test_integer_only_server_ends_stream_on_string_id() {
    let server = Server::start(IdSupport::NumberOnly, InvalidMessagePolicy::Terminate).await;

    let result = server
        .exchange("{\"jsonrpc\":\"2.0\",\"id\":\"abc\",\"method\":\"ping\"}\n")
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, ClientError::Transport { .. }));

    server.stop().await;
}

#[tokio::test]
async fn test_integer_only_server_answers_integer_id() {
    let server = Server::start(IdSupport::NumberOnly, InvalidMessagePolicy::Terminate).await;

    let lines = server
        .exchange("{\"jsonrpc\":\"2.0\",\"id\":7,\"method\":\"ping\"}\n")
        .await
        .unwrap();
    assert_eq!(lines[0]["id"], json!(7));

    server.stop().await;
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let defaults = BridgeDefaults {
        address: format!("http://{addr}"),
        ..BridgeDefaults::default()
    };
    assert!(matches!(
        connect(&defaults).await,
        Err(ClientError::Connect { .. })
    ));
}
