//! mcp-grpc CLI entry point.
//!
//! Dispatches to `serve` (gRPC server with the demo tool engine) or `client`
//! (stdio ⇄ gRPC correlator).

use clap::{Parser, Subcommand};
use mcp_grpc_core::IdSupport;
use mcp_grpc_core::config::BridgeDefaults;

use mcp_grpc::cli::{ClientArgs, ServeArgs};
use mcp_grpc::client::run_client;
use mcp_grpc::demo::DemoEngine;
use mcp_grpc::server::serve;

// ─────────────────────────────────────────────────────────────────────────────
// CLI Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// JSON-RPC 2.0 over a bidirectional gRPC stream.
#[derive(Parser)]
#[command(name = "mcp-grpc", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the gRPC server with the demo tool engine.
    Serve(ServeArgs),
    /// Bridge NDJSON on stdin/stdout to a gRPC server.
    Client(ClientArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Entry Point
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Serve(args) => {
            init_tracing(args.verbose);
            let defaults = args.apply(BridgeDefaults::from_env());
            let id_support = if args.integer_ids {
                IdSupport::NumberOnly
            } else {
                IdSupport::Any
            };
            match serve(&defaults, DemoEngine::new(id_support)).await {
                Ok(()) => 0,
                Err(e) => {
                    tracing::error!(error = %e, "serve failed");
                    eprintln!("mcp-grpc serve: {e}");
                    1
                }
            }
        }
        Commands::Client(args) => {
            init_tracing(args.verbose);
            let defaults = args.apply(BridgeDefaults::from_env());
            match run_client(&defaults).await {
                Ok(()) => 0,
                Err(e) => {
                    tracing::error!(error = %e, "client failed");
                    eprintln!("mcp-grpc client: {e}");
                    1
                }
            }
        }
    };

    std::process::exit(code);
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracing Init
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise tracing subscriber with stderr output.
///
/// stdout carries NDJSON in client mode, so logs never go there. When
/// `verbose` is true, sets filter to `debug`; otherwise respects `RUST_LOG`
/// (defaulting to `info`).
fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
