//! Generated protobuf and tonic bindings for the `jsonrpc` package.
//!
//! See `proto/jsonrpc.proto`. The service is a single bidirectional stream,
//! `JsonRpcService/Transport`, carrying [`GenericJsonRpcMessage`] both ways.

#![allow(clippy::all, clippy::pedantic, missing_docs)]

tonic::include_proto!("jsonrpc");
