//! Compiles `proto/jsonrpc.proto` into tonic/prost bindings.
//!
//! The schema is parsed with `protox`, so no `protoc` binary is needed.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=proto/jsonrpc.proto");

    let fds = protox::compile(["jsonrpc.proto"], ["proto"])?;
    tonic_build::configure()
        .build_server(true)
        .build_client(true)
        .compile_fds(fds)?;

    Ok(())
}
