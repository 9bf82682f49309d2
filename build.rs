fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Rebuild if proto or script changes
    println!("cargo:rerun-if-changed=proto/wish.proto");
    println!("cargo:rerun-if-changed=build.rs");

    // protox compiles the descriptor set in pure Rust, so no system protoc is needed.
    let descriptors = protox::compile(["proto/wish.proto"], ["proto"])?;

    // The server half is only used by tests, which stand up a stub WishService.
    tonic_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_fds(descriptors)?;

    Ok(())
}
