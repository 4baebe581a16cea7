use tracing_subscriber::{fmt, EnvFilter};

/// Log filter comes from RUST_LOG (default: info). Output goes to stderr
/// because stdout is the IPC channel.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}
