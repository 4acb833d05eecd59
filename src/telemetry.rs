//! Telemetry initialization.
//!
//! Installs a `tracing` subscriber writing to stderr. `RUST_LOG` filters
//! (default `info`); `AUTOGRAPH_LOG_FORMAT=json` switches from the human
//! format to JSON lines.

use tracing_subscriber::EnvFilter;

/// Initialize the stderr subscriber. Call once, at binary startup.
pub fn init() {
    use tracing_subscriber::layer::SubscriberExt as _;
    use tracing_subscriber::util::SubscriberInitExt as _;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("AUTOGRAPH_LOG_FORMAT").is_ok_and(|v| v == "json");

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
