//! Defines helpers for logging

pub use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt::format::Format};

/// Initialize a logger at the given log level
///
/// `RUST_LOG` directives, when set, take precedence over `level`. When `json`
/// is set events are emitted as newline delimited JSON
pub fn setup_system_logger(level: LevelFilter, json: bool) {
    let filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    // Hook tools capture stdout, so all log output is written to stderr
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .event_format(Format::default().compact())
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
