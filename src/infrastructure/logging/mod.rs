// Logging module - Logging infrastructure
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use std::io;

/// Directive used when `RUST_LOG` is not set
pub fn default_directive(level: &str, verbose: bool) -> String {
    let level = if verbose {
        "debug"
    } else {
        match level {
            "error" | "warn" | "info" | "debug" | "trace" => level,
            _ => "info",
        }
    };
    format!("khiterm={},warn", level)
}

/// Initialize logging system.
///
/// Logs go to stderr so controller output on stdout stays clean.
pub fn init_logging(level: &str, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level, verbose)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_file(verbose)
                .with_line_number(verbose),
        )
        .try_init()?;

    tracing::debug!("KhiTerm logging system initialized");
    Ok(())
}
