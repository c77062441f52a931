use std::io;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter(default_level: &str) -> EnvFilter {
    // RUST_LOG wins over the configured level
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("{default_level},tower_http=info,axum=info"))
    })
}

/// Initialize tracing subscriber with compact human-readable output.
/// - Respects `RUST_LOG` if set, falls back to `default_level`
/// - Writes to stdout to improve visibility in environments that hide stderr
pub fn init_logging_compact(default_level: &str) {
    let _ = fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .compact()
        .with_writer(|| io::stdout())
        .try_init();
}

/// Initialize tracing subscriber with JSON structured output.
/// - Respects `RUST_LOG` if set, falls back to `default_level`
/// - Emits structured JSON logs for easier parsing by log collectors
/// - Writes to stdout for consistent container logging behavior
pub fn init_logging_json(default_level: &str) {
    let _ = fmt()
        .with_env_filter(env_filter(default_level))
        .with_target(false)
        .json()
        .with_writer(|| io::stdout())
        .try_init();
}
