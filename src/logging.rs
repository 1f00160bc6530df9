use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over `log_level` when set.
pub fn setup_logging(log_level: &str) {
    let level = match log_level.to_lowercase().as_str() {
        "warning" => "warn".to_string(),
        other => other.to_string(),
    };

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}
