use crate::config::toml_config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `RUST_LOG` wins; otherwise the crate logs at `level`, or at debug when
/// `verbose` is set.
fn build_filter(level: &str, verbose: bool) -> EnvFilter {
    let directive = if verbose {
        "dc_designer=debug,info".to_string()
    } else {
        format!("dc_designer={}", level)
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive))
}

/// Installs the global subscriber: compact lines for a terminal, JSON when
/// `[logging] json = true`.
pub fn init_logger(logging: &LoggingConfig, verbose: bool) {
    let filter = build_filter(&logging.level, verbose);
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .compact(),
            )
            .init();
    }
}
