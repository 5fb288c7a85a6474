//! Node log output.
//!
//! Round driver, vote intake and peer delivery all log through `tracing`
//! with `node_id`, `round` and `phase` fields. This module installs the
//! subscriber once per process: pretty output while running a local
//! network by hand, JSON when nodes run under a log collector.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output.
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Parses `--log-format`; anything other than `json` is pretty.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Builds the default filter directive for `level`.
pub fn default_directive(level: &str) -> String {
    format!(
        "benor={level},tower_http=debug,axum::rejection=trace",
        level = level
    )
}

/// Installs the global subscriber for a node process.
///
/// `RUST_LOG` takes precedence over `level` when set. Otherwise the filter
/// comes from [`default_directive`].
///
/// # Example
///
/// ```rust,no_run
/// use benor_node::observability::{init_logging, LogFormat};
///
/// init_logging("info", LogFormat::Json);
/// ```
pub fn init_logging(level: &str, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive(level).into());

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(true),
            )
            .init(),
        LogFormat::Pretty => registry.with(fmt::layer().pretty()).init(),
    }

    tracing::info!(level = %level, format = ?format, "logging ready");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse("pretty"), LogFormat::Pretty);
        assert_eq!(LogFormat::parse("anything"), LogFormat::Pretty);
    }

    #[test]
    fn test_default_directive() {
        assert!(default_directive("debug").starts_with("benor=debug"));
    }
}
