//! Tracing subscriber setup for the CLI

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};

/// Directive used when `RUST_LOG` is unset. Driver chatter is held at warn.
fn default_directive(level: &str) -> String {
    format!("docweave={level},sqlx=warn,hyper=warn,reqwest=warn")
}

/// Install the global subscriber; `RUST_LOG` overrides the configured level.
/// Logs go to stderr so `run` output on stdout stays scriptable.
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.level)));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::debug!(level = %config.level, "Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_scopes_crate_level() {
        let directive = default_directive("debug");
        assert!(directive.starts_with("docweave=debug"));
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
