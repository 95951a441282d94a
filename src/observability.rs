// Observability Bootstrap
// Structured logging via tracing, initialized once at startup. Log lines
// carry the request identifier for correlation; the response body remains the
// only contract callers should depend on.

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize logging with the configured default level.
/// `RUST_LOG` overrides the configuration when set.
pub fn init_logging(default_level: &str) -> Result<()> {
    init_logging_with_writer(default_level, false)
}

/// Gateway variant: stdout carries the wire protocol, so logs go to stderr.
pub fn init_stderr_logging(default_level: &str) -> Result<()> {
    init_logging_with_writer(default_level, true)
}

fn init_logging_with_writer(default_level: &str, stderr: bool) -> Result<()> {
    let fallback = format!("devplan={default_level},warn");
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(!stderr);
    let fmt_layer = if stderr {
        fmt_layer.with_writer(std::io::stderr).boxed()
    } else {
        fmt_layer.boxed()
    };

    match tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
    {
        Ok(()) => {
            info!("devplan observability initialized");
            Ok(())
        }
        // Already initialized, which is fine in test environments.
        Err(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_init_is_harmless() {
        assert!(init_logging("info").is_ok());
        assert!(init_logging("debug").is_ok());
    }
}
