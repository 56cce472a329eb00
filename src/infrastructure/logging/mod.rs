// Logging module - Logging infrastructure
use crate::domain::error::{LinkTermError, LinkTermResult};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging system
///
/// `RUST_LOG` wins over `level` when set. Output goes to stderr so it never
/// mixes with received lines on stdout.
pub fn init_logging(level: &str, verbose: bool) -> LinkTermResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("linkterm={}", level)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(verbose)
                .with_level(true)
                .with_file(verbose)
                .with_line_number(verbose),
        )
        .try_init()
        .map_err(|e| LinkTermError::Config {
            message: format!("Failed to initialize logging: {}", e),
        })?;

    tracing::debug!("LinkTerm logging system initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_init_twice_is_an_error_not_a_panic() {
        let _ = init_logging("debug", true);
        assert!(init_logging("info", false).is_err());
    }
}
