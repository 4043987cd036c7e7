use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

use crate::config::TelemetryConfig;

/// Target of every event the engine emits.
pub const ENGINE_TARGET: &str = "sampling_engine";

/// Level applied to everything outside the engine unless `RUST_LOG` says otherwise.
const HOST_LEVEL: &str = "warn";

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid sampling log level '{level}'")]
    InvalidLevel {
        level: String,
        #[source]
        source: ParseError,
    },
    #[error("a tracing subscriber is already installed")]
    AlreadyInstalled(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Filter directive raising the engine to `level` while the host stays at `warn`.
pub fn engine_directive(level: &str) -> String {
    format!("{HOST_LEVEL},{ENGINE_TARGET}={}", level.trim())
}

/// Build the filter used when `RUST_LOG` is not set.
pub fn engine_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(engine_directive(&config.log_level)).map_err(|source| {
        TelemetryError::InvalidLevel {
            level: config.log_level.clone(),
            source,
        }
    })
}

/// Install the process-wide subscriber. `RUST_LOG` wins over the configured engine level.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => engine_filter(config)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::AlreadyInstalled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> TelemetryConfig {
        TelemetryConfig {
            log_level: level.to_string(),
        }
    }

    #[test]
    fn directive_scopes_configured_level_to_the_engine() {
        assert_eq!(engine_directive(" debug "), "warn,sampling_engine=debug");
        assert!(engine_filter(&config("trace")).is_ok());
    }

    #[test]
    fn unknown_level_is_rejected() {
        match engine_filter(&config("chatty")) {
            Err(TelemetryError::InvalidLevel { level, .. }) => assert_eq!(level, "chatty"),
            other => panic!("expected invalid level, got {other:?}"),
        }
    }
}
