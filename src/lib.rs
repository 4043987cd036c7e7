pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

use config::EngineConfig;
use error::AppError;

/// Load configuration and install tracing for a process hosting the engine.
pub fn bootstrap() -> Result<EngineConfig, AppError> {
    let config = EngineConfig::load()?;
    telemetry::init(&config.telemetry)?;
    tracing::info!(
        environment = ?config.environment,
        max_sample_size = config.sampling.max_sample_size,
        "sampling engine configured"
    );
    Ok(config)
}
