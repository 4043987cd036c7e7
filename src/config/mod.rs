use std::env;
use std::fmt;

use crate::workflows::sampling::{AnswerDistribution, PartitionPolicy};

const DEFAULT_MAX_SAMPLE_SIZE: usize = 7;
const DEFAULT_ANSWER_OVERLAP: usize = 1;

/// Distinguishes runtime behavior for different stages of the embedding service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub environment: AppEnvironment,
    pub sampling: SamplingConfig,
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let max_sample_size = match env::var("SAMPLING_MAX_SIZE") {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => return Err(ConfigError::InvalidMaxSampleSize { value: raw }),
            },
            Err(_) => DEFAULT_MAX_SAMPLE_SIZE,
        };

        let answer_overlap = match env::var("SAMPLING_ANSWER_OVERLAP") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidAnswerOverlap { value: raw })?,
            Err(_) => DEFAULT_ANSWER_OVERLAP,
        };

        let log_level = env::var("SAMPLING_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            sampling: SamplingConfig {
                max_sample_size,
                answer_overlap,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Externally imposed sampling quota. The engine never reads it implicitly; callers hand the
/// derived values to each operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingConfig {
    pub max_sample_size: usize,
    pub answer_overlap: usize,
}

impl SamplingConfig {
    pub fn partition_policy(&self) -> PartitionPolicy {
        PartitionPolicy::MaxSize(self.max_sample_size)
    }

    pub fn answer_distribution(&self) -> AnswerDistribution {
        AnswerDistribution::Sliced {
            overlap: self.answer_overlap,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMaxSampleSize { value: String },
    InvalidAnswerOverlap { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMaxSampleSize { value } => {
                write!(f, "SAMPLING_MAX_SIZE must be a positive integer, got '{}'", value)
            }
            ConfigError::InvalidAnswerOverlap { value } => {
                write!(f, "SAMPLING_ANSWER_OVERLAP must be a non-negative integer, got '{}'", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
