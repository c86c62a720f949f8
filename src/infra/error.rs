use thiserror::Error;

use crate::config::LoadError;

/// Failures raised by process-level plumbing outside the host itself.
#[derive(Debug, Error)]
pub enum InfraError {
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] LoadError),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl InfraError {
    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }
}
