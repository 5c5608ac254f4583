/// Centralized error types for the bond ingester
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    // Upstream Errors
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Protocol drift: {0}")]
    ProtocolDrift(String),

    // Data Errors
    #[error("Empty result: {0}")]
    EmptyResult(String),

    #[error("Serialization failed: {0}")]
    SerializationError(#[from] serde_json::Error),

    // Storage Errors
    #[error("Storage error: {0}")]
    StorageError(String),

    // Configuration Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    // Collaborator Errors
    #[error("Notification failed: {0}")]
    NotificationFailed(String),

    // File I/O Errors
    #[error("File I/O error: {0}")]
    FileError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IngestError>;

impl IngestError {
    /// Failures that end the current (date, source) sync and are reported to the operator
    pub fn is_hard_failure(&self) -> bool {
        matches!(
            self,
            IngestError::UpstreamUnavailable(_)
                | IngestError::ProtocolDrift(_)
                | IngestError::EmptyResult(_)
                | IngestError::StorageError(_)
        )
    }

    /// Failures that get a structured diagnostic artifact in addition to the notification
    pub fn needs_diagnostic(&self) -> bool {
        matches!(
            self,
            IngestError::ProtocolDrift(_) | IngestError::StorageError(_)
        )
    }

    /// Worth another attempt on a later date or run (never within the same session)
    pub fn is_retryable(&self) -> bool {
        matches!(self, IngestError::UpstreamUnavailable(_))
    }

    /// Get error code for logging/monitoring
    pub fn error_code(&self) -> &str {
        match self {
            IngestError::UpstreamUnavailable(_) => "NET_001",
            IngestError::ProtocolDrift(_) => "PROTO_001",
            IngestError::EmptyResult(_) => "DATA_001",
            IngestError::SerializationError(_) => "DATA_002",
            IngestError::StorageError(_) => "STORE_001",
            IngestError::ConfigError(_) => "CFG_001",
            IngestError::InvalidParameter(_) => "CFG_002",
            IngestError::NotificationFailed(_) => "NOTIFY_001",
            IngestError::FileError(_) => "FILE_001",
        }
    }
}
