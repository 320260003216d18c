use thiserror::Error;

use crate::session::SessionState;

/// Main error type for the activity engine.
///
/// Nothing here is fatal to the host application: each variant degrades one
/// feature (tracking, step counting or reward persistence) and leaves the rest usable.
#[derive(Error, Debug)]
pub enum ActivityError {
    /// Location or motion permission refused; retry only after re-requesting.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Sensor absent on this device or platform.
    #[error("Device unsupported: {0}")]
    DeviceUnsupported(String),

    /// No initial fix could be obtained when starting a session.
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// A single fix request failed; tracking continues with prior samples.
    #[error("Transient location failure: {0}")]
    TransientLocationFailure(String),

    #[error("Persistence write failed for {key}: {message}")]
    PersistenceWriteFailure { key: String, message: String },

    #[error("Cannot {operation} while {from}")]
    InvalidStateTransition {
        from: SessionState,
        operation: &'static str,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ActivityError>;

impl ActivityError {
    /// Create a permission error from a message
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    /// Create an unsupported-device error from a message
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::DeviceUnsupported(msg.into())
    }

    /// Create a persistence error for `key`
    pub fn write_failure(key: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::PersistenceWriteFailure {
            key: key.into(),
            message: msg.into(),
        }
    }

    /// Whether retrying the same call can succeed without user action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::TransientLocationFailure(_)
                | Self::PersistenceWriteFailure { .. }
                | Self::LocationUnavailable(_)
        )
    }
}
