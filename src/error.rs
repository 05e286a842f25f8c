//! Crate-level error types.
//!
//! Guard rejections are not errors in this sense: they live next to the
//! guards in [`crate::security`] as ordinary typed results. `WardenError`
//! covers the faults that stop the service from starting or serving:
//! configuration that fails validation, and transport failures.
//!
//! Each error type implements Display, Debug, Clone, PartialEq, Eq, and std::error::Error.

use std::fmt;

/// Errors that can occur while configuring or running the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WardenError {
    /// The specific error that occurred
    pub kind: WardenErrorKind,
}

/// Specific service error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WardenErrorKind {
    /// Configuration failed validation
    Configuration {
        /// The configuration field that was invalid
        field: String,
        /// Why it was invalid
        reason: String,
    },
    /// The protocol transport failed (stdin closed unexpectedly, write error)
    Transport {
        /// Description of the failure
        reason: String,
    },
    /// The server could not be started
    ServerFailed {
        /// Reason for the failure
        reason: String,
    },
}

impl WardenError {
    /// Creates a new WardenError with the given kind.
    #[must_use]
    pub fn new(kind: WardenErrorKind) -> Self {
        Self { kind }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(WardenErrorKind::Configuration {
            field: field.into(),
            reason: reason.into(),
        })
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::new(WardenErrorKind::Transport {
            reason: reason.into(),
        })
    }

    /// Creates a server failed error.
    #[must_use]
    pub fn server_failed(reason: impl Into<String>) -> Self {
        Self::new(WardenErrorKind::ServerFailed {
            reason: reason.into(),
        })
    }

    /// Returns true if this error indicates a configuration problem.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.kind, WardenErrorKind::Configuration { .. })
    }

    /// Returns the offending configuration field, if this is a configuration error.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        match &self.kind {
            WardenErrorKind::Configuration { field, .. } => Some(field),
            _ => None,
        }
    }
}

impl fmt::Display for WardenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            WardenErrorKind::Configuration { field, reason } => {
                write!(
                    f,
                    "configuration error for '{}': {}; fix the configuration file and restart",
                    field, reason
                )
            }
            WardenErrorKind::Transport { reason } => {
                write!(f, "transport error: {}", reason)
            }
            WardenErrorKind::ServerFailed { reason } => {
                write!(f, "failed to start server: {}", reason)
            }
        }
    }
}

impl std::error::Error for WardenError {}
