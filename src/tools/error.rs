//! Tool error types.
//!
//! Guard rejections travel inside [`ToolErrorKind::PathDenied`] and
//! [`ToolErrorKind::CommandDenied`] with their structure intact, so the
//! protocol layer can report the rejection code alongside the message.

use crate::security::{CommandRejection, PathRejection};
use crate::types::RequestId;
use std::fmt;
use std::time::Duration;

/// Errors that can occur in tool operations.
///
/// The kind is boxed to keep `Result<Value, ToolError>` small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolError {
    /// The invocation this error belongs to, once known
    pub request_id: Option<RequestId>,
    kind: Box<ToolErrorKind>,
}

/// Specific tool error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolErrorKind {
    /// Tool not found in registry
    NotFound {
        /// The name that was asked for
        tool_name: String,
        /// Closest registered name, if any is close
        suggestion: Option<String>,
    },
    /// Tool already registered
    AlreadyRegistered {
        /// The name of the existing tool
        tool_name: String,
    },
    /// Arguments did not match the tool's schema
    ValidationFailed {
        /// The name of the tool
        tool_name: String,
        /// What was invalid
        reason: String,
    },
    /// The operation was attempted and failed
    ExecutionFailed {
        /// The name of the tool
        tool_name: String,
        /// Reason for failure
        reason: String,
    },
    /// Tool execution timed out
    Timeout {
        /// The name of the tool
        tool_name: String,
        /// The timeout duration that was exceeded
        duration: Duration,
    },
    /// The path guard refused a path argument
    PathDenied {
        /// The name of the tool
        tool_name: String,
        /// Why the path was refused
        rejection: PathRejection,
    },
    /// The command guard refused the command line
    CommandDenied {
        /// The name of the tool
        tool_name: String,
        /// Why the command was refused
        rejection: CommandRejection,
    },
    /// Internal error
    Internal {
        /// Description of the internal error
        message: String,
    },
}

impl ToolError {
    /// Creates a new ToolError with the given kind.
    #[must_use]
    pub fn new(kind: ToolErrorKind) -> Self {
        Self {
            request_id: None,
            kind: Box::new(kind),
        }
    }

    /// Attaches the invocation's request ID.
    #[must_use]
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Returns a reference to the error kind.
    #[must_use]
    pub fn kind(&self) -> &ToolErrorKind {
        &self.kind
    }

    /// Creates a not found error.
    #[must_use]
    pub fn not_found(tool_name: impl Into<String>, suggestion: Option<String>) -> Self {
        Self::new(ToolErrorKind::NotFound {
            tool_name: tool_name.into(),
            suggestion,
        })
    }

    /// Creates an already registered error.
    #[must_use]
    pub fn already_registered(tool_name: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::AlreadyRegistered {
            tool_name: tool_name.into(),
        })
    }

    /// Creates a validation failed error.
    #[must_use]
    pub fn validation_failed(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ValidationFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates an execution failed error.
    #[must_use]
    pub fn execution_failed(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::ExecutionFailed {
            tool_name: tool_name.into(),
            reason: reason.into(),
        })
    }

    /// Creates a timeout error.
    #[must_use]
    pub fn timeout(tool_name: impl Into<String>, duration: Duration) -> Self {
        Self::new(ToolErrorKind::Timeout {
            tool_name: tool_name.into(),
            duration,
        })
    }

    /// Wraps a path guard rejection.
    #[must_use]
    pub fn path_denied(tool_name: impl Into<String>, rejection: PathRejection) -> Self {
        Self::new(ToolErrorKind::PathDenied {
            tool_name: tool_name.into(),
            rejection,
        })
    }

    /// Wraps a command guard rejection.
    #[must_use]
    pub fn command_denied(tool_name: impl Into<String>, rejection: CommandRejection) -> Self {
        Self::new(ToolErrorKind::CommandDenied {
            tool_name: tool_name.into(),
            rejection,
        })
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal {
            message: message.into(),
        })
    }

    /// Returns true if a guard refused the call.
    #[must_use]
    pub fn is_denied(&self) -> bool {
        matches!(
            *self.kind,
            ToolErrorKind::PathDenied { .. } | ToolErrorKind::CommandDenied { .. }
        )
    }

    /// Returns true if this error indicates the tool was not found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::NotFound { .. })
    }

    /// Returns true if the arguments were rejected before execution.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(*self.kind, ToolErrorKind::ValidationFailed { .. })
    }

    /// Stable snake_case code for the failure.
    ///
    /// Guard rejections report the guard's own code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self.kind.as_ref() {
            ToolErrorKind::NotFound { .. } => "tool_not_found",
            ToolErrorKind::AlreadyRegistered { .. } => "already_registered",
            ToolErrorKind::ValidationFailed { .. } => "invalid_arguments",
            ToolErrorKind::ExecutionFailed { .. } => "execution_failed",
            ToolErrorKind::Timeout { .. } => "timeout",
            ToolErrorKind::PathDenied { rejection, .. } => rejection.code(),
            ToolErrorKind::CommandDenied { rejection, .. } => rejection.code(),
            ToolErrorKind::Internal { .. } => "internal",
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref request_id) = self.request_id {
            write!(f, "[{}] ", request_id)?;
        }

        match self.kind.as_ref() {
            ToolErrorKind::NotFound {
                tool_name,
                suggestion,
            } => {
                write!(f, "tool '{}' not found", tool_name)?;
                match suggestion {
                    Some(name) => write!(f, "; did you mean '{}'?", name),
                    None => write!(f, "; call tools/list for available tools"),
                }
            }
            ToolErrorKind::AlreadyRegistered { tool_name } => {
                write!(
                    f,
                    "tool '{}' is already registered; use a different name",
                    tool_name
                )
            }
            ToolErrorKind::ValidationFailed { tool_name, reason } => {
                write!(
                    f,
                    "tool '{}' validation failed: {}; check the input arguments",
                    tool_name, reason
                )
            }
            ToolErrorKind::ExecutionFailed { tool_name, reason } => {
                write!(f, "tool '{}' execution failed: {}", tool_name, reason)
            }
            ToolErrorKind::Timeout {
                tool_name,
                duration,
            } => {
                write!(
                    f,
                    "tool '{}' timed out after {} seconds",
                    tool_name,
                    duration.as_secs()
                )
            }
            ToolErrorKind::PathDenied {
                tool_name,
                rejection,
            } => {
                write!(
                    f,
                    "tool '{}' denied ({}): {}",
                    tool_name,
                    rejection.code(),
                    rejection
                )
            }
            ToolErrorKind::CommandDenied {
                tool_name,
                rejection,
            } => {
                write!(
                    f,
                    "tool '{}' denied ({}): {}",
                    tool_name,
                    rejection.code(),
                    rejection
                )
            }
            ToolErrorKind::Internal { message } => {
                write!(f, "internal tool error: {}", message)
            }
        }
    }
}

impl std::error::Error for ToolError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn not_found_display_with_suggestion() {
        let error = ToolError::not_found("read_fil", Some("read_file".to_string()));
        let message = error.to_string();
        assert!(message.contains("read_fil"));
        assert!(message.contains("did you mean 'read_file'"));
    }

    #[test]
    fn not_found_display_without_suggestion() {
        let error = ToolError::not_found("zzz", None);
        assert!(error.to_string().contains("tools/list"));
        assert!(error.is_not_found());
    }

    #[test]
    fn path_denied_reports_rejection_code() {
        let error = ToolError::path_denied(
            "read_file",
            PathRejection::OutsideAllowedRoots {
                path: PathBuf::from("/etc/passwd"),
            },
        );
        assert!(error.is_denied());
        assert_eq!(error.code(), "outside_allowed_roots");
        let message = error.to_string();
        assert!(message.contains("outside_allowed_roots"));
        assert!(message.contains("/etc/passwd"));
    }

    #[test]
    fn command_denied_reports_rejection_code() {
        let error = ToolError::command_denied(
            "execute_command",
            CommandRejection::NotAllowed {
                command: "rm -rf /".to_string(),
            },
        );
        assert!(error.is_denied());
        assert_eq!(error.code(), "not_allowed");
        assert!(error.to_string().contains("rm -rf /"));
    }

    #[test]
    fn request_id_prefixes_display() {
        let id = RequestId::new();
        let error = ToolError::internal("boom").with_request_id(id.clone());
        assert!(error.to_string().starts_with(&format!("[{id}] ")));
    }

    #[test]
    fn timeout_display() {
        let error = ToolError::timeout("execute_command", Duration::from_secs(30));
        let message = error.to_string();
        assert!(message.contains("timed out"));
        assert!(message.contains("30"));
        assert_eq!(error.code(), "timeout");
    }

    #[test]
    fn validation_failed_is_validation() {
        let error = ToolError::validation_failed("write_file", "missing field `content`");
        assert!(error.is_validation());
        assert!(!error.is_denied());
        assert_eq!(error.code(), "invalid_arguments");
    }
}
