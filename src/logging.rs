//! Tracing setup for the service.
//!
//! Events always go to stderr; stdout carries the protocol stream and must
//! never receive log output. File logging with daily rotation is layered on
//! top when enabled. `RUST_LOG` overrides the configured level.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// The `[logging]` section of the configuration file.
///
/// ```toml
/// [logging]
/// enabled = true
/// level = "info"
/// log_dir = "/var/log/toolwarden"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether to also write a daily rolling log file.
    pub enabled: bool,
    /// Minimum level recorded.
    pub level: LogLevel,
    /// Directory for log files. Defaults to the XDG data dir + `toolwarden/logs`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl LoggingConfig {
    /// File logging off, stderr only.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Sets a custom log directory.
    #[must_use]
    pub fn with_log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(path.into());
        self
    }

    /// Sets the level filter.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: LogLevel::default(),
            log_dir: None,
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose.
    Trace,
    /// Includes every guard approval.
    Debug,
    /// Default.
    #[default]
    Info,
    /// Includes every guard rejection.
    Warn,
    /// Least verbose.
    Error,
}

impl LogLevel {
    /// Converts to a tracing_subscriber LevelFilter.
    #[must_use]
    pub fn to_filter(self) -> tracing_subscriber::filter::LevelFilter {
        use tracing_subscriber::filter::LevelFilter;
        match self {
            Self::Trace => LevelFilter::TRACE,
            Self::Debug => LevelFilter::DEBUG,
            Self::Info => LevelFilter::INFO,
            Self::Warn => LevelFilter::WARN,
            Self::Error => LevelFilter::ERROR,
        }
    }
}

/// Keeps the non-blocking file writer flushing.
pub struct LoggingGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

impl fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingGuard").finish_non_exhaustive()
    }
}

static LOGGING_GUARD: OnceLock<LoggingGuard> = OnceLock::new();

/// Errors that can occur during logging initialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingError {
    /// The specific error that occurred.
    pub kind: LoggingErrorKind,
}

/// Specific logging error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingErrorKind {
    /// No XDG data directory and no `log_dir` configured.
    NoDataDir,
    /// The log directory could not be created.
    CreateDirFailed {
        /// The directory.
        path: PathBuf,
        /// The reason for failure.
        reason: String,
    },
    /// A global subscriber was already installed.
    SubscriberInitFailed {
        /// The reason for failure.
        reason: String,
    },
}

impl LoggingError {
    /// Creates a new LoggingError with the given kind.
    #[must_use]
    pub fn new(kind: LoggingErrorKind) -> Self {
        Self { kind }
    }

    /// Creates an error for a missing XDG data directory.
    #[must_use]
    pub fn no_data_dir() -> Self {
        Self::new(LoggingErrorKind::NoDataDir)
    }

    /// Creates an error for failed directory creation.
    #[must_use]
    pub fn create_dir_failed(path: PathBuf, reason: impl Into<String>) -> Self {
        Self::new(LoggingErrorKind::CreateDirFailed {
            path,
            reason: reason.into(),
        })
    }

    /// Creates an error for subscriber initialization failure.
    #[must_use]
    pub fn subscriber_init_failed(reason: impl Into<String>) -> Self {
        Self::new(LoggingErrorKind::SubscriberInitFailed {
            reason: reason.into(),
        })
    }
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LoggingErrorKind::NoDataDir => {
                write!(
                    f,
                    "could not determine XDG data directory; \
                     set XDG_DATA_HOME or configure logging.log_dir"
                )
            }
            LoggingErrorKind::CreateDirFailed { path, reason } => {
                write!(
                    f,
                    "failed to create log directory '{}': {}; check permissions",
                    path.display(),
                    reason
                )
            }
            LoggingErrorKind::SubscriberInitFailed { reason } => {
                write!(f, "failed to initialize tracing subscriber: {}", reason)
            }
        }
    }
}

impl std::error::Error for LoggingError {}

/// Resolves where log files go.
///
/// # Errors
///
/// Fails if no directory is configured and the XDG data dir is unknown.
pub fn log_dir(config: &LoggingConfig) -> Result<PathBuf, LoggingError> {
    if let Some(ref custom_dir) = config.log_dir {
        return Ok(custom_dir.clone());
    }

    dirs::data_local_dir()
        .map(|dir| dir.join("toolwarden").join("logs"))
        .ok_or_else(LoggingError::no_data_dir)
}

fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.to_filter().into()))
}

/// Installs the global subscriber.
///
/// `force_debug` raises the level to `debug` regardless of configuration.
/// The file writer guard is held for the rest of the process.
///
/// Returns `true` when a log file is being written.
///
/// # Errors
///
/// Fails if the log directory cannot be created or a subscriber is already set.
pub fn init(config: &LoggingConfig, force_debug: bool) -> Result<bool, LoggingError> {
    let level = if force_debug {
        LogLevel::Debug
    } else {
        config.level
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = if config.enabled {
        let dir = log_dir(config)?;
        std::fs::create_dir_all(&dir)
            .map_err(|e| LoggingError::create_dir_failed(dir.clone(), e.to_string()))?;

        let appender = tracing_appender::rolling::daily(&dir, "toolwarden.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter(level))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::subscriber_init_failed(e.to_string()))?;

    let writing_file = guard.is_some();
    if let Some(guard) = guard {
        let _ = LOGGING_GUARD.set(LoggingGuard { _guard: guard });
    }
    Ok(writing_file)
}
