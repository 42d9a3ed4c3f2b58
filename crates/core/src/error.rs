//! PlayerWatch Error Types
//!
//! This module defines a layered error hierarchy:
//! - `DomainError`: Business logic errors (config, notification delivery)
//! - `InfraError`: Infrastructure errors (IO, network, serialization)
//! - `PlayerWatchError`: Top-level error that wraps both categories
//!
//! None of these ever escape the polling loop; they surface at startup and
//! in the one-shot CLI commands.

use std::fmt;

/// Domain-level errors representing business logic failures
#[derive(Debug)]
pub enum DomainError {
    /// Configuration file not found at the specified path
    ConfigNotFound { path: String },
    /// Configuration validation failed
    ConfigInvalid { field: String, reason: String },
    /// Configuration parsing failed
    ConfigParse { source: String },
    /// Notification could not be delivered to the channel
    Notify { channel: String, reason: String },
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigNotFound { path } => write!(f, "Config not found: {}", path),
            Self::ConfigInvalid { field, reason } => {
                write!(f, "Config invalid [{}]: {}", field, reason)
            }
            Self::ConfigParse { source } => write!(f, "Config parse error: {}", source),
            Self::Notify { channel, reason } => {
                write!(f, "Notification to channel {} failed: {}", channel, reason)
            }
        }
    }
}

impl std::error::Error for DomainError {}

/// Infrastructure-level errors representing external system failures
#[derive(Debug)]
pub enum InfraError {
    /// IO operation failed
    Io(std::io::Error),
    /// YAML serialization/deserialization failed
    Yaml(serde_yml::Error),
    /// Network/HTTP request failed
    Network { url: String, reason: String },
}

impl fmt::Display for InfraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "IO error: {}", err),
            Self::Yaml(err) => write!(f, "YAML error: {}", err),
            Self::Network { url, reason } => write!(f, "Network error [{}]: {}", url, reason),
        }
    }
}

impl std::error::Error for InfraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Yaml(e) => Some(e),
            Self::Network { .. } => None,
        }
    }
}

impl From<std::io::Error> for InfraError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_yml::Error> for InfraError {
    fn from(err: serde_yml::Error) -> Self {
        Self::Yaml(err)
    }
}

/// Top-level error type for PlayerWatch
#[derive(Debug)]
pub enum PlayerWatchError {
    /// Business logic error
    Domain(DomainError),
    /// Infrastructure/external system error
    Infra(InfraError),
}

impl fmt::Display for PlayerWatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{}", e),
            Self::Infra(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PlayerWatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Infra(e) => Some(e),
        }
    }
}

impl From<DomainError> for PlayerWatchError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<InfraError> for PlayerWatchError {
    fn from(err: InfraError) -> Self {
        Self::Infra(err)
    }
}

// Convenience conversions from infrastructure error sources
impl From<std::io::Error> for PlayerWatchError {
    fn from(err: std::io::Error) -> Self {
        Self::Infra(InfraError::Io(err))
    }
}

impl From<serde_yml::Error> for PlayerWatchError {
    fn from(err: serde_yml::Error) -> Self {
        Self::Infra(InfraError::Yaml(err))
    }
}

impl PlayerWatchError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::Domain(DomainError::ConfigNotFound { path: path.into() })
    }

    pub fn config_parse_error(source: impl Into<String>) -> Self {
        Self::Domain(DomainError::ConfigParse {
            source: source.into(),
        })
    }

    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Domain(DomainError::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        })
    }

    pub fn notify_error(channel: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Domain(DomainError::Notify {
            channel: channel.into(),
            reason: reason.into(),
        })
    }

    pub fn network_error(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Infra(InfraError::Network {
            url: url.into(),
            reason: reason.into(),
        })
    }
}
