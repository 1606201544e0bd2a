//! Error types for the resync synchronization tool.
//!
//! This module provides the error hierarchy for all operations in a sync
//! run: configuration, transport against the two deployments, and the
//! synchronization engine itself.

use thiserror::Error;

/// The main error type for resync.
#[derive(Debug, Error)]
pub enum ResyncError {
    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transport errors against a deployment API.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Synchronization engine errors.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An endpoint URL could not be parsed.
    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint {
        /// The offending URL string.
        url: String,
    },

    /// The module selection is empty.
    #[error("No modules selected - pass at least one module name via --modules")]
    EmptyModuleSelection,
}

/// Transport errors against a deployment API.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Authentication failed.
    #[error("Authentication failed against {endpoint}: {message}")]
    AuthenticationFailed {
        /// Endpoint that rejected the credentials.
        endpoint: String,
        /// Error message from the deployment.
        message: String,
    },

    /// The requested path does not exist on the deployment.
    ///
    /// This is the distinguishable "expected absence" condition: callers
    /// reading target state may treat it as an empty resource set.
    #[error("Not found: {path}")]
    NotFound {
        /// Request path that returned 404.
        path: String,
    },

    /// API request failed with a non-success status.
    #[error("API request to {path} failed: {status} - {message}")]
    ApiRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Request path.
        path: String,
        /// Error body from the deployment.
        message: String,
    },

    /// Network-level failure.
    #[error("Network error: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Invalid response from {path}: {message}")]
    InvalidResponse {
        /// Request path.
        path: String,
        /// Description of the decode failure.
        message: String,
    },
}

/// Synchronization engine errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The caller selected a module name that is not registered.
    #[error("Unknown module: {name}")]
    UnknownModule {
        /// The unrecognized module name.
        name: String,
    },

    /// Discovery of parent resources failed before any diffing occurred.
    #[error("Discovery failed for module '{module}': {reason}")]
    DiscoveryFailed {
        /// Module whose roots were being discovered.
        module: String,
        /// Underlying failure.
        reason: String,
    },

    /// `synchronize` was called without a preceding `analyze`.
    #[error("Synchronizer '{synchronizer}' was not analyzed before synchronization")]
    NotAnalyzed {
        /// Display name of the offending synchronizer.
        synchronizer: String,
    },
}

/// Result type alias for resync operations.
pub type Result<T> = std::result::Result<T, ResyncError>;

impl ResyncError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is the "expected absence" condition.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Transport(TransportError::NotFound { .. }))
    }
}

impl TransportError {
    /// Creates an API request error.
    #[must_use]
    pub fn api_error(status: u16, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            path: path.into(),
            message: message.into(),
        }
    }
}
