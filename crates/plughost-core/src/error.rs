//! Unified error types for plughost.
//!
//! Every failure the plugin runtime can report is an [`AppError`] tagged
//! with an [`ErrorKind`], so callers can branch on the kind while still
//! propagating with the `?` operator.

use std::fmt;
use thiserror::Error;

/// Error kind categorization used across plughost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// A plugin with the same identifier is already registered.
    DuplicatePlugin,
    /// A plugin record was not minted by the manager checking it.
    UnauthorizedConstruction,
    /// A plugin's init routine returned without registering a plugin.
    PluginContractViolation,
    /// An operation was invoked outside the context it requires.
    IllegalContext,
    /// A hard dependency is not present in the loading queue.
    MissingHardDependency,
    /// A dependency chain re-entered a plugin that is still loading.
    CyclicDependency,
    /// The requested plugin is not registered.
    UnknownPlugin,
    /// The same listener is already registered for the event.
    DuplicateListener,
    /// Input validation failed.
    Validation,
    /// Enumerating a plugin source failed.
    Discovery,
    /// A plugin manifest could not be read or parsed.
    Manifest,
    /// A listener failed while handling an event.
    Listener,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicatePlugin => write!(f, "DUPLICATE_PLUGIN"),
            Self::UnauthorizedConstruction => write!(f, "UNAUTHORIZED_CONSTRUCTION"),
            Self::PluginContractViolation => write!(f, "PLUGIN_CONTRACT_VIOLATION"),
            Self::IllegalContext => write!(f, "ILLEGAL_CONTEXT"),
            Self::MissingHardDependency => write!(f, "MISSING_HARD_DEPENDENCY"),
            Self::CyclicDependency => write!(f, "CYCLIC_DEPENDENCY"),
            Self::UnknownPlugin => write!(f, "UNKNOWN_PLUGIN"),
            Self::DuplicateListener => write!(f, "DUPLICATE_LISTENER"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Discovery => write!(f, "DISCOVERY"),
            Self::Manifest => write!(f, "MANIFEST"),
            Self::Listener => write!(f, "LISTENER"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
        }
    }
}

/// The unified error used throughout plughost.
///
/// Any error an init routine propagates aborts the in-progress load cycle,
/// except `DuplicatePlugin`, which counts as "already loaded". Plugins
/// registered before the failure stay registered; there is no rollback.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a duplicate-plugin error.
    pub fn duplicate_plugin(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicatePlugin, message)
    }

    /// Create an unauthorized-construction error.
    pub fn unauthorized_construction(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnauthorizedConstruction, message)
    }

    /// Create a plugin-contract-violation error.
    pub fn contract_violation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::PluginContractViolation, message)
    }

    /// Create an illegal-context error.
    pub fn illegal_context(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IllegalContext, message)
    }

    /// Create a missing-hard-dependency error.
    pub fn missing_dependency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MissingHardDependency, message)
    }

    /// Create a cyclic-dependency error.
    pub fn cyclic_dependency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::CyclicDependency, message)
    }

    /// Create an unknown-plugin error.
    pub fn unknown_plugin(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownPlugin, message)
    }

    /// Create a duplicate-listener error.
    pub fn duplicate_listener(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DuplicateListener, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a listener error.
    pub fn listener(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Listener, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Discovery, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
