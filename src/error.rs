use thiserror::Error;

use crate::extension::ExtensionKind;

pub type Result<T> = std::result::Result<T, PaperframeError>;

/// Startup failures. None of these are recovered from: they abort
/// `Router::initialize` and the process is expected to exit.
#[derive(Debug, Error)]
pub enum PaperframeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{kind} could not be resolved: {name}")]
    ExtensionNotFound { kind: ExtensionKind, name: String },

    #[error("Controller does not provide a resource name (route: {route})")]
    MissingResource { route: String },

    #[error("Controller {resource} does not provide a route")]
    MissingRoute { resource: String },

    #[error("Controller {resource} could not be constructed: {message}")]
    ControllerConstruction { resource: String, message: String },

    #[error("Service provider {name} failed to initialize: {message}")]
    ProviderInitialization { name: String, message: String },

    #[error("Dependency not found: {name}")]
    DependencyNotFound { name: String },

    #[error("Failed to downcast dependency {name} to {type_name}")]
    DowncastFailed { name: String, type_name: String },

    #[error("Router has not been initialized")]
    NotInitialized,
}

impl PaperframeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn not_found(kind: ExtensionKind, name: impl Into<String>) -> Self {
        Self::ExtensionNotFound {
            kind,
            name: name.into(),
        }
    }
}
