// src/core/errors.rs

use std::path::PathBuf;
use thiserror::Error;

use crate::system::registry::RegistryError;

/// The single error type returned by the context-menu core.
#[derive(Error, Debug)]
pub enum ContextError {
    /// A precondition failed. Always raised before anything is written.
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        /// Every individual failure collected by the validator.
        details: Vec<String>,
    },

    /// Detection or command synthesis failed for a script.
    #[error("Script error for '{}': {message}", path.display())]
    Script {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<ContextError>>,
    },

    /// An icon request could not be resolved or validated.
    #[error("Icon error for '{request}': {message}")]
    Icon { request: String, message: String },

    /// The key/value store rejected an operation.
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A composite operation failed after its sub-steps ran.
    #[error("{operation} failed for '{target}': {reason}")]
    ContextMenu {
        operation: &'static str,
        target: String,
        reason: String,
        details: Vec<String>,
    },

    /// Anything else, with the original cause attached.
    #[error("{message}")]
    Unexpected {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ContextError {
    pub fn validation(message: impl Into<String>, details: Vec<String>) -> Self {
        ContextError::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn script(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ContextError::Script {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn unexpected(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        ContextError::Unexpected {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Attaches the offending script path, unless the error already names one.
    pub fn with_script_path(self, path: impl Into<PathBuf>) -> Self {
        match self {
            e @ ContextError::Script { .. } => e,
            other => {
                let message = other.to_string();
                ContextError::Script {
                    path: path.into(),
                    message,
                    source: Some(Box::new(other)),
                }
            }
        }
    }

    /// The detail lines carried by the error, if any.
    pub fn details(&self) -> &[String] {
        match self {
            ContextError::Validation { details, .. } | ContextError::ContextMenu { details, .. } => {
                details
            }
            _ => &[],
        }
    }
}

pub type ContextResult<T> = Result<T, ContextError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_script_path_wraps_foreign_errors() {
        let err = ContextError::validation("bad label", vec![]).with_script_path("C:/x.py");
        match err {
            ContextError::Script { path, source, .. } => {
                assert_eq!(path, PathBuf::from("C:/x.py"));
                assert!(source.is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_context_menu_message_names_operation_and_target() {
        let err = ContextError::ContextMenu {
            operation: "register",
            target: "womm_py_deploy".to_string(),
            reason: "1/2 locations succeeded".to_string(),
            details: vec![],
        };
        assert_eq!(
            err.to_string(),
            "register failed for 'womm_py_deploy': 1/2 locations succeeded"
        );
    }
}
