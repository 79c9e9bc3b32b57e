use std::result::Result as StdResult;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
/// Error type for bridge operations.
pub enum Error {
    /// A caller-supplied argument had the wrong shape. Raised before the
    /// engine is touched.
    #[error("Invalid argument `{param}`: {message}")]
    Argument {
        /// Name of the offending parameter.
        param: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The engine reported a fault. The message is the engine's own
    /// diagnostic text, unmodified.
    #[error("{0}")]
    ScriptFault(String),

    /// An engine control operation failed.
    #[error("{0}")]
    Engine(String),
}

impl Error {
    /// Create an Argument error for the named parameter.
    pub fn argument(param: &'static str, message: impl Into<String>) -> Self {
        Self::Argument {
            param,
            message: message.into(),
        }
    }

    /// Create an Engine error.
    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine(message.into())
    }

    /// Short category name for this error.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Argument { .. } => "argument",
            Self::ScriptFault(_) => "script",
            Self::Engine(_) => "engine",
        }
    }

    /// Convert the error to a structured, serializable form.
    pub fn info(&self) -> ErrorInfo {
        let (param, message) = match self {
            Self::Argument { param, message } => (Some(param.to_string()), message.clone()),
            Self::ScriptFault(text) | Self::Engine(text) => (None, text.clone()),
        };
        ErrorInfo {
            error_type: self.error_type().to_string(),
            message,
            param,
        }
    }
}

/// Serializable error details for hosts that speak JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Short error category: `argument`, `script` or `engine`.
    pub error_type: String,
    /// Human-readable error message.
    pub message: String,
    /// Offending parameter, for argument errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
}

/// Result alias using the crate error type.
pub type Result<T> = StdResult<T, Error>;
