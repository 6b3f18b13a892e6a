//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace, covering both
//! load-time contract failures and per-request rejections.

use derive_more::{Display, From};
use serde::Serialize;

/// Fixed caller-facing text for anything that is not the caller's fault.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

/// The Global Error Enum.
///
/// Load-time variants abort contract construction. Request-time variants are
/// translated once, at the pipeline boundary, into an [`ErrorBody`].
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors (contract or config file access).
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// The document is not valid YAML/JSON.
    #[from(ignore)]
    #[display("Parse Error: {_0}")]
    Parse(String),

    /// The document parsed but cannot be compiled.
    #[from(ignore)]
    #[display("Invalid contract: {_0}")]
    InvalidContract(String),

    /// A `$ref` that does not start with `#/`.
    #[from(ignore)]
    #[display("Non-local ref '{_0}' is not handled")]
    UnsupportedReference(String),

    /// A local `$ref` whose target does not exist.
    #[from(ignore)]
    #[display("Ref '{_0}' does not point to anything")]
    BrokenReference(String),

    /// A `$ref` that (transitively) points back at itself.
    #[from(ignore)]
    #[display("Ref '{_0}' is part of a reference cycle")]
    CyclicReference(String),

    /// Two operations share an `operationId`.
    #[from(ignore)]
    #[display("Duplicate operationId '{_0}'")]
    DuplicateOperationId(String),

    /// Two operations share a route pattern and verb.
    #[from(ignore)]
    #[display("Duplicate route {} {pattern}", verb.to_uppercase())]
    DuplicateRoute {
        /// Route pattern, e.g. `/users/{userId}`.
        pattern: String,
        /// Lowercase verb.
        verb: String,
    },

    /// No operation matched the lookup key.
    #[from(ignore)]
    #[display("Operation not found: {_0}")]
    OperationNotFound(String),

    /// A security requirement this crate cannot compile.
    #[from(ignore)]
    #[display("Unsupported security scheme: {_0}")]
    UnsupportedSecurityScheme(String),

    /// A required parameter or body field is absent.
    #[from(ignore)]
    #[display("'{_0}' is required and must not be null")]
    MissingParameter(String),

    /// A parameter or body field failed type coercion.
    #[from(ignore)]
    #[display("'{name}' was {value} but must be a {expected}")]
    InvalidParameter {
        /// Field name.
        name: String,
        /// Rendered offending value.
        value: String,
        /// Expected primitive type.
        expected: String,
    },

    /// A body field that the schema does not declare.
    #[from(ignore)]
    #[display("'{_0}' is not a recognized parameter")]
    UnknownParameter(String),

    /// No mechanism found any credential.
    #[from(ignore)]
    #[display("authentication is missing")]
    MissingAuthentication,

    /// A mechanism found credential material it could not parse.
    #[from(ignore)]
    #[display("authentication mechanism is malformed")]
    MalformedAuthentication,

    /// Raised by host callbacks when credentials are well formed but wrong.
    #[from(ignore)]
    #[display("{_0}")]
    InvalidCredentials(String),

    /// A state that load-time checks should have made impossible.
    #[from(ignore)]
    #[display("Internal error: {_0}")]
    Internal(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Convenience constructor for [`AppError::InvalidParameter`].
    pub fn invalid_parameter(
        name: impl Into<String>,
        value: &serde_json::Value,
        expected: impl Into<String>,
    ) -> Self {
        AppError::InvalidParameter {
            name: name.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// Stable machine-readable code reported to callers.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MissingParameter(_) => "MissingParameter",
            AppError::InvalidParameter { .. } => "InvalidParameter",
            AppError::UnknownParameter(_) => "UnknownParameter",
            AppError::MissingAuthentication => "MissingAuthentication",
            AppError::MalformedAuthentication => "MalformedAuthentication",
            AppError::InvalidCredentials(_) => "InvalidCredentials",
            AppError::OperationNotFound(_) => "OperationNotFound",
            _ => "InternalError",
        }
    }

    /// HTTP status a host should answer with.
    pub fn status(&self) -> u16 {
        match self {
            AppError::MissingParameter(_)
            | AppError::InvalidParameter { .. }
            | AppError::UnknownParameter(_) => 400,
            AppError::MissingAuthentication
            | AppError::MalformedAuthentication
            | AppError::InvalidCredentials(_) => 401,
            AppError::OperationNotFound(_) => 404,
            _ => 500,
        }
    }

    /// True for errors caused by the caller rather than by the contract or host.
    pub fn is_caller_error(&self) -> bool {
        self.status() < 500
    }
}

/// Structured caller-facing error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Stable machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// HTTP status.
    #[serde(skip)]
    pub status: u16,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        let message = if err.is_caller_error() {
            err.to_string()
        } else {
            INTERNAL_ERROR_MESSAGE.to_string()
        };
        ErrorBody {
            code: err.code().to_string(),
            message,
            status: err.status(),
        }
    }
}
