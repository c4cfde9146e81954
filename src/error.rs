//! Error types for the Gemini Agent SDK

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the SDK
///
/// Every variant is fatal to the current exchange. Nothing in this crate
/// retries on failure: the error carries the offending status, line, or
/// value and the caller decides what to do next.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Non-success status from the model endpoint or the tool registry
    #[error("API error (status {status}): {body}")]
    Api { status: u16, body: String },

    /// Malformed stream record or response part
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Unsupported value shape in a structured-value conversion
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Operation not valid for the current conversation state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Parameter shape a GET tool route cannot carry
    #[error("Unsupported parameter type: {0}")]
    UnsupportedParameter(String),

    /// Tool invocation failed or returned an unusable body
    #[error("Tool execution error: {0}")]
    ToolExecution(String),
}

impl Error {
    /// Create a new config error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a new API error from a response status and body
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Error::Api {
            status,
            body: body.into(),
        }
    }

    /// Create a new protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Error::Protocol(msg.into())
    }

    /// Create a new conversion error
    pub fn conversion(msg: impl Into<String>) -> Self {
        Error::Conversion(msg.into())
    }

    /// Create a new invalid state error
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Error::InvalidState(msg.into())
    }

    /// Create a new unsupported parameter error
    pub fn unsupported_parameter(msg: impl Into<String>) -> Self {
        Error::UnsupportedParameter(msg.into())
    }

    /// Create a new tool execution error
    pub fn tool_execution(msg: impl Into<String>) -> Self {
        Error::ToolExecution(msg.into())
    }
}
