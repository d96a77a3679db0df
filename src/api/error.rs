//! Error type for command handlers.

use serde_json::{json, Value};
use thiserror::Error;

use crate::error::ServiceError;

#[derive(Debug, Error)]
pub enum HandlerError {
    /// No handler registered for this command name.
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    /// Payload could not be decoded into the handler's input type.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// Guard rejected the command (required input fields missing).
    #[error("guard rejected command: {0}")]
    GuardRejected(String),
    /// No caller identity in the session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
    /// The handler could not produce its response.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Inputs are decoded through [`Context::input`](super::Context::input), so a
/// JSON error raised inside a handler comes from encoding its response.
impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::Internal(format!("response encoding failed: {err}"))
    }
}

impl HandlerError {
    /// Map this error to an HTTP-style status code.
    pub fn status_code(&self) -> u16 {
        match self {
            HandlerError::UnknownCommand(_) => 404,
            HandlerError::DecodeFailed(_) => 400,
            HandlerError::GuardRejected(_) => 400,
            HandlerError::Unauthorized(_) => 401,
            HandlerError::Service(e) => e.status_code(),
            HandlerError::Internal(_) => 500,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            HandlerError::UnknownCommand(_) => "unknown_command",
            HandlerError::DecodeFailed(_) | HandlerError::GuardRejected(_) => "validation",
            HandlerError::Unauthorized(_) => "unauthorized",
            HandlerError::Service(e) => e.kind().as_str(),
            HandlerError::Internal(_) => "internal",
        }
    }

    /// JSON error body: `{ "error": ..., "kind": ... }`, plus the existing
    /// instance id on an enrollment conflict.
    pub fn to_body(&self) -> Value {
        let mut body = json!({ "error": self.to_string(), "kind": self.kind() });
        if let HandlerError::Service(ServiceError::ActiveInstanceExists { instance_id }) = self {
            body["instance_id"] = json!(instance_id);
        }
        body
    }
}
