//! Context passed to command handlers.
//!
//! Carries the parsed input, the session and a reference to the service.
//! Handlers access everything they need through the context.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::HandlerError;
use super::session::Session;
use crate::identity::Caller;

/// The context passed to every command handler.
///
/// Generic over `L`, the service the registry dispatches into.
///
/// ```ignore
/// pub fn handle<S, C, G>(ctx: &Context<Lernreise<S, C, G>>) -> Result<Value, HandlerError> {
///     let caller = ctx.caller()?;
///     let input = ctx.input::<Input>()?;
///     // ...
/// }
/// ```
pub struct Context<'a, L> {
    input: Value,
    session: Session,
    service: &'a L,
}

impl<'a, L> Context<'a, L> {
    pub(crate) fn new(input: Value, session: Session, service: &'a L) -> Self {
        Self {
            input,
            session,
            service,
        }
    }

    /// Deserialize the input payload into a typed struct.
    pub fn input<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(self.input.clone()).map_err(|e| HandlerError::DecodeFailed(e.to_string()))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The calling user. Returns `Unauthorized` without a user id.
    pub fn caller(&self) -> Result<Caller, HandlerError> {
        self.session
            .caller()
            .ok_or_else(|| HandlerError::Unauthorized("missing user ID in session".into()))
    }

    pub fn service(&self) -> &L {
        self.service
    }

    /// Whether the input carries `field` as a non-empty string.
    pub fn has_field(&self, field: &str) -> bool {
        self.input
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|v| !v.trim().is_empty())
    }

    pub fn has_fields(&self, fields: &[&str]) -> bool {
        fields.iter().all(|f| self.has_field(f))
    }
}
