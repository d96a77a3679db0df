//! Api - command handler registry and dispatch.
//!
//! `Api<L>` owns the service and a set of named command handlers. Each
//! handler receives a `Context<L>` and returns `Result<Value, HandlerError>`.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::context::Context;
use super::error::HandlerError;
use super::session::Session;

struct CommandHandler<L> {
    guard: Option<Box<dyn Fn(&Context<L>) -> bool + Send + Sync>>,
    handle: Box<dyn Fn(&Context<L>) -> Result<Value, HandlerError> + Send + Sync>,
}

/// Routes named commands to handler functions.
pub struct Api<L> {
    service: L,
    handlers: HashMap<String, CommandHandler<L>>,
}

impl<L: Send + Sync + 'static> Api<L> {
    pub fn new(service: L) -> Self {
        Self {
            service,
            handlers: HashMap::new(),
        }
    }

    /// Register a command handler. Returns `self` for chaining.
    pub fn command<F>(mut self, name: &str, handler: F) -> Self
    where
        F: Fn(&Context<L>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: None,
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Register a command handler with a guard function.
    ///
    /// The guard runs before the handler. If it returns `false` the command
    /// is rejected with `HandlerError::GuardRejected`.
    pub fn command_guarded<G, F>(mut self, name: &str, guard: G, handler: F) -> Self
    where
        G: Fn(&Context<L>) -> bool + Send + Sync + 'static,
        F: Fn(&Context<L>) -> Result<Value, HandlerError> + Send + Sync + 'static,
    {
        self.handlers.insert(
            name.to_string(),
            CommandHandler {
                guard: Some(Box::new(guard)),
                handle: Box::new(handler),
            },
        );
        self
    }

    /// Dispatch a command by name.
    pub fn dispatch(
        &self,
        command: &str,
        input: Value,
        session: Session,
    ) -> Result<Value, HandlerError> {
        let handler = self
            .handlers
            .get(command)
            .ok_or_else(|| HandlerError::UnknownCommand(command.to_string()))?;

        let ctx = Context::new(input, session, &self.service);

        if let Some(guard) = &handler.guard {
            if !guard(&ctx) {
                return Err(HandlerError::GuardRejected(command.to_string()));
            }
        }

        debug!(command, user_id = ctx.session().user_id().unwrap_or_default(), "dispatching command");
        let result = (handler.handle)(&ctx);
        if let Err(e) = &result {
            warn!(command, status = e.status_code(), error = %e, "command failed");
        }
        result
    }

    /// Dispatch a `CommandRequest`, returning a `CommandResponse`.
    pub fn dispatch_request(&self, request: &CommandRequest) -> CommandResponse {
        let session = Session::from_map(request.session_variables.clone());
        match self.dispatch(&request.command, request.input.clone(), session) {
            Ok(value) => CommandResponse {
                status: 200,
                body: value,
            },
            Err(e) => CommandResponse {
                status: e.status_code(),
                body: e.to_body(),
            },
        }
    }

    /// Registered command names, sorted.
    pub fn commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn service(&self) -> &L {
        &self.service
    }
}

/// A command with its input and session, as received from any transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    pub input: Value,
    #[serde(default)]
    pub session_variables: HashMap<String, String>,
}

/// Outcome of a dispatched `CommandRequest`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    /// HTTP-style status code.
    pub status: u16,
    /// Handler result or error body.
    pub body: Value,
}
