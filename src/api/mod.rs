//! Command transport over the Lernreise service.
//!
//! Every operation of [`Lernreise`](crate::Lernreise) is a named command on an
//! [`Api`]. Each handler receives a [`Context`] with the JSON input, the
//! caller's session and the service.
//!
//! ```ignore
//! use lernreise::api::{self, Session};
//! use serde_json::json;
//!
//! let api = api::handlers::api(service);
//! let enrollment = api.dispatch(
//!     "instance.select",
//!     json!({ "course_id": "course1" }),
//!     Session::for_user("user-42"),
//! )?;
//!
//! // HTTP transport (requires the "http" feature)
//! // api::serve(Arc::new(api), "0.0.0.0:8080").await?;
//! ```
//!
//! ## Handler Convention
//!
//! ```ignore
//! // src/api/handlers/instance_get.rs
//!
//! pub const COMMAND: &str = "instance.get";
//!
//! pub fn guard<L>(ctx: &Context<L>) -> bool {
//!     ctx.has_field("instance_id")
//! }
//!
//! pub fn handle<S, C, G>(ctx: &Context<Lernreise<S, C, G>>) -> Result<Value, HandlerError> { .. }
//! ```

mod context;
mod error;
pub mod handlers;
mod service;
mod session;

pub use context::Context;
pub use error::HandlerError;
pub use service::{Api, CommandRequest, CommandResponse};
pub use session::{Session, DISPLAY_NAME, EMAIL, EXTERNAL_UID, USER_ID};

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::{router, serve};

/// Register handler modules on an [`Api`] using the convention pattern.
///
/// Each handler module must export:
/// - `COMMAND: &str`, the command name
/// - `guard(ctx) -> bool`, input validation
/// - `handle(ctx) -> Result<Value, HandlerError>`, the handler
#[macro_export]
macro_rules! register_handlers {
    ($api:expr, $( $($seg:ident)::+ ),+ $(,)?) => {
        $api
        $(
            .command_guarded(
                $($seg)::+::COMMAND,
                $($seg)::+::guard,
                $($seg)::+::handle,
            )
        )+
    };
}
