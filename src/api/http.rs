//! HTTP transport: maps HTTP requests to command dispatch.
//!
//! Requires the `http` feature.
//!
//! ## Routes
//!
//! - `POST /:command` dispatches a command. Body = JSON input (may be empty),
//!   request headers become the session.
//! - `GET /health` pings the catalog and lists the registered commands.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use super::error::HandlerError;
use super::service::Api;
use super::session::Session;
use crate::gateway::{CatalogGateway, RegistryGateway};
use crate::service::Lernreise;
use crate::store::InstanceStore;

type SharedApi<S, C, G> = Arc<Api<Lernreise<S, C, G>>>;

/// Build an axum `Router` that dispatches commands via the given api.
pub fn router<S, C, G>(api: SharedApi<S, C, G>) -> Router
where
    S: InstanceStore + 'static,
    C: CatalogGateway + 'static,
    G: RegistryGateway + 'static,
{
    Router::new()
        .route("/health", get(health_handler::<S, C, G>))
        .route("/:command", post(command_handler::<S, C, G>))
        .with_state(api)
}

/// Serve the api over HTTP at `addr` (e.g. `"0.0.0.0:8080"`).
pub async fn serve<S, C, G>(api: SharedApi<S, C, G>, addr: &str) -> Result<(), std::io::Error>
where
    S: InstanceStore + 'static,
    C: CatalogGateway + 'static,
    G: RegistryGateway + 'static,
{
    let app = router(api);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    axum::serve(listener, app).await
}

/// `GET /health`: 200 when the catalog answers, 503 otherwise.
async fn health_handler<S, C, G>(State(api): State<SharedApi<S, C, G>>) -> Response
where
    S: InstanceStore + 'static,
    C: CatalogGateway + 'static,
    G: RegistryGateway + 'static,
{
    let probe = api.clone();
    let reachable = tokio::task::spawn_blocking(move || probe.service().health())
        .await
        .map(|r| r.is_ok())
        .unwrap_or(false);

    let status = if reachable {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let commands = api.commands();
    (status, Json(json!({ "ok": reachable, "commands": commands }))).into_response()
}

/// `POST /:command`: dispatch with the JSON body and headers as session.
async fn command_handler<S, C, G>(
    State(api): State<SharedApi<S, C, G>>,
    Path(command): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: InstanceStore + 'static,
    C: CatalogGateway + 'static,
    G: RegistryGateway + 'static,
{
    let input: Value = if body.is_empty() {
        json!({})
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => value,
            Err(e) => return error_response(&HandlerError::DecodeFailed(e.to_string())),
        }
    };
    let session = session_from_headers(&headers);

    // upstream clients block, keep them off the async workers
    let result = tokio::task::spawn_blocking(move || api.dispatch(&command, input, session)).await;

    match result {
        Ok(Ok(value)) => (StatusCode::OK, Json(value)).into_response(),
        Ok(Err(e)) => error_response(&e),
        Err(e) => {
            error!(error = %e, "command task failed");
            error_response(&HandlerError::Internal("command task failed".into()))
        }
    }
}

fn error_response(err: &HandlerError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(err.to_body())).into_response()
}

/// All headers are lowercased and included as session variables.
fn session_from_headers(headers: &HeaderMap) -> Session {
    let mut vars = HashMap::new();
    for (name, value) in headers.iter() {
        if let Ok(v) = value.to_str() {
            vars.insert(name.as_str().to_string(), v.to_string());
        }
    }
    Session::from_map(vars)
}
