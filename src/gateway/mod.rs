//! Upstream collaborators: the course catalog and the identity registry.
//!
//! Both are capability traits with one production implementation each
//! (blocking HTTP/JSON clients). Calls either return a well-formed result or
//! fail outright; nothing here retries or caches.

mod catalog;
mod http;
mod registry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{CourseSnapshot, CourseSummary};

pub use catalog::HttpCatalogClient;
pub use registry::HttpRegistryClient;

/// Error type for upstream calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("{service} request failed: {message}")]
    Transport {
        service: &'static str,
        message: String,
    },
    /// Upstream answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    /// The response body did not have the expected shape.
    #[error("{service} response could not be decoded: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },
    /// Registration succeeded on the wire but returned no context identifier.
    #[error("registry response carried no context identifier")]
    MissingIdentifier,
    /// The client could not be built from its configuration.
    #[error("invalid {service} client configuration: {message}")]
    Config {
        service: &'static str,
        message: String,
    },
}

/// Read/write façade over the upstream course-content service.
pub trait CatalogGateway: Send + Sync {
    /// Courses available to a context.
    fn list_courses(&self, context_id: &str) -> Result<Vec<CourseSummary>, GatewayError>;

    /// Current snapshot of one course for a context.
    fn get_course_data(
        &self,
        context_id: &str,
        course_id: &str,
    ) -> Result<CourseSnapshot, GatewayError>;

    /// Mark a task as submitted and return the resulting snapshot.
    fn submit_task(
        &self,
        context_id: &str,
        course_id: &str,
        module_id: &str,
        task_id: &str,
    ) -> Result<CourseSnapshot, GatewayError>;

    /// Reachability check.
    fn ping(&self) -> Result<(), GatewayError>;
}

/// Identity data sent to the registry on first use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub external_uid: String,
    pub given_name: String,
    pub family_name: String,
    pub email: String,
}

/// Façade over the upstream identity-registration service.
pub trait RegistryGateway: Send + Sync {
    /// Register a user and return their new context identifier.
    fn register_user(&self, registration: &Registration) -> Result<String, GatewayError>;
}
