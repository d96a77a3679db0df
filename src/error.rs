use thiserror::Error;

use crate::gateway::GatewayError;
use crate::lock::LockError;
use crate::store::StoreError;

/// The failure kinds callers can act on. The transport layer maps these to
/// protocol statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    AccessDenied,
    UpstreamUnavailable,
    Persistence,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NotFound => "not_found",
            ErrorKind::AccessDenied => "access_denied",
            ErrorKind::UpstreamUnavailable => "upstream_unavailable",
            ErrorKind::Persistence => "persistence",
        }
    }

    /// HTTP-style status code for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Validation => 400,
            ErrorKind::AccessDenied => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::UpstreamUnavailable => 502,
            ErrorKind::Persistence => 500,
        }
    }
}

/// Error type for service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed caller-supplied input.
    #[error("invalid input: {0}")]
    Validation(String),
    /// The user already has an active instance.
    #[error("user already has an active instance ({instance_id})")]
    ActiveInstanceExists { instance_id: String },
    /// The instance changed underneath this operation.
    #[error("instance {instance_id} was modified concurrently")]
    ConcurrentUpdate { instance_id: String },
    /// Referenced instance or course does not exist (or is not visible).
    #[error("not found: {0}")]
    NotFound(String),
    /// Explicit ownership check failed.
    #[error("access denied: {0}")]
    AccessDenied(String),
    /// A catalog or registry call failed.
    #[error("upstream unavailable: {0}")]
    Upstream(#[from] GatewayError),
    /// The store failed a read or write.
    #[error("persistence failure: {0}")]
    Persistence(StoreError),
    /// Serializing access to a user or instance failed.
    #[error("lock failure: {0}")]
    Lock(#[from] LockError),
    /// Identity resolution failed; the caller may retry.
    #[error("could not resolve catalog context for user {user_id}: {source}")]
    Resolution {
        user_id: String,
        #[source]
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::ActiveInstanceExists { .. } | ServiceError::ConcurrentUpdate { .. } => {
                ErrorKind::Conflict
            }
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::AccessDenied(_) => ErrorKind::AccessDenied,
            ServiceError::Upstream(_) => ErrorKind::UpstreamUnavailable,
            ServiceError::Persistence(_) | ServiceError::Lock(_) => ErrorKind::Persistence,
            ServiceError::Resolution { source, .. } => source.kind(),
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Whether the whole operation may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::UpstreamUnavailable | ErrorKind::Persistence | ErrorKind::Conflict
        ) && !matches!(self, ServiceError::ActiveInstanceExists { .. })
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ActiveInstanceExists { instance_id, .. } => {
                ServiceError::ActiveInstanceExists { instance_id }
            }
            StoreError::ConcurrencyConflict { id, .. } => {
                ServiceError::ConcurrentUpdate { instance_id: id }
            }
            other => ServiceError::Persistence(other),
        }
    }
}
