//! Lernreise orchestration service.
//!
//! Binds users to externally-hosted courses, tracks their progress through an
//! append-only audit trail and awards XP for task submissions. The course
//! catalog and the identity registry are upstream services reached through
//! the [`gateway`] traits; persistence goes through [`InstanceStore`].

pub mod api;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod lock;
pub mod model;
pub mod progress;
pub mod reward;
pub mod service;
pub mod store;

pub use config::{ConfigError, HttpConfig, LernreiseConfig, UpstreamConfig};
pub use enrollment::EnrollmentManager;
pub use error::{ErrorKind, ServiceError};
pub use gateway::{
    CatalogGateway, GatewayError, HttpCatalogClient, HttpRegistryClient, Registration,
    RegistryGateway,
};
pub use identity::{split_name, Caller, IdentityResolver};
pub use lock::{InMemoryLockManager, LockError, LockGuard, LockManager};
pub use model::{
    CourseSnapshot, CourseSummary, IdentityMapping, Instance, InstanceStatus, Model,
    ModuleSnapshot, ProgressChange, ProgressEvent, TaskSnapshot, Versioned, DEFAULT_TASK_STATE,
};
pub use progress::{ProgressTracker, TaskSubmission};
pub use reward::RewardPolicy;
pub use service::{Enrollment, Lernreise};
pub use store::{InMemoryStore, InstanceStore, StoreError};
