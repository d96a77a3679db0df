//! Identity resolution: local user → catalog context identifier.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::error::ServiceError;
use crate::gateway::{Registration, RegistryGateway};
use crate::lock::{InMemoryLockManager, LockManager};
use crate::model::IdentityMapping;
use crate::store::InstanceStore;

/// The already-authenticated caller of a service operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub external_uid: String,
    pub display_name: String,
    pub email: String,
}

impl Caller {
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        Self {
            external_uid: user_id.clone(),
            user_id,
            ..Self::default()
        }
    }

    pub fn with_profile(
        mut self,
        external_uid: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        self.external_uid = external_uid.into();
        self.display_name = display_name.into();
        self.email = email.into();
        self
    }

    /// Reject callers without a user id.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.user_id.trim().is_empty() {
            return Err(ServiceError::Validation("missing user id".into()));
        }
        Ok(())
    }
}

/// Split a display name into (given, family) at the last space.
///
/// `"Anna Maria Schmidt"` → `("Anna Maria", "Schmidt")`, `"Max"` → `("Max", "")`.
pub fn split_name(display_name: &str) -> (String, String) {
    match display_name.rfind(' ') {
        Some(idx) => (
            display_name[..idx].to_string(),
            display_name[idx + 1..].to_string(),
        ),
        None => (display_name.to_string(), String::new()),
    }
}

/// Maps callers to catalog contexts, registering them on first use.
///
/// The only writer of identity mappings. Resolutions for one user are
/// serialized so the registry sees at most one registration per user.
pub struct IdentityResolver<S, G> {
    store: Arc<S>,
    registry: Arc<G>,
    locks: Arc<InMemoryLockManager>,
}

impl<S: InstanceStore, G: RegistryGateway> IdentityResolver<S, G> {
    pub fn new(store: Arc<S>, registry: Arc<G>, locks: Arc<InMemoryLockManager>) -> Self {
        Self {
            store,
            registry,
            locks,
        }
    }

    /// Cached context id for the caller, registering them if there is none.
    pub fn resolve_context(&self, caller: &Caller) -> Result<String, ServiceError> {
        caller.validate()?;
        let user_id = caller.user_id.as_str();

        if let Some(context_id) = self.cached(user_id)? {
            debug!(user_id, "context cache hit");
            return Ok(context_id);
        }

        // held across the registry call: at most one registration per user
        let _guard = self.locks.acquire(&format!("identity:{}", user_id))?;

        // another resolution may have finished while we waited
        if let Some(context_id) = self.cached(user_id)? {
            return Ok(context_id);
        }

        let (given_name, family_name) = split_name(&caller.display_name);
        let registration = Registration {
            external_uid: caller.external_uid.clone(),
            given_name,
            family_name,
            email: caller.email.clone(),
        };

        let context_id = self
            .registry
            .register_user(&registration)
            .map_err(|e| resolution_error(user_id, e.into()))?;

        let mapping = IdentityMapping {
            user_id: user_id.to_string(),
            context_id: context_id.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.put_context_id(&mapping) {
            // registry now holds an identity we have no record of
            error!(user_id, context_id = %context_id, error = %e, "failed to persist identity mapping");
            return Err(resolution_error(user_id, e.into()));
        }

        info!(user_id, context_id = %context_id, "registered catalog identity");
        Ok(context_id)
    }

    fn cached(&self, user_id: &str) -> Result<Option<String>, ServiceError> {
        let cached = self
            .store
            .get_context_id(user_id)
            .map_err(|e| resolution_error(user_id, e.into()))?;
        Ok(cached.filter(|id| !id.is_empty()))
    }
}

fn resolution_error(user_id: &str, source: ServiceError) -> ServiceError {
    ServiceError::Resolution {
        user_id: user_id.to_string(),
        source: Box::new(source),
    }
}
