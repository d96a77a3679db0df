use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Model;

/// Cached association between a local user and their catalog context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMapping {
    pub user_id: String,
    pub context_id: String,
    pub created_at: DateTime<Utc>,
}

impl Model for IdentityMapping {
    const COLLECTION: &'static str = "identity_mappings";

    fn id(&self) -> &str {
        &self.user_id
    }
}
