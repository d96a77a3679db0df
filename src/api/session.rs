//! Session variables carried with a command (caller identity headers).

use std::collections::HashMap;

use crate::identity::Caller;

pub const USER_ID: &str = "x-user-id";
pub const EXTERNAL_UID: &str = "x-external-uid";
pub const DISPLAY_NAME: &str = "x-display-name";
pub const EMAIL: &str = "x-email";

/// Parsed session variables from the incoming request.
///
/// The authenticating proxy in front of the service forwards the validated
/// identity as headers:
///
/// ```json
/// {
///   "x-user-id": "user-42",
///   "x-external-uid": "idp|8812",
///   "x-display-name": "Anna Schmidt",
///   "x-email": "anna@example.org"
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    variables: HashMap<String, String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a session from a map of variables. Keys are lowercased.
    pub fn from_map(variables: HashMap<String, String>) -> Self {
        Self {
            variables: variables
                .into_iter()
                .map(|(k, v)| (k.to_ascii_lowercase(), v))
                .collect(),
        }
    }

    /// Session for a bare user id, mostly useful in tests.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        let mut session = Self::new();
        session.set(USER_ID, user_id);
        session
    }

    pub fn user_id(&self) -> Option<&str> {
        self.get(USER_ID).filter(|v| !v.trim().is_empty())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.variables.get(key).map(|v| v.as_str())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables
            .insert(key.into().to_ascii_lowercase(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.variables.contains_key(key)
    }

    pub fn variables(&self) -> &HashMap<String, String> {
        &self.variables
    }

    /// The caller identity, or `None` without a user id. A missing external
    /// uid falls back to the user id.
    pub fn caller(&self) -> Option<Caller> {
        let user_id = self.user_id()?;
        let external_uid = self
            .get(EXTERNAL_UID)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(user_id);
        Some(Caller::new(user_id).with_profile(
            external_uid,
            self.get(DISPLAY_NAME).unwrap_or_default(),
            self.get(EMAIL).unwrap_or_default(),
        ))
    }
}
