use serde::Deserialize;
use tracing::debug;

use super::http::JsonClient;
use super::{GatewayError, Registration, RegistryGateway};
use crate::config::UpstreamConfig;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationResponse {
    #[serde(default)]
    context_id: Option<String>,
}

/// HTTP/JSON client for the identity-registration service.
///
/// `POST users` with a camelCase [`Registration`] body, answered by
/// `{"contextId": "..."}`.
pub struct HttpRegistryClient {
    http: JsonClient,
}

impl HttpRegistryClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, GatewayError> {
        Ok(Self {
            http: JsonClient::new("registry", config)?,
        })
    }
}

impl RegistryGateway for HttpRegistryClient {
    fn register_user(&self, registration: &Registration) -> Result<String, GatewayError> {
        debug!(external_uid = %registration.external_uid, "registry: register user");
        let request = self.http.post(&["users"])?.json(registration);
        let response: RegistrationResponse = self.http.send_json(request)?;

        match response.context_id {
            Some(id) if !id.trim().is_empty() => Ok(id),
            _ => Err(GatewayError::MissingIdentifier),
        }
    }
}
