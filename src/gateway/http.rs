//! Shared blocking JSON client used by the catalog and registry gateways.

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::Url;
use serde::de::DeserializeOwned;

use super::GatewayError;
use crate::config::UpstreamConfig;

/// Longest upstream error body kept in a `GatewayError::Status`.
const MAX_ERROR_BODY: usize = 512;

pub(crate) struct JsonClient {
    service: &'static str,
    base_url: Url,
    api_key: Option<String>,
    client: Client,
}

impl JsonClient {
    pub(crate) fn new(service: &'static str, config: &UpstreamConfig) -> Result<Self, GatewayError> {
        let base_url = Url::parse(&config.base_url).map_err(|e| GatewayError::Config {
            service,
            message: format!("base url {:?}: {}", config.base_url, e),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::Config {
                service,
                message: format!("base url {:?} cannot carry a path", config.base_url),
            });
        }
        if config.timeout_secs == 0 {
            return Err(GatewayError::Config {
                service,
                message: "timeout_secs must be at least 1".into(),
            });
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config {
                service,
                message: e.to_string(),
            })?;

        Ok(Self {
            service,
            base_url,
            api_key: config.api_key.clone(),
            client,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    pub(crate) fn url(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Config {
                service: self.service,
                message: "base url cannot carry a path".into(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn get(&self, segments: &[&str]) -> Result<RequestBuilder, GatewayError> {
        Ok(self.authorize(self.client.get(self.url(segments)?)))
    }

    pub(crate) fn post(&self, segments: &[&str]) -> Result<RequestBuilder, GatewayError> {
        Ok(self.authorize(self.client.post(self.url(segments)?)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Send and require a 2xx status.
    pub(crate) fn send(&self, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().map_err(|e| GatewayError::Transport {
            service: self.service,
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let mut cut = MAX_ERROR_BODY;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(GatewayError::Status {
                service: self.service,
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Send, require a 2xx status, and decode the JSON body.
    pub(crate) fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self.send(request)?;
        response.json::<T>().map_err(|e| GatewayError::Decode {
            service: self.service,
            message: e.to_string(),
        })
    }
}
