//! HTTP transport for a deployment API.
//!
//! Both the source and the target deployment expose the same REST surface;
//! one [`ApiClient`] is constructed per deployment. The client distinguishes
//! the "not found" condition from other failures so that callers can treat
//! an unsynchronized target as an empty resource set.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{header, Client, Method, StatusCode};
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::{ConfigError, Result, TransportError};

use super::resource::{Resource, ResourceSet};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Characters escaped when a value is embedded as one URL path segment.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

/// Percent-encodes a resource identity for use as one URL path segment.
///
/// Identities come straight from resource fields; a title containing a
/// space or a slash must not change the shape of the request path.
#[must_use]
pub fn encode_segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT).to_string()
}

/// Client for one deployment's REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// HTTP client.
    client: Client,
    /// Base URL of the deployment, without a trailing slash.
    base_url: String,
    /// Bearer token.
    token: String,
}

impl ApiClient {
    /// Creates a new deployment API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint URL is not http(s) or the HTTP
    /// client cannot be created.
    pub fn new(base_url: &str, token: &str) -> Result<Self> {
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidEndpoint {
                url: base_url.to_string(),
            }
            .into());
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| TransportError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    /// Returns the deployment endpoint this client talks to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    /// Fetches a resource set from the deployment.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success response, including 404.
    pub async fn get_set(&self, path: &str) -> Result<ResourceSet> {
        let response = self.send(Method::GET, path, None).await?;
        Self::decode(path, response).await
    }

    /// Fetches a resource set, treating "not found" as an empty set.
    ///
    /// A target that has never been synchronized may lack the container of
    /// the requested set entirely; that must not abort the run.
    ///
    /// # Errors
    ///
    /// Returns an error on any non-success response other than 404.
    pub async fn get_set_or_empty(&self, path: &str) -> Result<ResourceSet> {
        match self.get_set(path).await {
            Ok(set) => Ok(set),
            Err(e) if e.is_not_found() => {
                debug!("Treating missing {path} as an empty resource set");
                Ok(ResourceSet::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Creates a resource on the deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a
    /// JSON object.
    pub async fn post(&self, path: &str, body: &Resource) -> Result<Resource> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::decode(path, response).await
    }

    /// Replaces a resource on the deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is not a
    /// JSON object.
    pub async fn put(&self, path: &str, body: &Resource) -> Result<Resource> {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        Self::decode(path, response).await
    }

    /// Removes a resource from the deployment.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Sends one request and triages the response status.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Resource>,
    ) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);
        trace!("{method} {url}");

        let mut request = self
            .client
            .request(method, &url)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token));

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            TransportError::network(format!("Request to {url} failed: {e}"))
        })?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound {
                path: path.to_string(),
            }
            .into());
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(TransportError::AuthenticationFailed {
                endpoint: self.base_url.clone(),
                message: String::from("Invalid or expired token"),
            }
            .into());
        }

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(TransportError::api_error(status.as_u16(), path, message).into());
        }

        Ok(response)
    }

    /// Decodes a successful response body.
    async fn decode<T: serde::de::DeserializeOwned>(
        path: &str,
        response: reqwest::Response,
    ) -> Result<T> {
        response.json().await.map_err(|e| {
            TransportError::invalid_response(path, format!("Failed to parse response: {e}")).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_segment_escapes_separators() {
        assert_eq!(encode_segment("weekly reports"), "weekly%20reports");
        assert_eq!(encode_segment("a/b"), "a%2Fb");
        assert_eq!(encode_segment("100%"), "100%25");
    }

    #[test]
    fn test_encode_segment_leaves_plain_identities_alone() {
        assert_eq!(encode_segment("fn-42_v2.1"), "fn-42_v2.1");
    }

    #[test]
    fn test_non_http_endpoint_is_rejected() {
        assert!(ApiClient::new("ftp://example.com", "token").is_err());
    }
}
