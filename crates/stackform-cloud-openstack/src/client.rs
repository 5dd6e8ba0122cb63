//! HTTP client for OpenStack service endpoints
//!
//! Thin wrapper over `reqwest` that attaches the auth token and maps HTTP
//! error codes onto the provider error taxonomy, so callers and the retry
//! predicate only ever see [`OpenStackError`] kinds.

use crate::error::{OpenStackError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Client for one OpenStack service endpoint
#[derive(Debug, Clone)]
pub struct ServiceClient {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

impl ServiceClient {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            http: reqwest::Client::new(),
            endpoint,
            token: token.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    /// GET `path` and decode the JSON body.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        let response = self
            .http
            .get(self.url(path))
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;

        let response = check_status(response, kind, id).await?;
        Ok(response.json().await?)
    }

    /// POST `body` to `path` and decode the JSON response.
    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        tracing::debug!("POST {}", path);
        let response = self
            .http
            .post(self.url(path))
            .header("X-Auth-Token", &self.token)
            .json(body)
            .send()
            .await?;

        let response = check_status(response, kind, id).await?;
        Ok(response.json().await?)
    }

    /// POST `body` to `path`, ignoring any response body. For action-style
    /// endpoints that answer 202 with no content.
    pub async fn post_action<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        kind: &'static str,
        id: &str,
    ) -> Result<()> {
        tracing::debug!("POST {}", path);
        let response = self
            .http
            .post(self.url(path))
            .header("X-Auth-Token", &self.token)
            .json(body)
            .send()
            .await?;

        check_status(response, kind, id).await?;
        Ok(())
    }

    /// PUT `body` to `path` and decode the JSON response.
    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        kind: &'static str,
        id: &str,
    ) -> Result<T> {
        tracing::debug!("PUT {}", path);
        let response = self
            .http
            .put(self.url(path))
            .header("X-Auth-Token", &self.token)
            .json(body)
            .send()
            .await?;

        let response = check_status(response, kind, id).await?;
        Ok(response.json().await?)
    }

    /// DELETE `path`, ignoring any response body.
    pub async fn delete(&self, path: &str, kind: &'static str, id: &str) -> Result<()> {
        tracing::debug!("DELETE {}", path);
        let response = self
            .http
            .delete(self.url(path))
            .header("X-Auth-Token", &self.token)
            .send()
            .await?;

        check_status(response, kind, id).await?;
        Ok(())
    }
}

/// Map HTTP error codes onto the error taxonomy. 409 is the conflict class
/// the mutation retry absorbs; everything else surfaces as-is.
async fn check_status(
    response: reqwest::Response,
    kind: &'static str,
    id: &str,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(OpenStackError::AuthenticationFailed(message)),
        404 => Err(OpenStackError::NotFound {
            kind,
            id: id.to_string(),
        }),
        409 => Err(OpenStackError::Conflict(format!("{kind} {id}: {message}"))),
        code => Err(OpenStackError::Api {
            status: code,
            message,
        }),
    }
}
