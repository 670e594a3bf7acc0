//! HTTP client wrapper for the registry API.
//!
//! Wraps a `reqwest::Client` with the server base URL and bearer token.
//! Package and version are pushed as URL path segments, so reserved
//! characters percent-encode and round-trip unharmed.

use anyhow::{anyhow, Context, Result};
use depot_core::{Package, UploadResponse};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Response, StatusCode, Url};
use serde::Deserialize;

/// Registry API client.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base: Url,
    token: String,
}

impl Client {
    pub fn new(server: &str, token: &str) -> Result<Self> {
        let base = Url::parse(server).with_context(|| format!("invalid server URL {server}"))?;
        // Schemes like mailto: or data: parse but have no path segments
        // to extend; rejecting them here keeps api_url infallible.
        if base.cannot_be_a_base() {
            return Err(anyhow!("invalid server URL {server}: not an http(s) endpoint"));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            base,
            token: token.to_string(),
        })
    }

    fn api_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .expect("base URL is validated in Client::new to support path segments");
            path.pop_if_empty();
            path.extend(["api", "v1"]);
            path.extend(segments);
        }
        url
    }

    /// `/api/v1/artifacts/{package}/{version}` with encoded segments.
    pub fn artifact_url(&self, package: &str, version: &str) -> Url {
        self.api_url(&["artifacts", package, version])
    }

    /// `/api/v1/packages`, optionally with a `search` query.
    pub fn packages_url(&self, search: Option<&str>) -> Url {
        let mut url = self.api_url(&["packages"]);
        if let Some(query) = search {
            url.query_pairs_mut().append_pair("search", query);
        }
        url
    }

    /// Upload a request body of known length; 201 expected.
    pub async fn upload(
        &self,
        package: &str,
        version: &str,
        length: u64,
        body: reqwest::Body,
    ) -> Result<UploadResponse> {
        let response = self
            .http
            .post(self.artifact_url(package, version))
            .bearer_auth(&self.token)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(response_error(response).await);
        }
        Ok(response.json().await.context("decoding upload response")?)
    }

    /// Start a download; the caller streams the returned response body.
    pub async fn download(&self, package: &str, version: &str) -> Result<Response> {
        let response = self
            .http
            .get(self.artifact_url(package, version))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(response_error(response).await);
        }
        Ok(response)
    }

    /// List all packages, or search by name substring.
    pub async fn list_packages(&self, search: Option<&str>) -> Result<Vec<Package>> {
        let response = self
            .http
            .get(self.packages_url(search))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(response_error(response).await);
        }
        Ok(response.json().await.context("decoding package list")?)
    }

    /// Delete one artifact version.
    pub async fn delete(&self, package: &str, version: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.artifact_url(package, version))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            return Err(response_error(response).await);
        }
        Ok(())
    }
}

/// Turn a non-2xx response into an error, preferring the server's JSON
/// `message` field and falling back to the raw body.
async fn response_error(response: Response) -> anyhow::Error {
    let status = response.status();
    let body = response.bytes().await.unwrap_or_default();

    if body.is_empty() {
        return anyhow!(
            "server returned HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("unknown error")
        );
    }

    #[derive(Deserialize)]
    struct ErrorMessage {
        message: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_slice::<ErrorMessage>(&body) {
        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            return anyhow!("server returned HTTP {}: {}", status.as_u16(), message);
        }
    }

    anyhow!(
        "server returned HTTP {}: {}",
        status.as_u16(),
        String::from_utf8_lossy(&body).trim()
    )
}
