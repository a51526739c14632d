use crate::bitbucket::Dialect;
use crate::config::{BitbucketSettings, FetchPolicy};
use crate::errors::{ReporterError, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, trace};

/// Authenticated HTTP session against one Bitbucket instance.
///
/// Requests take absolute URLs because pagination hands back fully formed
/// `next` links.
pub struct BitbucketClient {
    client: Client,
    settings: BitbucketSettings,
    error_body_limit: usize,
}

impl BitbucketClient {
    /// Create a new Bitbucket client
    pub fn new(settings: BitbucketSettings, policy: &FetchPolicy) -> Result<Self> {
        settings.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&settings.auth_header())
                .map_err(|e| ReporterError::config(format!("Invalid auth header: {}", e)))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(policy.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ReporterError::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            settings,
            error_body_limit: policy.error_body_limit,
        })
    }

    pub fn dialect(&self) -> Dialect {
        self.settings.dialect()
    }

    /// Domain without trailing slashes
    pub fn base_url(&self) -> &str {
        self.settings.base_url()
    }

    /// Make a GET request to the Bitbucket API
    pub async fn get<T>(&self, url: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ReporterError::network(format!("GET {} failed: {}", url, e)))?;

        self.handle_response(url, response).await
    }

    /// Make a POST request to the Bitbucket API
    pub async fn post<T, U>(&self, url: &str, body: &T) -> Result<U>
    where
        T: Serialize,
        U: DeserializeOwned,
    {
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ReporterError::network(format!("POST {} failed: {}", url, e)))?;

        self.handle_response(url, response).await
    }

    /// Handle HTTP response and deserialize JSON
    async fn handle_response<T>(&self, url: &str, response: reqwest::Response) -> Result<T>
    where
        T: DeserializeOwned,
    {
        let status = response.status();

        if status.is_success() {
            let text = response.text().await.map_err(|e| {
                ReporterError::network(format!("Failed to read response body: {}", e))
            })?;

            trace!("Response body: {}", text);

            serde_json::from_str(&text).map_err(|e| {
                ReporterError::validation(format!(
                    "Failed to parse JSON response from {}: {}",
                    url, e
                ))
            })
        } else {
            let is_json = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.contains("json"))
                .unwrap_or(false);
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable response body>".to_string());

            Err(ReporterError::transport(
                url,
                status.as_u16(),
                describe_error_body(&text, is_json, self.error_body_limit),
            ))
        }
    }
}

/// Pretty-print JSON error bodies; truncate anything else to `limit` characters
pub fn describe_error_body(text: &str, is_json: bool, limit: usize) -> String {
    if is_json {
        if let Ok(pretty) = serde_json::from_str::<serde_json::Value>(text)
            .and_then(|value| serde_json::to_string_pretty(&value))
        {
            return pretty;
        }
    }

    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(limit).collect();
        format!("{}... (truncated)", truncated)
    }
}
