use crate::config::Config;
use crate::error::{ProviderError, Result};
use crate::generic::{GraphRequest, HttpMethod};
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com";
pub const DEFAULT_API_VERSION: &str = "beta";

/// Default retry configuration
pub const DEFAULT_MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF_MS: u64 = 1000;
const MAX_BACKOFF_MS: u64 = 30000;
const JITTER_FACTOR: f64 = 0.3; // +/- 30% jitter

/// Calculate backoff with jitter for exponential backoff
fn calculate_backoff_with_jitter(attempt: u32) -> Duration {
    let base_backoff = INITIAL_BACKOFF_MS * 2u64.pow(attempt);
    let capped_backoff = base_backoff.min(MAX_BACKOFF_MS);

    let jitter_range = (capped_backoff as f64 * JITTER_FACTOR) as u64;
    let jitter = if jitter_range > 0 {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        std::time::SystemTime::now().hash(&mut hasher);
        (hasher.finish() % (jitter_range * 2)) as i64 - jitter_range as i64
    } else {
        0
    };

    let final_backoff = (capped_backoff as i64 + jitter).max(100) as u64;
    Duration::from_millis(final_backoff)
}

/// Seconds from a `Retry-After` header, falling back to the initial backoff
fn retry_after(resp: &reqwest::Response) -> Duration {
    let secs = resp
        .headers()
        .get("Retry-After")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(INITIAL_BACKOFF_MS / 1000);
    Duration::from_secs(secs)
}

/// Graph API client with retry support
pub struct GraphClient {
    client: Client,
    access_token: String,
    base_url: String,
    api_version: String,
    max_retries: u32,
}

impl GraphClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Client::new(),
            access_token,
            base_url: GRAPH_BASE_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Client for the endpoint, API version and retry budget in `config`
    pub fn from_config(config: &Config, access_token: String) -> Self {
        Self::new(access_token)
            .with_base_url(&config.graph_base_url)
            .with_api_version(&config.api_version)
            .with_max_retries(config.max_retries)
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_api_version(mut self, api_version: &str) -> Self {
        self.api_version = api_version.trim_matches('/').to_string();
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// e.g. `https://graph.microsoft.com/beta`
    pub fn api_root(&self) -> String {
        format!("{}/{}", self.base_url, self.api_version)
    }

    fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.api_root(), endpoint.trim_start_matches('/'))
        }
    }

    pub async fn get(&self, endpoint: &str) -> Result<Value> {
        let url = self.url_for(endpoint);
        Ok(self
            .send_with_retry(Method::GET, &url, None)
            .await?
            .unwrap_or(Value::Null))
    }

    /// GET and deserialize into a typed response
    pub async fn get_as<T: for<'de> Deserialize<'de>>(&self, endpoint: &str) -> Result<T> {
        let value = self.get(endpoint).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Option<Value>> {
        let url = self.url_for(endpoint);
        self.send_with_retry(Method::POST, &url, Some(body)).await
    }

    pub async fn patch(&self, endpoint: &str, body: &Value) -> Result<Option<Value>> {
        let url = self.url_for(endpoint);
        self.send_with_retry(Method::PATCH, &url, Some(body)).await
    }

    pub async fn put(&self, endpoint: &str, body: &Value) -> Result<Option<Value>> {
        let url = self.url_for(endpoint);
        self.send_with_retry(Method::PUT, &url, Some(body)).await
    }

    pub async fn delete(&self, endpoint: &str) -> Result<()> {
        let url = self.url_for(endpoint);
        self.send_with_retry(Method::DELETE, &url, None).await?;
        Ok(())
    }

    /// Send a prepared request; `None` for responses without a body
    pub async fn execute(&self, request: &GraphRequest) -> Result<Option<Value>> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Patch => Method::PATCH,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };
        tracing::debug!("{}", request);
        let url = self.url_for(&request.uri);
        self.send_with_retry(method, &url, request.body.as_ref()).await
    }

    /// Retry on 429 (honouring Retry-After), 5xx and connection errors
    async fn send_with_retry(&self, method: Method, url: &str, body: Option<&Value>) -> Result<Option<Value>> {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            let last_attempt = attempt + 1 >= self.max_retries;
            let mut builder = self
                .client
                .request(method.clone(), url)
                .bearer_auth(&self.access_token);
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let resp = match builder.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if !last_attempt {
                        let wait_time = calculate_backoff_with_jitter(attempt);
                        tracing::warn!(
                            "Connection error: {}. Retrying in {:?}... (attempt {}/{})",
                            e,
                            wait_time,
                            attempt + 1,
                            self.max_retries
                        );
                        tokio::time::sleep(wait_time).await;
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e.into());
                }
            };

            let status = resp.status();

            if status == StatusCode::TOO_MANY_REQUESTS && !last_attempt {
                let wait_time = retry_after(&resp);
                tracing::warn!(
                    "Rate limited (429). Retrying in {:?}... (attempt {}/{})",
                    wait_time,
                    attempt + 1,
                    self.max_retries
                );
                tokio::time::sleep(wait_time).await;
                continue;
            }

            if status.is_server_error() && !last_attempt {
                let wait_time = calculate_backoff_with_jitter(attempt);
                tracing::warn!(
                    "Server error ({}). Retrying in {:?}... (attempt {}/{})",
                    status,
                    wait_time,
                    attempt + 1,
                    self.max_retries
                );
                tokio::time::sleep(wait_time).await;
                continue;
            }

            let text = resp.text().await?;

            if !status.is_success() {
                return Err(ProviderError::GraphApiError {
                    status: status.as_u16(),
                    message: crate::error::enhance_graph_error(&text),
                });
            }

            if text.trim().is_empty() {
                return Ok(None);
            }
            return Ok(Some(serde_json::from_str(&text)?));
        }

        Err(last_error.map(|e| e.into()).unwrap_or_else(|| ProviderError::GraphApiError {
            status: 0,
            message: format!("{} {} failed after {} retries", method, url, self.max_retries),
        }))
    }
}

// ============================================================================
// Pagination Helpers
// ============================================================================

/// Generic paginated response from Graph API
#[derive(Debug, Deserialize)]
pub struct PaginatedResponse<T> {
    pub value: Vec<T>,
    #[serde(rename = "@odata.nextLink")]
    pub next_link: Option<String>,
    #[serde(rename = "@odata.count")]
    pub count: Option<i64>,
}

impl GraphClient {
    /// Fetch all pages of a collection, following `@odata.nextLink`
    pub async fn get_all_pages(&self, endpoint: &str) -> Result<Vec<Value>> {
        let mut all_items = Vec::new();
        let mut current_url = self.url_for(endpoint);

        loop {
            let response: PaginatedResponse<Value> = self.get_as(&current_url).await?;
            all_items.extend(response.value);

            match response.next_link {
                Some(next) => current_url = next,
                None => break,
            }
        }

        Ok(all_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_capped() {
        let wait = calculate_backoff_with_jitter(10);
        assert!(wait <= Duration::from_millis((MAX_BACKOFF_MS as f64 * (1.0 + JITTER_FACTOR)) as u64));
        assert!(wait >= Duration::from_millis(100));
    }

    #[test]
    fn test_url_for() {
        let client = GraphClient::new("token".into()).with_base_url("http://localhost:8080/");
        assert_eq!(client.api_root(), "http://localhost:8080/beta");
        assert_eq!(client.url_for("/groups"), "http://localhost:8080/beta/groups");
        assert_eq!(client.url_for("groups/1"), "http://localhost:8080/beta/groups/1");
        assert_eq!(
            client.url_for("https://graph.microsoft.com/beta/groups?$skiptoken=x"),
            "https://graph.microsoft.com/beta/groups?$skiptoken=x"
        );
    }

    #[test]
    fn test_api_version_override() {
        let client = GraphClient::new("token".into()).with_api_version("v1.0");
        assert_eq!(client.api_root(), "https://graph.microsoft.com/v1.0");
    }
}
