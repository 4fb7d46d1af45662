//! HTTP client abstraction for testability

use std::time::Duration;

use super::types::{BoxFuture, ProviderError};

/// Default HTTP request timeout.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Default `User-Agent` header. Public geocoding services reject anonymous clients.
pub const DEFAULT_USER_AGENT: &str = concat!("wayfinder/", env!("CARGO_PKG_VERSION"));

/// Trait for async HTTP client operations.
///
/// This abstraction allows for dependency injection and easier testing
/// by enabling mock HTTP clients in tests.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an HTTP GET request.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>>;
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    pub fn new() -> Result<Self, ProviderError> {
        Self::with_settings(DEFAULT_HTTP_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Creates a new ReqwestClient with custom timeout and user agent.
    pub fn with_settings(timeout: Duration, user_agent: &str) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                ProviderError::HttpError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
        Box::pin(async move {
            let response = self.client.get(url).send().await.map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    ProviderError::Unavailable(format!("Request failed: {}", e))
                } else {
                    ProviderError::HttpError(format!("Request failed: {}", e))
                }
            })?;

            // Check HTTP status
            let status = response.status();
            if !status.is_success() {
                return Err(ProviderError::HttpError(format!(
                    "HTTP {} from {}",
                    status, url
                )));
            }

            // Read response body
            response
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| ProviderError::HttpError(format!("Failed to read response: {}", e)))
        })
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Mock HTTP client for testing.
    ///
    /// Responds to the first rule whose fragment occurs in the requested URL,
    /// and records every URL it was asked for.
    #[derive(Default)]
    pub struct MockAsyncHttpClient {
        pub rules: Vec<(String, Result<Vec<u8>, ProviderError>)>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MockAsyncHttpClient {
        pub fn respond(mut self, url_fragment: &str, body: &str) -> Self {
            self.rules
                .push((url_fragment.to_string(), Ok(body.as_bytes().to_vec())));
            self
        }

        pub fn fail(mut self, url_fragment: &str, error: ProviderError) -> Self {
            self.rules.push((url_fragment.to_string(), Err(error)));
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().clone()
        }
    }

    impl AsyncHttpClient for MockAsyncHttpClient {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>, ProviderError>> {
            self.requests.lock().push(url.to_string());
            let response = self
                .rules
                .iter()
                .find(|(fragment, _)| url.contains(fragment.as_str()))
                .map(|(_, response)| response.clone())
                .unwrap_or_else(|| Err(ProviderError::HttpError(format!("HTTP 404 from {}", url))));
            Box::pin(async move { response })
        }
    }

    #[tokio::test]
    async fn test_mock_client_success() {
        let mock = MockAsyncHttpClient::default().respond("example.com", "[1]");

        let result = mock.get("http://example.com/a").await;
        assert_eq!(result.unwrap(), b"[1]".to_vec());
        assert_eq!(mock.requested(), vec!["http://example.com/a".to_string()]);
    }

    #[tokio::test]
    async fn test_mock_client_unmatched_url_is_error() {
        let mock = MockAsyncHttpClient::default();

        let result = mock.get("http://example.com").await;
        assert!(result.is_err());
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::with_settings(Duration::from_secs(5), "wayfinder-test").is_ok());
    }
}
