use futures::StreamExt;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::util::UrlValidationError;

/// Upper bound on a provider response body.
pub(crate) const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("No API key configured")]
    MissingApiKey,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Malformed response: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidBaseUrl(#[from] UrlValidationError),
}

/// Shared HTTP client for both metadata providers.
///
/// Pooled and kept alive; the 30s request timeout is the only deadline any
/// provider call gets.
pub fn build_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(Duration::from_secs(30))
        .build()
}

/// Appends query parameters to an endpoint URL.
pub(crate) fn endpoint(
    base_url: &str,
    path: &str,
    params: &[(&str, String)],
) -> Result<Url, CatalogError> {
    let mut url = Url::parse(&format!("{}{}", base_url, path)).map_err(UrlValidationError::from)?;
    if !params.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
    }
    Ok(url)
}

/// Cache key for a request: path and non-secret parameters.
pub(crate) fn cache_key(provider: &str, path: &str, params: &[(&str, String)]) -> String {
    let query: Vec<String> = params
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    format!("{}:{}?{}", provider, path, query.join("&"))
}

/// GET a JSON document.
///
/// Network errors are stripped of their URL so credentials in the query
/// string never reach logs or the status bar.
pub(crate) async fn fetch_json(client: &reqwest::Client, url: Url) -> Result<Value, CatalogError> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()
        .await
        .map_err(|e| CatalogError::Network(e.without_url()))?;

    if !response.status().is_success() {
        return Err(CatalogError::HttpStatus(response.status().as_u16()));
    }

    let bytes = read_limited(response, MAX_RESPONSE_SIZE).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_limited(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, CatalogError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(CatalogError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| CatalogError::Network(e.without_url()))?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(CatalogError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_endpoint_encodes_params() {
        let url = endpoint(
            "https://api.themoviedb.org/3",
            "/search/multi",
            &[("query", "the thing & co".to_string()), ("page", "2".to_string())],
        )
        .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.themoviedb.org/3/search/multi?query=the+thing+%26+co&page=2"
        );
    }

    #[test]
    fn test_cache_key_format() {
        let key = cache_key("tmdb", "/trending/all/week", &[("page", "1".to_string())]);
        assert_eq!(key, "tmdb:/trending/all/week?page=1");
    }

    #[tokio::test]
    async fn test_fetch_json_http_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let url = Url::parse(&format!("{}/missing", mock_server.uri())).unwrap();
        let result = fetch_json(&client, url).await;
        assert!(matches!(result, Err(CatalogError::HttpStatus(404))));
    }

    #[tokio::test]
    async fn test_fetch_json_rejects_oversized_body() {
        let mock_server = MockServer::start().await;
        let body = "x".repeat(MAX_RESPONSE_SIZE + 1);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let url = Url::parse(&mock_server.uri()).unwrap();
        let result = fetch_json(&client, url).await;
        assert!(matches!(result, Err(CatalogError::ResponseTooLarge(_))));
    }

    #[tokio::test]
    async fn test_fetch_json_malformed_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&mock_server)
            .await;

        let client = reqwest::Client::new();
        let url = Url::parse(&mock_server.uri()).unwrap();
        let result = fetch_json(&client, url).await;
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }
}
