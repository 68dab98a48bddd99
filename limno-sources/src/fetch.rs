//! The HTTP boundary: one GET per call, no retries.

use limno_data::error::{LimnoError, Result};
use log::info;
use serde::de::DeserializeOwned;
use std::future::Future;

/// Status, final URL and body of one GET.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub url: String,
    pub body: Vec<u8>,
}

/// Anything that can perform a GET. The live implementation is
/// [`ReqwestFetcher`]; tests substitute canned responses.
pub trait HttpFetch {
    fn get(&self, url: &str) -> impl Future<Output = Result<RawResponse>> + Send;
}

/// GET `url`, failing unless the status is exactly 200.
pub async fn fetch_checked<F: HttpFetch>(client: &F, url: &str) -> Result<RawResponse> {
    info!("Fetching {}", url);
    let response = client.get(url).await?;
    if response.status != 200 {
        return Err(LimnoError::Fetch {
            status: response.status,
            url: url.to_string(),
        });
    }
    Ok(response)
}

/// GET `url` and decode the body as JSON.
pub async fn fetch_json<F: HttpFetch, T: DeserializeOwned>(client: &F, url: &str) -> Result<T> {
    let response = fetch_checked(client, url).await?;
    Ok(serde_json::from_slice(&response.body)?)
}

/// Default deadline for a single request.
#[cfg(feature = "api")]
pub const DEFAULT_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// reqwest-backed fetcher with a per-request timeout.
#[cfg(feature = "api")]
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

#[cfg(feature = "api")]
impl ReqwestFetcher {
    pub fn new(timeout: std::time::Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LimnoError::Http(e.to_string()))?;
        Ok(ReqwestFetcher { client })
    }
}

#[cfg(feature = "api")]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<RawResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| LimnoError::Http(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| LimnoError::Http(e.to_string()))?;
        Ok(RawResponse {
            status,
            url: url.to_string(),
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;

    /// Canned responses keyed by URL; anything else is a 404.
    #[derive(Default)]
    pub struct MockFetcher {
        pub responses: HashMap<String, (u16, Vec<u8>)>,
    }

    impl MockFetcher {
        pub fn with(mut self, url: &str, status: u16, body: &str) -> Self {
            self.responses
                .insert(url.to_string(), (status, body.as_bytes().to_vec()));
            self
        }
    }

    impl HttpFetch for MockFetcher {
        async fn get(&self, url: &str) -> Result<RawResponse> {
            let (status, body) = self
                .responses
                .get(url)
                .cloned()
                .unwrap_or((404, Vec::new()));
            Ok(RawResponse {
                status,
                url: url.to_string(),
                body,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MockFetcher;
    use super::*;

    #[tokio::test]
    async fn test_not_found_is_a_fetch_error() {
        let client = MockFetcher::default();
        let result = fetch_checked(&client, "https://example.org/missing").await;
        match result {
            Err(LimnoError::Fetch { status, url }) => {
                assert_eq!(status, 404);
                assert_eq!(url, "https://example.org/missing");
            }
            other => panic!("expected fetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_is_not_swallowed() {
        let client = MockFetcher::default().with("https://example.org/a", 500, "[]");
        let result: Result<Vec<i32>> = fetch_json(&client, "https://example.org/a").await;
        assert!(matches!(result, Err(LimnoError::Fetch { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_fetch_json_decodes_body() {
        let client = MockFetcher::default().with("https://example.org/a", 200, "[1, 2, 3]");
        let values: Vec<i32> = fetch_json(&client, "https://example.org/a").await.unwrap();
        assert_eq!(values, vec![1, 2, 3]);
    }
}
