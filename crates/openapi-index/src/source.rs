//! Where API description text comes from

use async_trait::async_trait;
use tracing::info;

use crate::error::{LoadError, LoadResult};

/// Supplies raw description text for a location.
///
/// The store only needs text; the default implementation reads local files
/// and fetches `http(s)` URLs.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn read(&self, location: &str) -> LoadResult<String>;
}

/// Local files plus `http`/`https` URLs
pub struct DefaultSource {
    client: reqwest::Client,
}

impl DefaultSource {
    pub fn new() -> LoadResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| LoadError::FetchError(e.to_string()))?;
        Ok(Self { client })
    }

    fn remote_url(location: &str) -> Option<url::Url> {
        url::Url::parse(location)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https"))
    }

    async fn fetch(&self, url: url::Url) -> LoadResult<String> {
        info!("Fetching API description from: {}", url);

        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json, application/yaml, text/yaml")
            .send()
            .await
            .map_err(|e| LoadError::FetchError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LoadError::FetchError(format!(
                "HTTP {} from {}",
                response.status(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| LoadError::FetchError(e.to_string()))
    }
}

#[async_trait]
impl DocumentSource for DefaultSource {
    async fn read(&self, location: &str) -> LoadResult<String> {
        if let Some(url) = Self::remote_url(location) {
            return self.fetch(url).await;
        }

        tokio::fs::read_to_string(location)
            .await
            .map_err(|source| LoadError::Unreadable {
                path: location.to_string(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_url_detection() {
        assert!(DefaultSource::remote_url("https://example.com/openapi.yaml").is_some());
        assert!(DefaultSource::remote_url("http://localhost:8080/spec.json").is_some());
        assert!(DefaultSource::remote_url("/tmp/openapi.yaml").is_none());
        assert!(DefaultSource::remote_url("specs/openapi.yaml").is_none());
        assert!(DefaultSource::remote_url("file:///tmp/openapi.yaml").is_none());
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let source = DefaultSource::new().unwrap();
        let result = source.read("/definitely/not/here/openapi.yaml").await;
        assert!(matches!(result, Err(LoadError::Unreadable { .. })));
    }
}
