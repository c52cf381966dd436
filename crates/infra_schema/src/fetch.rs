//! Remote schema download with bounded retry
//!
//! Each request is bounded by the configured timeout. Transport failures and
//! 5xx/408/429 answers are retried with exponential backoff until the attempt
//! budget is spent; other statuses fail immediately. Bodies are read in chunks
//! and abandoned once they pass the configured size cap.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::SchemaProvisionerConfig;
use crate::error::{FetchError, ProvisionerError};

#[derive(Debug, Clone)]
pub struct SchemaFetcher {
    client: reqwest::Client,
    url: String,
    max_attempts: u32,
    retry_delay: Duration,
    max_bytes: u64,
}

impl SchemaFetcher {
    pub fn new(config: &SchemaProvisionerConfig) -> Result<Self, ProvisionerError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(concat!("tiss-codec/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ProvisionerError::HttpClient)?;
        Ok(Self {
            client,
            url: config.url.clone(),
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay,
            max_bytes: config.max_schema_bytes,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Downloads the schema text
    pub async fn fetch(&self) -> Result<String, FetchError> {
        if self.url.trim().is_empty() {
            return Err(FetchError::Disabled);
        }

        let mut attempt = 1;
        loop {
            let started = Instant::now();
            match self.fetch_once().await {
                Ok(text) => {
                    debug!(
                        attempt,
                        bytes = text.len(),
                        duration_ms = started.elapsed().as_millis() as u64,
                        "Schema downloaded"
                    );
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < self.max_attempts => {
                    let delay = self.retry_delay * 2u32.saturating_pow(attempt - 1);
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Schema download failed, retrying in {delay:?}"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_once(&self) -> Result<String, FetchError> {
        let mut response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        let limit = self.max_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(FetchError::TooLarge { limit });
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(FetchError::TooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }
        let text = String::from_utf8_lossy(&body).into_owned();
        if text.trim().is_empty() {
            return Err(FetchError::EmptyBody);
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(url: String) -> SchemaProvisionerConfig {
        SchemaProvisionerConfig::new(url)
            .timeout(Duration::from_millis(500))
            .retry_delay(Duration::from_millis(10))
            .max_attempts(3)
    }

    #[tokio::test]
    async fn test_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/tiss.xsd"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/tiss.xsd"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<xs:schema/>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = SchemaFetcher::new(&config(format!("{}/tiss.xsd", server.uri()))).unwrap();
        assert_eq!(fetcher.fetch().await.unwrap(), "<xs:schema/>");
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = SchemaFetcher::new(&config(format!("{}/tiss.xsd", server.uri()))).unwrap();
        let error = fetcher.fetch().await.unwrap_err();
        assert!(matches!(error, FetchError::Status { status: 404 }));
    }

    #[tokio::test]
    async fn test_gives_up_after_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let fetcher = SchemaFetcher::new(&config(format!("{}/tiss.xsd", server.uri()))).unwrap();
        assert!(matches!(
            fetcher.fetch().await.unwrap_err(),
            FetchError::Status { status: 500 }
        ));
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(2048)))
            .expect(1)
            .mount(&server)
            .await;

        let config = config(format!("{}/tiss.xsd", server.uri())).max_schema_bytes(1024);
        let fetcher = SchemaFetcher::new(&config).unwrap();
        assert!(matches!(
            fetcher.fetch().await.unwrap_err(),
            FetchError::TooLarge { limit: 1024 }
        ));
    }

    #[tokio::test]
    async fn test_body_at_the_cap_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("y".repeat(1024)))
            .mount(&server)
            .await;

        let config = config(format!("{}/tiss.xsd", server.uri())).max_schema_bytes(1024);
        let fetcher = SchemaFetcher::new(&config).unwrap();
        assert_eq!(fetcher.fetch().await.unwrap().len(), 1024);
    }

    #[tokio::test]
    async fn test_empty_url_is_disabled() {
        let fetcher = SchemaFetcher::new(&config(String::new())).unwrap();
        assert!(matches!(fetcher.fetch().await.unwrap_err(), FetchError::Disabled));
    }
}
