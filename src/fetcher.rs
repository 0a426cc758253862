use reqwest::Client;
use std::time::Duration;

use crate::Result;
use crate::config::FetcherConfig;

/// Issues timed HTTP GETs for product pages. Every request carries the
/// configured User-Agent and is bounded by the configured timeout; any
/// transport error, timeout, non-2xx status, or undecodable body aborts only
/// the current product's check.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AppError;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> FetcherConfig {
        FetcherConfig {
            timeout: 5,
            user_agent: "Mozilla/5.0 (StockChecker)".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product/1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&test_config()).unwrap();
        let body = fetcher
            .fetch(&format!("{}/product/1", server.uri()))
            .await
            .unwrap();

        assert_eq!(body, "<html>hello</html>");
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product/1"))
            .and(header("user-agent", "Mozilla/5.0 (StockChecker)"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&test_config()).unwrap();
        fetcher
            .fetch(&format!("{}/product/1", server.uri()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_server_error_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/product/1"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&test_config()).unwrap();
        let result = fetcher.fetch(&format!("{}/product/1", server.uri())).await;

        assert!(matches!(result, Err(AppError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_fetch_unreachable_host_is_failure() {
        let fetcher = PageFetcher::new(&test_config()).unwrap();
        // Reserved port on localhost, nothing listening
        let result = fetcher.fetch("http://127.0.0.1:9/product").await;

        assert!(matches!(result, Err(AppError::Fetch(_))));
    }
}
