// src/services/details.rs

//! Company detail extraction service.
//!
//! Fetches a company page and turns its embedded state into a
//! [`DetailRecord`]. Each call is independent, so many can run at once.

use std::time::Duration;

use crate::error::Result;
use crate::models::{Config, DetailRecord, ExtractionJob};
use crate::services::payload::{ExtractionError, PayloadParser};
use crate::utils::http::{FetchError, Fetcher};

/// Service for extracting company details from detail pages.
pub struct DetailExtractor<F> {
    fetcher: F,
    parser: PayloadParser,
    max_retries: u32,
    retry_backoff: Duration,
}

impl<F: Fetcher> DetailExtractor<F> {
    /// Create a new extractor with the given fetcher and configuration.
    pub fn new(fetcher: F, config: &Config) -> Result<Self> {
        Ok(Self {
            fetcher,
            parser: PayloadParser::new(&config.extract)?,
            max_retries: config.crawler.max_retries,
            retry_backoff: Duration::from_millis(config.crawler.retry_backoff_ms),
        })
    }

    #[cfg(test)]
    pub(crate) fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and parse the page behind one job.
    pub async fn extract(
        &self,
        job: &ExtractionJob,
    ) -> std::result::Result<DetailRecord, ExtractionError> {
        let body = self.fetch_with_retry(&job.link).await?;
        self.parser.parse(&job.label, &job.link, &body)
    }

    /// Fetch `url`, retrying transient failures up to `max_retries` times.
    async fn fetch_with_retry(&self, url: &str) -> std::result::Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetcher.fetch(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    log::debug!(
                        "Retrying {} ({}/{}) after: {}",
                        url,
                        attempt,
                        self.max_retries,
                        e
                    );
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::services::payload::tests::company_page;

    /// Replays a queue of responses per URL.
    struct ScriptedFetcher {
        responses: Mutex<HashMap<String, Vec<std::result::Result<String, FetchError>>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedFetcher {
        fn new(url: &str, responses: Vec<std::result::Result<String, FetchError>>) -> Self {
            let mut map = HashMap::new();
            map.insert(url.to_string(), responses);
            Self {
                responses: Mutex::new(map),
                calls: Mutex::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for ScriptedFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            let queue = responses.get_mut(url).expect("unexpected url");
            queue.remove(0)
        }
    }

    const LINK: &str = "https://www.ycombinator.com/companies/acme";

    fn job() -> ExtractionJob {
        ExtractionJob {
            index: 0,
            label: "Winter 2015".to_string(),
            link: LINK.to_string(),
        }
    }

    fn page() -> String {
        company_page(&json!({"props": {"company": {"name": "Acme"}}}))
    }

    fn config(max_retries: u32) -> Config {
        let mut config = Config::default();
        config.crawler.max_retries = max_retries;
        config.crawler.retry_backoff_ms = 1;
        config
    }

    #[tokio::test]
    async fn test_extract_success() {
        let fetcher = ScriptedFetcher::new(LINK, vec![Ok(page())]);
        let extractor = DetailExtractor::new(fetcher, &config(0)).unwrap();

        let record = extractor.extract(&job()).await.unwrap();
        assert_eq!(record.name, "Acme");
        assert_eq!(record.label, "Winter 2015");
        assert_eq!(record.link, LINK);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let fetcher = ScriptedFetcher::new(LINK, vec![Err(FetchError::Timeout), Ok(page())]);
        let extractor = DetailExtractor::new(fetcher, &config(0)).unwrap();

        let err = extractor.extract(&job()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Fetch(FetchError::Timeout)));
        assert_eq!(*extractor.fetcher.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_retried() {
        let fetcher = ScriptedFetcher::new(
            LINK,
            vec![Err(FetchError::Status(503)), Err(FetchError::Timeout), Ok(page())],
        );
        let extractor = DetailExtractor::new(fetcher, &config(2)).unwrap();

        let record = extractor.extract(&job()).await.unwrap();
        assert_eq!(record.name, "Acme");
        assert_eq!(*extractor.fetcher.calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let fetcher = ScriptedFetcher::new(LINK, vec![Err(FetchError::Status(404)), Ok(page())]);
        let extractor = DetailExtractor::new(fetcher, &config(3)).unwrap();

        let err = extractor.extract(&job()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::Fetch(FetchError::Status(404))));
        assert_eq!(*extractor.fetcher.calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_structural_failure() {
        let fetcher = ScriptedFetcher::new(LINK, vec![Ok("<html>maintenance</html>".to_string())]);
        let extractor = DetailExtractor::new(fetcher, &config(3)).unwrap();

        let err = extractor.extract(&job()).await.unwrap_err();
        assert!(matches!(err, ExtractionError::MissingContainer));
        assert_eq!(*extractor.fetcher.calls.lock().unwrap(), 1);
    }
}
