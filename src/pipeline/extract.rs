// src/pipeline/extract.rs

//! Company detail extraction pipeline.

use std::collections::HashSet;

use chrono::Utc;
use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{Config, DetailRecord, ExtractStats, ExtractionFailure, ExtractionJob, LinkRecord};
use crate::pipeline::ProgressTracker;
use crate::services::DetailExtractor;
use crate::storage::RecordStorage;
use crate::utils::http::Fetcher;

/// Records and failures of a finished extraction.
#[derive(Debug, Default)]
pub struct ExtractOutcome {
    /// Successful records, in submission order
    pub records: Vec<DetailRecord>,
    /// Failed jobs, in completion order
    pub failures: Vec<ExtractionFailure>,
}

/// Turn link-table rows into jobs, dropping repeated (label, link) pairs.
///
/// Returns the jobs and the number of rows skipped as duplicates.
pub fn plan_jobs(links: Vec<LinkRecord>) -> (Vec<ExtractionJob>, usize) {
    let total = links.len();
    let mut seen = HashSet::new();
    let jobs: Vec<ExtractionJob> = links
        .into_iter()
        .filter(|link| seen.insert(link.clone()))
        .enumerate()
        .map(|(index, link)| ExtractionJob::new(index, link))
        .collect();
    let duplicates = total - jobs.len();
    (jobs, duplicates)
}

/// Run every job with at most `concurrency` in flight.
///
/// Completions are collected here one at a time, so each one bumps
/// `progress` once and its log line carries that count.
pub async fn extract_all<F: Fetcher>(
    extractor: &DetailExtractor<F>,
    jobs: Vec<ExtractionJob>,
    concurrency: usize,
    progress: &ProgressTracker,
) -> ExtractOutcome {
    let mut indexed = Vec::new();
    let mut failures = Vec::new();

    let mut completions = stream::iter(jobs)
        .map(|job| async move {
            let result = extractor.extract(&job).await;
            (job, result)
        })
        .buffer_unordered(concurrency.max(1));

    while let Some((job, result)) = completions.next().await {
        match result {
            Ok(record) => {
                let done = progress.record_success();
                log::info!(
                    "Processed {}/{}: {} - {}",
                    done,
                    progress.total(),
                    job.label,
                    job.link
                );
                log::debug!(
                    "Tagline length: {}, description length: {}",
                    record.tagline.chars().count(),
                    record.description.chars().count()
                );
                indexed.push((job.index, record));
            }
            Err(e) => {
                let done = progress.record_failure();
                log::warn!(
                    "Error {}/{}: {} - {} - {}",
                    done,
                    progress.total(),
                    job.label,
                    job.link,
                    e
                );
                failures.push(ExtractionFailure {
                    label: job.label,
                    link: job.link,
                    cause: e.to_string(),
                });
            }
        }
    }

    indexed.sort_by_key(|(index, _)| *index);
    ExtractOutcome {
        records: indexed.into_iter().map(|(_, record)| record).collect(),
        failures,
    }
}

/// Run the detail extractor over the whole link table.
///
/// A missing link table is returned as an error before any request is made.
/// When no job succeeds, nothing is written.
pub async fn run_extractor<F: Fetcher>(
    config: &Config,
    storage: &dyn RecordStorage,
    fetcher: F,
) -> Result<ExtractStats> {
    let start_time = Utc::now();

    let links = storage.load_links().await?;
    let (jobs, duplicate_count) = plan_jobs(links);
    if duplicate_count > 0 {
        log::info!("Skipping {} repeated link-table rows", duplicate_count);
    }

    let extractor = DetailExtractor::new(fetcher, config)?;
    let progress = ProgressTracker::new(jobs.len());
    log::info!("Starting to scrape {} company links...", jobs.len());

    let outcome = extract_all(&extractor, jobs, config.crawler.max_concurrent, &progress).await;

    let rows_written = if outcome.records.is_empty() {
        log::warn!("No data scraped.");
        0
    } else {
        storage.write_details(&outcome.records).await?;
        log::info!("Saved {} company details", outcome.records.len());
        outcome.records.len()
    };

    let stats = ExtractStats {
        start_time,
        end_time: Utc::now(),
        job_count: progress.total(),
        duplicate_count,
        success_count: progress.succeeded(),
        failure_count: progress.failed(),
        rows_written,
    };

    log::info!(
        "Extraction finished: {}/{} succeeded ({:.1}%), {} failed, {}s",
        stats.success_count,
        stats.job_count,
        stats.success_rate() * 100.0,
        stats.failure_count,
        stats.elapsed_secs()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::error::AppError;
    use crate::models::{MISSING, PathsConfig};
    use crate::services::company_page;
    use crate::storage::LocalStorage;
    use crate::utils::http::FetchError;

    enum Reply {
        Page { name: String, delay_ms: u64 },
        Fail(FetchError),
        Garbage,
    }

    /// Serves canned replies per URL and tracks how many requests overlap.
    struct MockFetcher {
        replies: HashMap<String, Reply>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    impl MockFetcher {
        fn new(replies: Vec<(String, Reply)>) -> Self {
            Self {
                replies: replies.into_iter().collect(),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn fetch(&self, url: &str) -> std::result::Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let reply = match self.replies.get(url) {
                Some(Reply::Page { name, delay_ms }) => {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                    Ok(company_page(&json!({"props": {"company": {"name": name}}})))
                }
                Some(Reply::Fail(e)) => {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                    Err(e.clone())
                }
                Some(Reply::Garbage) => Ok("<html>oops</html>".to_string()),
                None => Err(FetchError::Status(404)),
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            reply
        }
    }

    fn link(i: usize) -> String {
        format!("https://www.ycombinator.com/companies/c{i}")
    }

    fn page(i: usize, delay_ms: u64) -> (String, Reply) {
        (
            link(i),
            Reply::Page {
                name: format!("Company {i}"),
                delay_ms,
            },
        )
    }

    fn jobs(count: usize) -> Vec<ExtractionJob> {
        (0..count)
            .map(|i| ExtractionJob::new(i, LinkRecord::new("Summer 2020", link(i))))
            .collect()
    }

    fn extractor(fetcher: MockFetcher) -> DetailExtractor<MockFetcher> {
        DetailExtractor::new(fetcher, &Config::default()).unwrap()
    }

    #[test]
    fn test_plan_jobs_drops_repeated_pairs() {
        let links = vec![
            LinkRecord::new("S20", link(1)),
            LinkRecord::new("S20", link(2)),
            LinkRecord::new("S20", link(1)),
            LinkRecord::new("W21", link(1)),
        ];
        let (jobs, duplicates) = plan_jobs(links);
        assert_eq!(duplicates, 1);
        assert_eq!(jobs.len(), 3);
        assert_eq!(
            jobs.iter().map(|j| j.index).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
        assert_eq!(jobs[2].label, "W21");
    }

    #[tokio::test]
    async fn test_timeout_of_one_job_keeps_the_others() {
        let fetcher = MockFetcher::new(vec![
            page(0, 5),
            (link(1), Reply::Fail(FetchError::Timeout)),
            page(2, 0),
        ]);
        let extractor = extractor(fetcher);
        let progress = ProgressTracker::new(3);

        let outcome = extract_all(&extractor, jobs(3), 10, &progress).await;

        assert_eq!(progress.to_string(), "3/3");
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(outcome.records[0].link, link(0));
        assert_eq!(outcome.records[1].link, link(2));
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].link, link(1));
        assert_eq!(outcome.failures[0].cause, "fetch failed: request timed out");
    }

    #[tokio::test]
    async fn test_stress_counts_every_job_once_within_pool_bound() {
        let total = 120;
        let replies = (0..total)
            .map(|i| match i % 10 {
                3 => (link(i), Reply::Fail(FetchError::Status(500))),
                7 => (link(i), Reply::Garbage),
                _ => page(i, ((i * 7) % 13) as u64),
            })
            .collect();
        let extractor = extractor(MockFetcher::new(replies));
        let progress = ProgressTracker::new(total);

        let outcome = extract_all(&extractor, jobs(total), 10, &progress).await;

        assert_eq!(progress.completed(), total);
        assert_eq!(progress.failed(), 24);
        assert_eq!(outcome.records.len() + outcome.failures.len(), total);
        assert_eq!(extractor_calls(&extractor), total);

        let peak = extractor_peak(&extractor);
        assert!(peak <= 10, "peak concurrency {peak}");
        assert!(peak > 1, "jobs never overlapped");

        // Submission order restored after unordered completion
        let indices: Vec<usize> = outcome
            .records
            .iter()
            .map(|r| r.name.trim_start_matches("Company ").parse().unwrap())
            .collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        assert_eq!(indices, sorted);

        let mut seen = HashSet::new();
        for record in &outcome.records {
            assert!(seen.insert(record.link.clone()));
            assert_ne!(record.name, MISSING);
        }
        for failure in &outcome.failures {
            assert!(seen.insert(failure.link.clone()));
        }
    }

    fn extractor_calls(extractor: &DetailExtractor<MockFetcher>) -> usize {
        extractor.fetcher().calls.load(Ordering::SeqCst)
    }

    fn extractor_peak(extractor: &DetailExtractor<MockFetcher>) -> usize {
        extractor.fetcher().peak.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_run_extractor_writes_table() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), &PathsConfig::default());
        storage
            .append_links(&[
                LinkRecord::new("Winter 2021", link(0)),
                LinkRecord::new("Winter 2021", link(1)),
                LinkRecord::new("Winter 2021", link(0)),
                LinkRecord::new("Summer 2021", link(2)),
            ])
            .await
            .unwrap();

        let fetcher = MockFetcher::new(vec![
            page(0, 3),
            (link(1), Reply::Fail(FetchError::Timeout)),
            page(2, 0),
        ]);

        let stats = run_extractor(&Config::default(), &storage, fetcher).await.unwrap();
        assert_eq!(stats.job_count, 3);
        assert_eq!(stats.duplicate_count, 1);
        assert_eq!(stats.success_count, 2);
        assert_eq!(stats.failure_count, 1);
        assert_eq!(stats.rows_written, 2);

        let details = storage.load_details().await.unwrap();
        assert_eq!(details.len(), 2);
        assert_eq!(details[0].name, "Company 0");
        assert_eq!(details[0].label, "Winter 2021");
        assert_eq!(details[1].label, "Summer 2021");
        assert_eq!(details[1].tagline, MISSING);
    }

    #[tokio::test]
    async fn test_run_extractor_writes_nothing_without_successes() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), &PathsConfig::default());
        storage
            .append_links(&[LinkRecord::new("W05", link(9))])
            .await
            .unwrap();

        let stats = run_extractor(&Config::default(), &storage, MockFetcher::new(vec![]))
            .await
            .unwrap();
        assert_eq!(stats.rows_written, 0);
        assert_eq!(stats.failure_count, 1);
        assert!(!storage.details_path().exists());
    }

    #[tokio::test]
    async fn test_run_extractor_missing_input() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path(), &PathsConfig::default());
        let fetcher = MockFetcher::new(vec![]);

        let err = run_extractor(&Config::default(), &storage, fetcher).await.unwrap_err();
        assert!(matches!(err, AppError::MissingInput(_)));
    }
}
