// src/utils/http.rs

//! HTTP fetch context shared by the adapters of one source run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::CrawlerConfig;

type DefaultRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a configured asynchronous HTTP client.
pub fn create_async_client(config: &CrawlerConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

/// HTTP client, politeness limiter and page cache for one run of one source.
///
/// The limiter is shared by every worker of the source, so
/// `request_delay_ms` bounds the source's total request rate.
pub struct FetchContext {
    client: reqwest::Client,
    limiter: Option<Arc<DefaultRateLimiter>>,
    cache: Mutex<HashMap<String, Arc<String>>>,
}

impl FetchContext {
    pub fn new(config: &CrawlerConfig) -> Result<Self> {
        let client = create_async_client(config)?;
        // Zero delay yields no quota and disables limiting.
        let limiter = Quota::with_period(Duration::from_millis(config.request_delay_ms))
            .map(|quota| Arc::new(RateLimiter::direct(quota)));
        Ok(Self {
            client,
            limiter,
            cache: Mutex::new(HashMap::new()),
        })
    }

    /// Fetch a page body, reusing an earlier download from this run.
    pub async fn fetch_text(&self, url: &str) -> Result<Arc<String>> {
        if let Some(body) = self.cache.lock().await.get(url) {
            return Ok(Arc::clone(body));
        }

        let body = Arc::new(self.download(url).await?);
        self.cache
            .lock()
            .await
            .insert(url.to_string(), Arc::clone(&body));
        Ok(body)
    }

    /// Pre-populate the cache with a page body.
    pub async fn insert(&self, url: impl Into<String>, body: impl Into<String>) {
        self.cache
            .lock()
            .await
            .insert(url.into(), Arc::new(body.into()));
    }

    async fn download(&self, url: &str) -> Result<String> {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::fetch(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(url, format!("HTTP {status}")));
        }

        response.text().await.map_err(|e| AppError::fetch(url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_cached_body_is_served_without_network() {
        let ctx = FetchContext::new(&CrawlerConfig::default()).unwrap();
        ctx.insert("https://docs.example.invalid/page", "<p>hi</p>")
            .await;

        let body = ctx
            .fetch_text("https://docs.example.invalid/page")
            .await
            .unwrap();
        assert_eq!(body.as_str(), "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_zero_delay_disables_limiter() {
        let config = CrawlerConfig {
            request_delay_ms: 0,
            ..CrawlerConfig::default()
        };
        let ctx = FetchContext::new(&config).unwrap();
        assert!(ctx.limiter.is_none());
    }

    #[tokio::test]
    async fn test_limiter_spaces_requests_across_workers() {
        const DELAY_MS: u64 = 50;
        const WORKERS: u64 = 4;

        let config = CrawlerConfig {
            request_delay_ms: DELAY_MS,
            ..CrawlerConfig::default()
        };
        let ctx = FetchContext::new(&config).unwrap();
        let limiter = ctx.limiter.clone().unwrap();

        let start = Instant::now();
        let workers: Vec<_> = (0..WORKERS)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.until_ready().await })
            })
            .collect();
        for worker in workers {
            worker.await.unwrap();
        }

        // One permit up front, then one per period.
        let expected = Duration::from_millis((WORKERS - 1) * DELAY_MS);
        assert!(
            start.elapsed() >= expected,
            "elapsed {:?} < {:?}",
            start.elapsed(),
            expected
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        let config = CrawlerConfig {
            timeout_secs: 2,
            request_delay_ms: 0,
            ..CrawlerConfig::default()
        };
        let ctx = FetchContext::new(&config).unwrap();
        let result = ctx.fetch_text("http://127.0.0.1:1/nothing").await;
        assert!(matches!(result, Err(AppError::Fetch { .. })));
    }
}
