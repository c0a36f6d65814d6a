use std::time::Duration;

use crate::error::{Result, ScanError};
use crate::scope::ScopeMode;

pub const DEFAULT_WORKERS: usize = 10_000;
pub const DEFAULT_CRAWL_RATE: Duration = Duration::from_millis(1);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(5_000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2_000);
pub const DEFAULT_USER_AGENT: &str = concat!("sitewalk/", env!("CARGO_PKG_VERSION"));

/// User agent sent in disguise mode. Robots compliance is switched off alongside it.
pub const DECOY_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; Googlebot/2.1; +http://www.google.com/bot.html)";

#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Number of worker tasks pulling from the frontier.
    pub workers: usize,

    /// Page budget. `None` crawls until the frontier goes idle.
    pub max_pages: Option<usize>,

    /// Minimum delay between two workers starting a fetch. Zero disables throttling.
    pub crawl_rate: Duration,

    /// How long the frontier may stay quiet before the crawl is considered finished.
    pub idle_timeout: Duration,

    /// Per-request timeout handed to the HTTP client.
    pub request_timeout: Duration,

    pub respect_robots: bool,

    pub user_agent: String,

    pub scope: ScopeMode,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            max_pages: None,
            crawl_rate: DEFAULT_CRAWL_RATE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            respect_robots: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            scope: ScopeMode::default(),
        }
    }
}

impl CrawlerConfig {
    /// Adopts the decoy Googlebot user agent and stops honouring robots.txt.
    pub fn disguise(mut self) -> Self {
        self.respect_robots = false;
        self.user_agent = DECOY_USER_AGENT.to_string();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(ScanError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.max_pages == Some(0) {
            return Err(ScanError::InvalidConfig(
                "page budget must be at least 1 (omit it for no limit)".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.idle_timeout.is_zero() {
            return Err(ScanError::InvalidConfig(
                "idle timeout must be greater than zero".to_string(),
            ));
        }
        // A pulse slower than the idle window would end the crawl with work still queued.
        if self.crawl_rate >= self.idle_timeout {
            return Err(ScanError::InvalidConfig(format!(
                "crawl rate ({:?}) must be shorter than the idle timeout ({:?})",
                self.crawl_rate, self.idle_timeout
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ScanError::InvalidConfig(
                "user agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
