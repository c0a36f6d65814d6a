use std::future::Future;
use std::time::{Duration, Instant};

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::{FetchError, Result};

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct Page {
    /// Where the body came from, after redirects. Relative links resolve against it.
    pub url: Url,
    pub status: u16,
    pub content_type: Option<String>,
    pub body: String,
    pub response_time: Duration,
}

impl Page {
    pub fn html(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            status: 200,
            content_type: Some("text/html; charset=utf-8".to_string()),
            body: body.into(),
            response_time: Duration::ZERO,
        }
    }

    /// Pages without a content type are treated as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| {
                let ct = ct.to_ascii_lowercase();
                ct.contains("text/html") || ct.contains("application/xhtml")
            })
            .unwrap_or(true)
    }
}

/// Loads one page. Implementations apply the crawl's user agent and request timeout.
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &Url) -> impl Future<Output = std::result::Result<Page, FetchError>> + Send;
}

/// [`PageFetcher`] backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .connect_timeout(timeout / 2)
            .pool_max_idle_per_host(50) // Connection pooling
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }

    pub fn from_config(config: &CrawlerConfig) -> Result<Self> {
        Self::new(&config.user_agent, config.request_timeout)
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> std::result::Result<Page, FetchError> {
        debug!("Fetching {}", url);

        let start = Instant::now();
        let response = self.client.get(url.clone()).send().await?;
        let response_time = start.elapsed();

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(status.as_u16()));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let body = response.text().await?;

        Ok(Page {
            url: final_url,
            status: status.as_u16(),
            content_type,
            body,
            response_time,
        })
    }
}
