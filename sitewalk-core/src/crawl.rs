use indicatif::{ProgressBar, ProgressStyle};
use sitewalk_scanner::{CrawlOutcome, Crawler, CrawlerConfig, ProgressCallback, ScanError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub config: CrawlerConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// What happened to one seed of a multi-seed crawl.
#[derive(Debug)]
pub struct SeedCrawl {
    pub seed: String,
    pub outcome: Result<CrawlOutcome, ScanError>,
}

impl SeedCrawl {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Crawls each seed in turn with the same configuration.
///
/// A seed that fails to start (bad URL, unreachable robots policy) is reported through
/// `progress_callback` and recorded; the remaining seeds still run. Only an invalid
/// configuration fails the whole call.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<Vec<SeedCrawl>, ScanError> {
    let CrawlOptions {
        urls,
        config,
        show_progress_bars,
    } = options;

    let mut crawler = Crawler::new(config)?;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));
    if let Some(ref pb) = progress_bar {
        let pb = pb.clone();
        let count = processed_count.clone();
        let internal_progress_callback: ProgressCallback =
            Arc::new(move |_worker_id: usize, url: String| {
                let processed = count.fetch_add(1, Ordering::Relaxed) + 1;
                pb.set_message(format!(
                    "Crawling... {} pages processed {}",
                    processed,
                    extract_url_path(&url)
                ));
            });
        crawler = crawler.with_progress_callback(internal_progress_callback);
    }

    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            match progress_bar {
                Some(ref pb) => pb.suspend(|| callback(msg)),
                None => callback(msg),
            }
        }
    };

    let mut runs = Vec::with_capacity(urls.len());
    for (idx, url_str) in urls.iter().enumerate() {
        if urls.len() > 1 {
            report(format!(
                "Crawling host {}/{}: {}",
                idx + 1,
                urls.len(),
                url_str
            ));
        }

        let outcome = crawler.crawl(url_str).await;
        if let Err(ref e) = outcome {
            report(format!("[!]  Failed to crawl {}: {}", url_str, e));
        }
        runs.push(SeedCrawl {
            seed: url_str.clone(),
            outcome,
        });
    }

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} pages processed", total));
    }

    Ok(runs)
}
