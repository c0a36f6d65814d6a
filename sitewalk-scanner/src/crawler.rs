use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::CrawlerConfig;
use crate::error::{FetchError, Result, ScanError};
use crate::fetch::{HttpFetcher, Page, PageFetcher};
use crate::frontier::{Frontier, FrontierEntry};
use crate::limiter::RateLimiter;
use crate::links::{HtmlLinkParser, LinkParser, is_crawlable, normalize};
use crate::map::{MapBuilder, NodeId};
use crate::registry::{Claim, Registry};
use crate::result::CrawlOutcome;
use crate::robots::{RobotsPolicy, robots_url};
use crate::scope::{self, HostScope};
use crate::termination::{StopReason, Termination};

pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// Crawls one site at a time. Each call to [`Crawler::crawl`] starts from a clean slate,
/// so the same crawler can be reused for several seeds.
pub struct Crawler<F = HttpFetcher, P = HtmlLinkParser> {
    config: CrawlerConfig,
    fetcher: Arc<F>,
    parser: Arc<P>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(&config)?;
        Self::with_parts(config, fetcher, HtmlLinkParser)
    }
}

impl<F: PageFetcher, P: LinkParser> Crawler<F, P> {
    /// Builds a crawler around a custom fetcher and link parser.
    pub fn with_parts(config: CrawlerConfig, fetcher: F, parser: P) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            parser: Arc::new(parser),
            progress_callback: None,
        })
    }

    /// Called with the worker id and URL every time a worker starts on a page.
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    /// Fetches robots.txt for the site of `seed` and reads it for our user agent. A
    /// missing file means nothing is banned; any other failure is an error, since
    /// crawling without the policy would not be compliant.
    pub async fn load_robots_policy(&self, seed: &Url) -> Result<RobotsPolicy> {
        let robots = robots_url(seed)
            .ok_or_else(|| ScanError::InvalidUrl(format!("{} has no host", seed)))?;
        debug!("Loading robots policy from {}", robots);

        match fetch_within(self.fetcher.as_ref(), &robots, self.config.request_timeout).await {
            Ok(page) => {
                let policy = RobotsPolicy::parse(&page.body, &robots, &self.config.user_agent);
                info!(
                    "robots.txt has {} disallow rule(s) for {}",
                    policy.disallowed().len(),
                    policy.agent()
                );
                Ok(policy)
            }
            Err(e) if is_missing_policy(&e) => {
                info!("No robots policy at {} ({}), nothing is banned", robots, e);
                Ok(RobotsPolicy::allow_all())
            }
            Err(e) => Err(ScanError::Robots {
                url: robots.to_string(),
                source: e,
            }),
        }
    }

    /// Crawls the site of `start_url` until the frontier goes idle or the page budget
    /// runs out, and returns the discovery tree.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlOutcome> {
        let started = Instant::now();
        let seed = parse_seed(start_url)?;
        let host_scope = HostScope::from_url(&seed, self.config.scope)
            .ok_or_else(|| ScanError::InvalidUrl(format!("{} has no host", seed)))?;

        info!(
            "Starting crawl of {} with {} workers",
            seed, self.config.workers
        );

        let mut registry = Registry::new(self.config.max_pages);
        if self.config.respect_robots {
            registry.load_policy(self.load_robots_policy(&seed).await?);
        }

        let state = Arc::new(CrawlState {
            fetcher: self.fetcher.clone(),
            parser: self.parser.clone(),
            scope: host_scope,
            registry,
            frontier: Frontier::new(),
            map: MapBuilder::new(seed.clone()),
            limiter: RateLimiter::new(self.config.crawl_rate),
            termination: Termination::new(self.config.idle_timeout),
            request_timeout: self.config.request_timeout,
            pages_fetched: AtomicUsize::new(0),
            fetch_errors: AtomicUsize::new(0),
            progress_callback: self.progress_callback.clone(),
        });

        // The seed belongs to the map whatever happens, but is only fetched when allowed.
        state.registry.try_claim(&seed);
        if state.registry.is_banned(&seed) {
            warn!("{} is disallowed by robots.txt, nothing to crawl", seed);
            state.stop(StopReason::Idle);
        } else {
            state
                .frontier
                .push(FrontierEntry::new(seed.clone(), NodeId::ROOT));
        }

        let mut stop = state.termination.subscribe();
        let workers: Vec<JoinHandle<()>> = (0..self.config.workers)
            .map(|worker_id| tokio::spawn(state.clone().run_worker(worker_id)))
            .collect();
        let watchdog = tokio::spawn(state.clone().watch_idle());

        let stop_reason = stop.stopped().await.unwrap_or(StopReason::Idle);
        let site_map = state.map.finish();

        // Nothing a worker does from here on can reach the map or the registry, so
        // anything still in flight is simply dropped.
        for handle in &workers {
            handle.abort();
        }
        for joined in join_all(workers).await {
            if let Err(e) = joined
                && !e.is_cancelled()
            {
                return Err(e.into());
            }
        }
        watchdog.await?;

        let outcome = CrawlOutcome {
            seed,
            site_map,
            stop_reason,
            pages_visited: state.registry.visited_count(),
            pages_fetched: state.pages_fetched.load(Ordering::Relaxed),
            fetch_errors: state.fetch_errors.load(Ordering::Relaxed),
            banned: state.registry.banned().to_vec(),
            elapsed: started.elapsed(),
        };

        info!(
            "Crawl complete ({}). Mapped {} pages, fetched {}, {} errors",
            outcome.stop_reason,
            outcome.site_map.len(),
            outcome.pages_fetched,
            outcome.fetch_errors
        );
        Ok(outcome)
    }
}

fn parse_seed(start_url: &str) -> Result<Url> {
    let seed = Url::parse(start_url.trim())
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;
    if !matches!(seed.scheme(), "http" | "https") || seed.host_str().is_none() {
        return Err(ScanError::InvalidUrl(format!(
            "{}: only http(s) URLs with a host can be crawled",
            start_url
        )));
    }
    Ok(normalize(seed))
}

/// Bounds a fetch by the request timeout, whatever the fetcher does internally.
async fn fetch_within<F: PageFetcher>(
    fetcher: &F,
    url: &Url,
    limit: Duration,
) -> std::result::Result<Page, FetchError> {
    timeout(limit, fetcher.fetch(url))
        .await
        .unwrap_or(Err(FetchError::Timeout(limit)))
}

fn is_missing_policy(error: &FetchError) -> bool {
    match error {
        FetchError::NotFound(_) => true,
        FetchError::Status(status) => (400..500).contains(status),
        _ => false,
    }
}

/// State owned by a single crawl and shared by its workers.
struct CrawlState<F, P> {
    fetcher: Arc<F>,
    parser: Arc<P>,
    scope: HostScope,
    registry: Registry,
    frontier: Frontier,
    map: MapBuilder,
    limiter: RateLimiter,
    termination: Termination,
    request_timeout: Duration,
    pages_fetched: AtomicUsize,
    fetch_errors: AtomicUsize,
    progress_callback: Option<ProgressCallback>,
}

impl<F: PageFetcher, P: LinkParser> CrawlState<F, P> {
    /// Ends the crawl. Writes are shut off before the reason goes out, so nobody
    /// observing the stop can see the map or the visited set change afterwards.
    fn stop(&self, reason: StopReason) {
        self.registry.close();
        self.map.seal();
        if self.termination.fire(reason) {
            info!("Stopping crawl: {}", reason);
        }
    }

    async fn run_worker(self: Arc<Self>, worker_id: usize) {
        debug!("Worker {} started", worker_id);
        let mut stop = self.termination.subscribe();

        loop {
            let entry = tokio::select! {
                biased;
                _ = stop.stopped() => break,
                entry = self.limiter.throttle(self.frontier.pop()) => entry,
            };
            let Some(entry) = entry else { break };

            let _in_flight = self.termination.begin();
            self.process(worker_id, entry).await;
        }

        debug!("Worker {} finished", worker_id);
    }

    async fn process(&self, worker_id: usize, entry: FrontierEntry) {
        if let Some(ref callback) = self.progress_callback {
            callback(worker_id, entry.url.to_string());
        }

        debug!("[Worker {}] Fetching {}", worker_id, entry.url);
        let fetched = fetch_within(self.fetcher.as_ref(), &entry.url, self.request_timeout).await;
        let page = match fetched {
            Ok(page) => page,
            Err(e) => {
                self.fetch_errors.fetch_add(1, Ordering::Relaxed);
                debug!("[Worker {}] Skipping {}: {}", worker_id, entry.url, e);
                return;
            }
        };
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
        debug!(
            "[Worker {}] {} answered {} in {:?}",
            worker_id, entry.url, page.status, page.response_time
        );

        if self.termination.is_stopped() || !page.is_html() {
            return;
        }

        let links = self.parser.extract_links(&page.body, &page.url);
        debug!(
            "[Worker {}] {} links on {}, {} queued",
            worker_id,
            links.len(),
            entry.url,
            self.frontier.len()
        );
        self.expand(&entry, links);
    }

    /// Claims every new in-scope link, records it under the page it was found on and
    /// queues it for fetching.
    fn expand(&self, parent: &FrontierEntry, links: Vec<Url>) {
        for link in links {
            if !is_crawlable(&link) || !scope::accept(&link, &self.scope, &self.registry) {
                continue;
            }

            match self.registry.try_claim(&link) {
                Claim::Granted => {
                    let Some(node) = self.map.attach(parent.node, link.clone()) else {
                        return;
                    };
                    self.frontier.push(FrontierEntry::new(link, node));
                }
                Claim::AlreadyVisited => {}
                Claim::BudgetExhausted => {
                    self.stop(StopReason::BudgetExhausted);
                    return;
                }
                Claim::Closed => return,
            }
        }
    }

    async fn watch_idle(self: Arc<Self>) {
        let mut stop = self.termination.subscribe();
        let mut ticker = interval(self.termination.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop.stopped() => return,
                _ = ticker.tick() => {}
            }
            if self.termination.is_idle() {
                self.stop(StopReason::Idle);
                return;
            }
        }
    }
}
