use std::time::Duration;

use url::Url;

use crate::map::SiteMap;
use crate::termination::StopReason;

/// Everything one crawl produced.
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub seed: Url,
    pub site_map: SiteMap,
    pub stop_reason: StopReason,
    /// URLs claimed for fetching, the seed included. Never exceeds the page budget.
    pub pages_visited: usize,
    pub pages_fetched: usize,
    pub fetch_errors: usize,
    /// Disallow rules from robots.txt that applied to the crawl. Empty when robots
    /// compliance is off.
    pub banned: Vec<Url>,
    pub elapsed: Duration,
}

impl CrawlOutcome {
    /// Pages in the map besides the seed.
    pub fn pages_found(&self) -> usize {
        self.site_map.len() - 1
    }
}
