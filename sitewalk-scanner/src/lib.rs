pub mod config;
pub mod crawler;
pub mod error;
pub mod fetch;
pub mod frontier;
pub mod limiter;
pub mod links;
pub mod map;
pub mod registry;
pub mod result;
pub mod robots;
pub mod scope;
pub mod termination;

pub use config::CrawlerConfig;
pub use crawler::{Crawler, ProgressCallback};
pub use error::{FetchError, ScanError};
pub use fetch::{HttpFetcher, Page, PageFetcher};
pub use links::{HtmlLinkParser, LinkParser};
pub use map::{Node, SiteMap};
pub use result::CrawlOutcome;
pub use robots::RobotsPolicy;
pub use scope::ScopeMode;
pub use termination::StopReason;
