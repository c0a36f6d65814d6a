//! Link extraction from fetched HTML.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

/// Turns a page body into the absolute URLs it links to.
pub trait LinkParser: Send + Sync + 'static {
    /// Returns absolute, fragment-free URLs in document order without duplicates.
    fn extract_links(&self, body: &str, base: &Url) -> Vec<Url>;
}

/// Extensions of documents that are never worth crawling for links.
const SKIPPED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "svg", "ico", "css", "js", "pdf", "zip",
];

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href], area[href]").expect("static selector"));

static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script:not([src])").expect("static selector"));

static LOCATION_ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:document|window)?\.?location(?:\.href)?\s*=\s*["']([^"']+)["']"#)
        .expect("static regex")
});

/// [`LinkParser`] for HTML documents: anchors, image-map areas and inline-script
/// `location` redirects.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlLinkParser;

impl LinkParser for HtmlLinkParser {
    fn extract_links(&self, body: &str, base: &Url) -> Vec<Url> {
        let document = Html::parse_document(body);

        let hrefs = document
            .select(&LINK_SELECTOR)
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string);

        let script_targets: Vec<String> = document
            .select(&SCRIPT_SELECTOR)
            .flat_map(|script| {
                let text = script.text().collect::<String>();
                LOCATION_ASSIGNMENT
                    .captures_iter(&text)
                    .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut seen = HashSet::new();
        hrefs
            .chain(script_targets)
            .filter_map(|href| resolve_link(base, &href))
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

/// Resolves `href` against `base` and keeps it only if it is a crawlable http(s) page.
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    // Skip empty, javascript:, mailto:, tel:, etc.
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);

    if is_crawlable(&url) { Some(url) } else { None }
}

/// http(s) with a host, and not a static asset.
pub fn is_crawlable(url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return false;
    }

    let path = url.path().to_ascii_lowercase();
    let extension = path
        .rsplit('/')
        .next()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext);

    !matches!(extension, Some(ext) if SKIPPED_EXTENSIONS.contains(&ext))
}

/// Strips the fragment so that `/a#top` and `/a` are the same page.
pub fn normalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}
