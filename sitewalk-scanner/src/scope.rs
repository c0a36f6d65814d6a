//! Decides which discovered links belong to the site being crawled.

use url::Url;

use crate::registry::Registry;

/// How two host names are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScopeMode {
    /// Same host, or one is a subdomain of the other. A leading `www.` is ignored.
    #[default]
    Strict,
    /// Same host, or one host name contains the other. Accepts `www.` and subdomain
    /// variants but also unrelated hosts such as `notexample.com` for `example.com`.
    Loose,
}

/// The host boundary of a crawl.
#[derive(Debug, Clone)]
pub struct HostScope {
    host: String,
    mode: ScopeMode,
}

impl HostScope {
    pub fn new(host: impl Into<String>, mode: ScopeMode) -> Self {
        Self {
            host: host.into().to_ascii_lowercase(),
            mode,
        }
    }

    /// Builds the scope from the seed URL's host.
    pub fn from_url(url: &Url, mode: ScopeMode) -> Option<Self> {
        url.host_str().map(|host| Self::new(host, mode))
    }

    pub fn contains(&self, url: &Url) -> bool {
        match url.host_str() {
            Some(host) => hosts_match(&host.to_ascii_lowercase(), &self.host, self.mode),
            None => false,
        }
    }
}

pub fn hosts_match(a: &str, b: &str, mode: ScopeMode) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    match mode {
        ScopeMode::Strict => {
            let a = a.strip_prefix("www.").unwrap_or(a);
            let b = b.strip_prefix("www.").unwrap_or(b);
            a == b || is_subdomain_of(a, b) || is_subdomain_of(b, a)
        }
        ScopeMode::Loose => a == b || a.contains(b) || b.contains(a),
    }
}

fn is_subdomain_of(host: &str, parent: &str) -> bool {
    host.len() > parent.len() + 1
        && host.ends_with(parent)
        && host.as_bytes()[host.len() - parent.len() - 1] == b'.'
}

/// A link is accepted when it is in scope and not disallowed by the robots policy.
/// Runs before a claim so rejected links never take a visited slot.
pub fn accept(url: &Url, scope: &HostScope, registry: &Registry) -> bool {
    scope.contains(url) && !registry.is_banned(url)
}
