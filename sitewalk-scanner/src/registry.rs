use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use url::Url;

use crate::robots::RobotsPolicy;

/// Outcome of [`Registry::try_claim`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    /// The caller now owns the URL and must fetch it.
    Granted,
    AlreadyVisited,
    /// The page budget is spent; nothing more will be claimed.
    BudgetExhausted,
    /// The crawl has terminated.
    Closed,
}

#[derive(Debug, Default)]
struct Visited {
    urls: HashSet<Url>,
    closed: bool,
}

/// Visited URLs and the robots policy, shared by every worker of one crawl.
#[derive(Debug)]
pub struct Registry {
    visited: Mutex<Visited>,
    policy: RobotsPolicy,
    budget: Option<usize>,
}

impl Registry {
    pub fn new(budget: Option<usize>) -> Self {
        Self {
            visited: Mutex::new(Visited::default()),
            policy: RobotsPolicy::allow_all(),
            budget,
        }
    }

    /// Installs the robots policy. Needs exclusive access, so it can only happen before
    /// the registry is shared with workers.
    pub fn load_policy(&mut self, policy: RobotsPolicy) {
        self.policy = policy;
    }

    /// Disallow rules in force, for reporting.
    pub fn banned(&self) -> &[Url] {
        self.policy.disallowed()
    }

    pub fn is_banned(&self, url: &Url) -> bool {
        !self.policy.allows(url)
    }

    /// Checks membership, capacity and closure and inserts the URL in one critical
    /// section.
    pub fn try_claim(&self, url: &Url) -> Claim {
        let mut visited = self.visited.lock().unwrap_or_else(PoisonError::into_inner);
        if visited.closed {
            return Claim::Closed;
        }
        if visited.urls.contains(url) {
            return Claim::AlreadyVisited;
        }
        if let Some(budget) = self.budget
            && visited.urls.len() >= budget
        {
            return Claim::BudgetExhausted;
        }
        visited.urls.insert(url.clone());
        Claim::Granted
    }

    /// Refuses every later claim.
    pub fn close(&self) {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .closed = true;
    }

    pub fn visited_count(&self) -> usize {
        self.visited
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .urls
            .len()
    }
}
