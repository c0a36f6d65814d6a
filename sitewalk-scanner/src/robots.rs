//! robots.txt support. Rule matching is done by `robotstxt`; the disallow rules that
//! apply to us are also kept as absolute URLs for reports.

use robotstxt::DefaultMatcher;
use url::Url;

/// `scheme://host[:port]/robots.txt` for the site of `url`.
pub fn robots_url(url: &Url) -> Option<Url> {
    url.host_str()?;
    url.join("/robots.txt").ok()
}

/// A site's robots.txt as it applies to one user agent.
#[derive(Debug, Clone, Default)]
pub struct RobotsPolicy {
    body: String,
    agent: String,
    disallowed: Vec<Url>,
}

impl RobotsPolicy {
    /// Reads `body`, fetched from `robots`, for a crawler sending `user_agent`.
    pub fn parse(body: &str, robots: &Url, user_agent: &str) -> Self {
        let agent = product_token(user_agent);
        Self {
            disallowed: disallow_rules(body, robots, &agent),
            body: body.to_string(),
            agent,
        }
    }

    /// The policy of a site that publishes no robots.txt.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Only the path and query of `url` are matched, so every scheme and host variant
    /// of the site is held to the same rules.
    pub fn allows(&self, url: &Url) -> bool {
        self.body.trim().is_empty()
            || DefaultMatcher::default().one_agent_allowed_by_robots(
                &self.body,
                &self.agent,
                url.as_str(),
            )
    }

    /// Disallow rules of the group that applies to us, resolved against the site.
    pub fn disallowed(&self) -> &[Url] {
        &self.disallowed
    }

    /// The token robots.txt groups are matched against.
    pub fn agent(&self) -> &str {
        &self.agent
    }
}

/// `sitewalk/0.1` gives `sitewalk`; the decoy `Mozilla/5.0 (compatible; Googlebot/2.1; ...)`
/// gives `Googlebot`.
fn product_token(user_agent: &str) -> String {
    let product = user_agent
        .split_once("compatible;")
        .map_or(user_agent, |(_, rest)| rest);
    agent_name(product)
}

/// Leading run of `[A-Za-z_-]`, the part of a user agent robots.txt groups name.
fn agent_name(value: &str) -> String {
    value
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic() || *c == '-' || *c == '_')
        .collect()
}

#[derive(Debug, Default)]
struct Group {
    agents: Vec<String>,
    disallow: Vec<String>,
}

/// Lists the disallow rules of the group naming `agent`, or of the `*` group when none
/// does.
fn disallow_rules(body: &str, base: &Url, agent: &str) -> Vec<Url> {
    let groups = parse_groups(body);

    let specific: Vec<&Group> = groups
        .iter()
        .filter(|g| {
            !agent.is_empty() && g.agents.iter().any(|name| name.eq_ignore_ascii_case(agent))
        })
        .collect();

    let selected: Vec<&Group> = if specific.is_empty() {
        groups
            .iter()
            .filter(|g| g.agents.iter().any(|name| name == "*"))
            .collect()
    } else {
        specific
    };

    let mut rules: Vec<Url> = Vec::new();
    for path in selected.iter().flat_map(|g| g.disallow.iter()) {
        let rooted = if path.starts_with('/') {
            path.clone()
        } else {
            format!("/{path}")
        };
        if let Ok(url) = base.join(&rooted)
            && !rules.contains(&url)
        {
            rules.push(url);
        }
    }
    rules
}

fn parse_groups(body: &str) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut current = Group::default();
    let mut in_rules = false;

    for raw in body.lines() {
        let line = raw.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "user-agent" => {
                if in_rules {
                    groups.push(std::mem::take(&mut current));
                    in_rules = false;
                }
                if value.starts_with('*') {
                    current.agents.push("*".to_string());
                } else {
                    current.agents.push(agent_name(value));
                }
            }
            "disallow" => {
                in_rules = true;
                if !value.is_empty() {
                    current.disallow.push(value.to_string());
                }
            }
            "allow" | "crawl-delay" => in_rules = true,
            _ => {}
        }
    }

    if !current.agents.is_empty() {
        groups.push(current);
    }
    groups
}
