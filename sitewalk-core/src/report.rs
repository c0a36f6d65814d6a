// Site map reports

use colored::{Color, Colorize};
use serde::{Deserialize, Serialize};
use sitewalk_scanner::{CrawlOutcome, Node};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown report format '{0}' (expected text or json)")]
    UnknownFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(ReportFormat::Text),
            "json" => Ok(ReportFormat::Json),
            other => Err(ReportError::UnknownFormat(other.to_string())),
        }
    }
}

/// Depth colors, cycled for trees deeper than the palette.
const DEPTH_COLORS: [Color; 5] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
];

/// Draws the tree below the root, one line per page.
///
/// Pages on the seed's host are shown by path; pages on another host in scope (a
/// subdomain, say) keep their full URL so they stay distinguishable.
pub fn render_tree(root: &Node, color: bool) -> String {
    let mut out = String::new();
    let last = root.children.len().saturating_sub(1);
    for (idx, child) in root.children.iter().enumerate() {
        render_node(child, &root.url, "", idx == last, 0, color, &mut out);
    }
    out
}

fn render_node(
    node: &Node,
    seed: &Url,
    prefix: &str,
    is_last: bool,
    depth: usize,
    color: bool,
    out: &mut String,
) {
    let connector = if is_last { "└── " } else { "├── " };
    let label = display_label(&node.url, seed);

    if color {
        let tint = DEPTH_COLORS[depth % DEPTH_COLORS.len()];
        out.push_str(&format!(
            "{}{}{}\n",
            prefix.bright_black(),
            connector.bright_black(),
            label.color(tint)
        ));
    } else {
        out.push_str(&format!("{}{}{}\n", prefix, connector, label));
    }

    let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
    let last = node.children.len().saturating_sub(1);
    for (idx, child) in node.children.iter().enumerate() {
        render_node(child, seed, &child_prefix, idx == last, depth + 1, color, out);
    }
}

fn display_label(url: &Url, seed: &Url) -> String {
    if url.host_str() != seed.host_str() || url.port() != seed.port() {
        return url.to_string();
    }
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

pub fn generate_text_report(outcome: &CrawlOutcome, color: bool) -> String {
    let mut report = String::new();

    report.push_str(&format!(
        "Number of pages found: {}\n",
        outcome.pages_found()
    ));
    let seed = outcome.seed.to_string();
    if color {
        report.push_str(&format!("{}\n", seed.bright_white().bold()));
    } else {
        report.push_str(&format!("{}\n", seed));
    }
    report.push_str(&render_tree(outcome.site_map.root(), color));
    report.push('\n');

    report.push_str(&format!("Stopped:       {}\n", outcome.stop_reason));
    report.push_str(&format!(
        "Pages visited: {}  fetched: {}  errors: {}\n",
        outcome.pages_visited, outcome.pages_fetched, outcome.fetch_errors
    ));
    if !outcome.banned.is_empty() {
        report.push_str(&format!(
            "Robots:        {} disallow rule(s) applied\n",
            outcome.banned.len()
        ));
    }
    report.push_str(&format!(
        "Elapsed:       {:.2}s\n",
        outcome.elapsed.as_secs_f64()
    ));

    report
}

fn json_value(outcome: &CrawlOutcome) -> serde_json::Value {
    serde_json::json!({
        "generated_at": chrono::Utc::now().to_rfc3339(),
        "seed": outcome.seed,
        "stop_reason": outcome.stop_reason,
        "pages_found": outcome.pages_found(),
        "pages_visited": outcome.pages_visited,
        "pages_fetched": outcome.pages_fetched,
        "fetch_errors": outcome.fetch_errors,
        "elapsed_ms": outcome.elapsed.as_millis() as u64,
        "tree": outcome.site_map.root(),
    })
}

pub fn generate_json_report(outcome: &CrawlOutcome) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(&json_value(outcome))?)
}

/// One report covering every outcome. Text reports are separated by a blank line; JSON
/// is a single object for one seed and an array for several.
pub fn generate_report(
    outcomes: &[&CrawlOutcome],
    format: ReportFormat,
    color: bool,
) -> Result<String, ReportError> {
    match format {
        ReportFormat::Text => Ok(outcomes
            .iter()
            .map(|outcome| generate_text_report(outcome, color))
            .collect::<Vec<_>>()
            .join("\n")),
        ReportFormat::Json => match outcomes {
            [single] => generate_json_report(single),
            many => {
                let values: Vec<serde_json::Value> =
                    many.iter().map(|outcome| json_value(outcome)).collect();
                Ok(serde_json::to_string_pretty(&values)?)
            }
        },
    }
}

pub fn save_report(content: &str, path: &Path) -> Result<(), ReportError> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
