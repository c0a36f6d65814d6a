// Tests for report generation functionality

use sitewalk_core::report::{
    ReportError, ReportFormat, generate_json_report, generate_report, generate_text_report,
    render_tree, save_report,
};
use sitewalk_scanner::{CrawlOutcome, Node, SiteMap, StopReason};
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

fn node(s: &str, children: Vec<Node>) -> Node {
    Node {
        url: url(s),
        children,
    }
}

/// `/` with `/a` (which has `/a/x`) and `/b`.
fn sample_outcome() -> CrawlOutcome {
    let root = node(
        "https://example.com/",
        vec![
            node(
                "https://example.com/a",
                vec![node("https://example.com/a/x", vec![])],
            ),
            node("https://example.com/b", vec![]),
        ],
    );
    CrawlOutcome {
        seed: url("https://example.com/"),
        site_map: SiteMap::new(root),
        stop_reason: StopReason::Idle,
        pages_visited: 4,
        pages_fetched: 4,
        fetch_errors: 0,
        banned: vec![],
        elapsed: Duration::from_millis(1500),
    }
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!("text".parse::<ReportFormat>().unwrap(), ReportFormat::Text);
    assert_eq!("JSON".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
}

#[test]
fn test_report_format_from_str_invalid() {
    let result = "csv".parse::<ReportFormat>();
    assert!(matches!(result, Err(ReportError::UnknownFormat(ref f)) if f == "csv"));
}

#[test]
fn test_report_format_default_is_text() {
    assert_eq!(ReportFormat::default(), ReportFormat::Text);
}

// ============================================================================
// Tree Rendering Tests
// ============================================================================

#[test]
fn test_render_tree_connectors() {
    let outcome = sample_outcome();
    let tree = render_tree(outcome.site_map.root(), false);

    assert_eq!(tree, "├── /a\n│   └── /a/x\n└── /b\n");
}

#[test]
fn test_render_tree_seed_only() {
    let root = node("https://example.com/", vec![]);
    assert_eq!(render_tree(&root, false), "");
}

#[test]
fn test_render_tree_other_host_shows_full_url() {
    let root = node(
        "https://example.com/",
        vec![
            node("https://docs.example.com/start", vec![]),
            node("https://example.com/search?q=rust", vec![]),
        ],
    );
    let tree = render_tree(&root, false);

    assert!(tree.contains("├── https://docs.example.com/start\n"));
    assert!(tree.contains("└── /search?q=rust\n"));
}

#[test]
fn test_render_tree_deep_prefixes() {
    let root = node(
        "https://example.com/",
        vec![node(
            "https://example.com/1",
            vec![node(
                "https://example.com/1/2",
                vec![node("https://example.com/1/2/3", vec![])],
            )],
        )],
    );
    let tree = render_tree(&root, false);
    let lines: Vec<&str> = tree.lines().collect();

    assert_eq!(lines[0], "└── /1");
    assert_eq!(lines[1], "    └── /1/2");
    assert_eq!(lines[2], "        └── /1/2/3");
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_contents() {
    let report = generate_text_report(&sample_outcome(), false);

    // The seed itself is not counted as found.
    assert!(report.starts_with("Number of pages found: 3\nhttps://example.com/\n"));
    assert!(report.contains("├── /a\n"));
    assert!(report.contains("Stopped:       frontier idle"));
    assert!(report.contains("Pages visited: 4  fetched: 4  errors: 0"));
    assert!(report.contains("Elapsed:       1.50s"));
    assert!(!report.contains("Robots:"));
}

#[test]
fn test_text_report_mentions_robots_exclusions() {
    let mut outcome = sample_outcome();
    outcome.banned = vec![url("https://example.com/private")];
    outcome.stop_reason = StopReason::BudgetExhausted;

    let report = generate_text_report(&outcome, false);
    assert!(report.contains("Robots:        1 disallow rule(s) applied"));
    assert!(report.contains("page budget exhausted"));
}

#[test]
fn test_text_report_without_color_has_no_escapes() {
    let report = generate_text_report(&sample_outcome(), false);
    assert!(!report.contains('\x1b'));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_structure() {
    let json = generate_json_report(&sample_outcome()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["seed"], "https://example.com/");
    assert_eq!(value["stop_reason"], "idle");
    assert_eq!(value["pages_found"], 3);
    assert_eq!(value["pages_visited"], 4);
    assert_eq!(value["fetch_errors"], 0);
    assert_eq!(value["elapsed_ms"], 1500);
    assert!(value["generated_at"].is_string());

    let tree = &value["tree"];
    assert_eq!(tree["url"], "https://example.com/");
    assert_eq!(tree["children"][0]["url"], "https://example.com/a");
    assert_eq!(
        tree["children"][0]["children"][0]["url"],
        "https://example.com/a/x"
    );
    assert_eq!(tree["children"][1]["children"].as_array().unwrap().len(), 0);
}

#[test]
fn test_generate_report_json_many_is_array() {
    let first = sample_outcome();
    let second = sample_outcome();

    let json = generate_report(&[&first, &second], ReportFormat::Json, false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 2);

    let json = generate_report(&[&first], ReportFormat::Json, false).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.is_object());
}

#[test]
fn test_generate_report_text_joins_seeds() {
    let first = sample_outcome();
    let second = sample_outcome();

    let report = generate_report(&[&first, &second], ReportFormat::Text, false).unwrap();
    assert_eq!(report.matches("Number of pages found").count(), 2);
}

// ============================================================================
// Save Report Tests
// ============================================================================

#[test]
fn test_save_report() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("sitemap.txt");

    save_report("hello", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello");
}

#[test]
fn test_save_report_missing_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("sitemap.txt");

    assert!(matches!(save_report("hello", &path), Err(ReportError::Io(_))));
}
