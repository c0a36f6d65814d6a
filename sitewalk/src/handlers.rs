use anyhow::{Context, Result, bail};
use clap::ArgMatches;
use colored::Colorize;
use sitewalk_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
use sitewalk_core::report::{ReportFormat, generate_report, save_report};
use sitewalk_scanner::{CrawlOutcome, Crawler, CrawlerConfig, ScopeMode};
use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(url: Option<&Url>, hosts_file: Option<&PathBuf>) -> Result<Vec<String>> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        bail!("Either --url or --hosts-file must be provided")
    }
}

/// Load and parse URLs from a file. Blank lines and `#` comments are ignored.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    if let Ok(url) = Url::parse(line)
        && url.has_host()
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if Url::parse(&with_scheme).is_ok() {
        return Some(with_scheme);
    }

    eprintln!("{} Skipping invalid URL '{}'", "⚠".yellow(), line);
    None
}

fn millis(args: &ArgMatches, id: &str) -> Option<Duration> {
    args.try_get_one::<u64>(id)
        .ok()
        .flatten()
        .map(|ms| Duration::from_millis(*ms))
}

fn flag(args: &ArgMatches, id: &str) -> bool {
    matches!(args.try_get_one::<bool>(id), Ok(Some(true)))
}

/// Maps `crawl` / `robots` flags onto the engine configuration. Flags a subcommand does
/// not define keep their defaults.
pub fn build_crawler_config(args: &ArgMatches) -> Result<CrawlerConfig> {
    let mut config = CrawlerConfig::default();

    if let Ok(Some(threads)) = args.try_get_one::<usize>("threads") {
        config.workers = *threads;
    }
    if let Ok(max_pages) = args.try_get_one::<usize>("max-pages") {
        config.max_pages = max_pages.copied();
    }
    if let Some(rate) = millis(args, "rate") {
        config.crawl_rate = rate;
    }
    if let Some(idle) = millis(args, "idle-timeout") {
        config.idle_timeout = idle;
    }
    if let Some(timeout) = millis(args, "http-timeout") {
        config.request_timeout = timeout;
    }
    if let Ok(Some(user_agent)) = args.try_get_one::<String>("user-agent") {
        config.user_agent = user_agent.clone();
    }
    if flag(args, "ignore-robots") {
        config.respect_robots = false;
    }
    if flag(args, "loose-scope") {
        config.scope = ScopeMode::Loose;
    }
    if flag(args, "disguise") {
        config = config.disguise();
    }

    config.validate().context("Invalid crawl settings")?;
    Ok(config)
}

fn print_settings(urls: &[String], config: &CrawlerConfig) {
    eprintln!("{} Crawling {} host(s)", "→".blue(), urls.len());
    eprintln!("  Workers:      {}", config.workers);
    eprintln!(
        "  Page budget:  {}",
        config
            .max_pages
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unlimited".to_string())
    );
    eprintln!("  Crawl rate:   {}ms", config.crawl_rate.as_millis());
    eprintln!("  Idle timeout: {}ms", config.idle_timeout.as_millis());
    eprintln!(
        "  robots.txt:   {}",
        if config.respect_robots { "honoured" } else { "ignored" }
    );
    eprintln!("  User-Agent:   {}\n", config.user_agent);
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let format: ReportFormat = sub_matches
        .get_one::<String>("format")
        .map(|f| f.parse())
        .transpose()?
        .unwrap_or_default();
    let output = sub_matches
        .get_one::<String>("output")
        .map(|path| PathBuf::from(shellexpand::tilde(path).as_ref()));

    let urls = load_urls_from_source(url, hosts_file)?;
    let config = build_crawler_config(sub_matches)?;
    debug!(?config, "Resolved crawl settings");

    if !quiet {
        print_settings(&urls, &config);
    }

    let options = CrawlOptions {
        urls,
        config,
        show_progress_bars: !quiet,
    };
    let progress_callback: CrawlProgressCallback = Arc::new(|msg: String| {
        eprintln!("{}", msg);
    });

    let runs = execute_crawl(options, Some(progress_callback))
        .await
        .context("Crawl failed")?;

    let outcomes: Vec<&CrawlOutcome> = runs
        .iter()
        .filter_map(|run| run.outcome.as_ref().ok())
        .collect();
    if outcomes.is_empty() {
        bail!("None of the {} seed(s) could be crawled", runs.len());
    }

    match output {
        Some(path) => {
            let report = generate_report(&outcomes, format, false)?;
            save_report(&report, &path)
                .with_context(|| format!("Could not save report to {}", path.display()))?;
            if !quiet {
                eprintln!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            }
        }
        None => {
            let color = format == ReportFormat::Text && io::stdout().is_terminal();
            print!("{}", generate_report(&outcomes, format, color)?);
        }
    }

    Ok(())
}

pub async fn handle_robots(sub_matches: &ArgMatches) -> Result<()> {
    let url = sub_matches
        .get_one::<Url>("url")
        .context("--url is required")?;

    let config = build_crawler_config(sub_matches)?;
    let crawler = Crawler::new(config)?;

    let policy = crawler
        .load_robots_policy(url)
        .await
        .with_context(|| format!("Could not read robots.txt for {}", url))?;

    println!("Rules for: {}", policy.agent());
    if policy.disallowed().is_empty() {
        println!("{} Nothing is disallowed", "✓".green().bold());
    } else {
        println!("{} disallow rule(s):", policy.disallowed().len());
        for rule in policy.disallowed() {
            println!("  {}", rule);
        }
    }

    Ok(())
}
