use crate::CLAP_STYLING;
use clap::{ArgAction, arg, command};
use url::Url;

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("sitewalk")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sitewalk")
        .about("Crawls a website and prints the tree of pages reachable from a seed URL")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner, progress and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Log engine activity to stderr (repeat for more detail)")
                .required(false)
                .action(ArgAction::Count)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            command!("crawl")
                .about("Crawl a host or collection of hosts and print a site map for each")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required_unless_present("hosts-file")
                        .help("The seed URL to crawl")
                        .value_parser(clap::value_parser!(Url))
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of seed URLs, crawled one after another")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async workers pulling from the frontier")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10000"),
                )
                .arg(
                    arg!(--"max-pages" <NUM_PAGES>)
                        .required(false)
                        .help("Stop after this many pages have been claimed (default: no limit)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"rate" <MS>)
                        .required(false)
                        .help("Minimum milliseconds between two fetches starting (0 disables throttling)")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("1"),
                )
                .arg(
                    arg!(--"idle-timeout" <MS>)
                        .required(false)
                        .help("Finish once no page has been processed for this many milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("5000"),
                )
                .arg(
                    arg!(--"http-timeout" <MS>)
                        .required(false)
                        .help("Per-request timeout in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("2000"),
                )
                .arg(
                    arg!(--"ignore-robots")
                        .required(false)
                        .help("Do not fetch or honour robots.txt")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"user-agent" <USER_AGENT>)
                        .required(false)
                        .help("User-Agent header sent with every request")
                        .conflicts_with("disguise"),
                )
                .arg(
                    arg!(--"disguise")
                        .required(false)
                        .help("Pose as Googlebot and ignore robots.txt")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"loose-scope")
                        .required(false)
                        .help("Treat any host containing the seed host (or contained in it) as the same site")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
        .subcommand(
            command!("robots")
                .about("Show the paths a site's robots.txt keeps this crawler out of")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("Any URL on the site")
                        .value_parser(clap::value_parser!(Url)),
                )
                .arg(
                    arg!(--"user-agent" <USER_AGENT>)
                        .required(false)
                        .help("User-Agent to evaluate the rules for")
                        .conflicts_with("disguise"),
                )
                .arg(
                    arg!(--"disguise")
                        .required(false)
                        .help("Evaluate the rules for the Googlebot decoy")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"http-timeout" <MS>)
                        .required(false)
                        .help("Request timeout in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("2000"),
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_is_well_formed() {
        command_argument_builder().debug_assert();
    }

    #[test]
    fn test_crawl_requires_a_seed() {
        let result = command_argument_builder().try_get_matches_from(["sitewalk", "crawl"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_url_and_hosts_file_conflict() {
        let result = command_argument_builder().try_get_matches_from([
            "sitewalk",
            "crawl",
            "-u",
            "https://example.com",
            "-H",
            "hosts.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let matches = command_argument_builder()
            .try_get_matches_from(["sitewalk", "crawl", "-u", "https://example.com", "-q", "-vv"])
            .unwrap();
        assert!(matches.get_flag("quiet"));
        assert_eq!(matches.get_count("verbose"), 2);
    }
}
