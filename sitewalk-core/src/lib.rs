pub mod crawl;
pub mod report;

use colored::Colorize;

pub fn print_banner() {
    let banner = r#"
  ┌─┐┬┌┬┐┌─┐┬ ┬┌─┐┬  ┬┌─
  └─┐│ │ ├┤ │││├─┤│  ├┴┐
  └─┘┴ ┴ └─┘└┴┘┴ ┴┴─┘┴ ┴"#;
    eprintln!("{}", banner.bright_cyan());
    eprintln!(
        "  {} {}\n",
        "single-site crawler and site mapper".bright_white(),
        concat!("v", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
