pub mod centrality;
pub mod graph;
pub mod report;

use colored::Colorize;

pub use graph::{NodeAttrs, ROOT_DISPLAY_NAME, SocialGraph};
pub use report::{CrawlSummary, ReportFormat};

pub fn print_banner() {
    println!(
        "{}",
        r#"
  ___  ___   ___(_) ___   __ _ _ __ __ _ _ __ ___
 / __|/ _ \ / __| |/ _ \ / _` | '__/ _` | '_ ` _ \
 \__ \ (_) | (__| | (_) | (_| | | | (_| | | | | | |
 |___/\___/ \___|_|\___/ \__, |_|  \__,_|_| |_| |_|
                         |___/"#
            .bright_cyan()
    );
    println!("{}\n", "  map your social circle".dimmed());
}
