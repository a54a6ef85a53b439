use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use sociogram_client::{Crawler, HttpFriendService, UserId};
use sociogram_core::report::{CrawlSummary, ReportFormat};
use sociogram_core::SocialGraph;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Parses a "how many" answer: a number, or `all` for no limit. Anything
/// unparseable warns and falls back to processing everything.
pub fn parse_count_or_all(input: &str) -> Option<usize> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("all") {
        return None;
    }

    match trimmed.parse::<usize>() {
        Ok(count) => Some(count),
        Err(_) => {
            eprintln!("⚠️  '{trimmed}' is not a count, processing everything");
            None
        }
    }
}

/// Resolves the access token from the flag, a token file or the
/// SOCIOGRAM_TOKEN environment variable, in that order.
pub fn resolve_token(token: Option<&String>, token_file: Option<&String>) -> anyhow::Result<String> {
    if let Some(token) = token {
        return Ok(token.clone());
    }

    if let Some(path) = token_file {
        let expanded = shellexpand::tilde(path);
        let contents = fs::read_to_string(expanded.as_ref())
            .with_context(|| format!("failed to read token file {path}"))?;
        let token = contents.trim().to_string();
        if token.is_empty() {
            bail!("token file {path} is empty");
        }
        return Ok(token);
    }

    if let Ok(token) = std::env::var("SOCIOGRAM_TOKEN")
        && !token.is_empty()
    {
        return Ok(token);
    }

    bail!("no access token: pass --token, --token-file or set SOCIOGRAM_TOKEN")
}

pub async fn handle_crawl(args: &ArgMatches) -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let root = UserId(*args.get_one::<u64>("user").expect("clap enforces --user"));
    let token = resolve_token(args.get_one("token"), args.get_one("token-file"))?;
    let api_base = args.get_one::<Url>("api-base").expect("has default").clone();
    let max_friends = parse_count_or_all(args.get_one::<String>("max-friends").expect("has default"));
    let top = parse_count_or_all(args.get_one::<String>("top").expect("has default"));
    let delay = Duration::from_millis(*args.get_one::<u64>("delay-ms").expect("has default"));
    let format = ReportFormat::from_str(args.get_one::<String>("format").expect("has default"))
        .expect("clap constrains the format");

    let service = HttpFriendService::new(token).with_base_url(api_base);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(format!("Fetching friends of {root}..."));

    let pb = spinner.clone();
    let crawler = Crawler::new(service)
        .with_max_friends(max_friends)
        .with_request_delay(delay)
        .with_progress_callback(Arc::new(move |i: usize, name: String| {
            pb.set_message(format!("Expanding friend {}: {}", i + 1, name));
        }));

    let outcome = crawler.crawl(root).await;
    spinner.finish_and_clear();

    if outcome.is_empty() {
        println!(
            "{} Friend list of {root} is not visible; nothing to map",
            "⚠".yellow().bold()
        );
    }

    let graph = SocialGraph::assemble(&outcome, root);
    let summary = CrawlSummary::build(&outcome, &graph, root, top);

    if let Some(path) = args.get_one::<PathBuf>("dot") {
        fs::write(path, graph.to_dot())
            .with_context(|| format!("failed to write DOT export to {}", path.display()))?;
        println!("{} Graph exported to {}", "✓".green(), path.display());
    }

    match args.get_one::<PathBuf>("output") {
        Some(path) => {
            summary
                .write_to_file(path, &format)
                .with_context(|| format!("failed to save report to {}", path.display()))?;
            println!("{} Report saved to {}", "✓".green(), path.display());
        }
        None => print!("{}", summary.render(&format)),
    }

    println!();
    println!(
        "{} Direct friends: {}",
        "✓".green().bold(),
        summary.total_friends
    );
    println!(
        "{} Friends of friends: {}",
        "✓".green().bold(),
        summary.total_friends_of_friends
    );
    println!(
        "{} Graph: {} nodes, {} edges",
        "✓".green().bold(),
        summary.node_count,
        summary.edge_count
    );
    if !summary.skipped_branches.is_empty() {
        println!(
            "{} Skipped branches: {}",
            "⚠".yellow().bold(),
            summary.skipped_branches.len()
        );
    }

    Ok(())
}
