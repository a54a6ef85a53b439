use crate::CLAP_STYLING;
use clap::{arg, command};
use url::Url;

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("sociogram")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("sociogram")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a profile's friends and friends of friends, assemble the social \
                graph and rank everyone by centrality.",
                )
                .arg(
                    arg!(-u --"user" <ID>)
                        .required(true)
                        .help("Numeric identity of the root profile")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(-t --"token" <TOKEN>)
                        .required(false)
                        .help("Friend service access token (default: SOCIOGRAM_TOKEN)")
                        .conflicts_with("token-file"),
                )
                .arg(
                    arg!(--"token-file" <PATH>)
                        .required(false)
                        .help("Read the access token from a file; '~' is expanded")
                        .conflicts_with("token"),
                )
                .arg(
                    arg!(--"api-base" <URL>)
                        .required(false)
                        .help("Root URL of the friend service")
                        .value_parser(clap::value_parser!(Url))
                        .default_value("https://api.vk.com"),
                )
                .arg(
                    arg!(-m --"max-friends" <COUNT>)
                        .required(false)
                        .help("How many direct friends to expand: a number or 'all'")
                        .default_value("all"),
                )
                .arg(
                    arg!(-n --"top" <COUNT>)
                        .required(false)
                        .help("How many nodes to list per centrality ranking: a number or 'all'")
                        .default_value("all"),
                )
                .arg(
                    arg!(--"delay-ms" <MILLIS>)
                        .required(false)
                        .help("Pause before each second-degree fetch, in milliseconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("330"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the report to a file (default: display to screen)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json, markdown")
                        .value_parser(["text", "json", "markdown"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"dot" <PATH>)
                        .required(false)
                        .help("Also export the graph in Graphviz DOT form to this file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
}
