use anyhow::{bail, Result};
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::catalog;
use crate::search;

mod args;
mod config;
mod format;

pub use args::{Cli, Commands, DictionariesArgs, ModeArg, OutputFormat, SearchArgs};

use config::{
    apply_dictionaries_config_defaults, apply_search_config_defaults, load_cli_config,
};

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cli_config = load_cli_config()?;

    match cli.command {
        Some(Commands::Search(mut search_args)) => {
            if let Some(ref config) = cli_config {
                apply_search_config_defaults(config, &mut search_args);
            }
            if search_args.dictionaries.is_empty() {
                bail!(
                    "no dictionaries given; pass --dictionary or configure one in siggrep.toml"
                );
            }

            let options = args::search_options_from_args(&search_args);
            let dictionaries = catalog::load_dictionaries(&search_args.dictionaries)?;
            let mut results = search::search(&dictionaries, &options, &search_args.query)?;

            // Rank by distance; the sort is stable, so dictionary
            // order breaks ties (and stabilizes parallel output).
            results.sort_by_key(|item| item.distance);
            if let Some(limit) = search_args.limit {
                results.truncate(limit);
            }

            match search_args.format {
                OutputFormat::Text => format::print_text(&results),
                OutputFormat::Table => format::print_table(&results),
                OutputFormat::Json => format::print_json(&search_args.query, &results),
            }
        }
        Some(Commands::Dictionaries(mut dict_args)) => {
            if let Some(ref config) = cli_config {
                apply_dictionaries_config_defaults(config, &mut dict_args);
            }
            if dict_args.dictionaries.is_empty() {
                bail!(
                    "no dictionaries given; pass --dictionary or configure one in siggrep.toml"
                );
            }

            let dictionaries = catalog::load_dictionaries(&dict_args.dictionaries)?;
            match dict_args.format {
                OutputFormat::Text | OutputFormat::Table => {
                    format::print_dictionary_summaries(&dictionaries)
                }
                OutputFormat::Json => {
                    let summaries: Vec<serde_json::Value> = dictionaries
                        .iter()
                        .map(|d| {
                            serde_json::json!({
                                "assembly_name": d.assembly_name,
                                "apis": d.apis.len(),
                                "type_definitions": d.type_definitions.len(),
                                "type_abbreviations": d.type_abbreviations.len(),
                            })
                        })
                        .collect();
                    serde_json::to_writer(std::io::stdout(), &summaries)?;
                    println!();
                    Ok(())
                }
            }
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("SIGGREP_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
