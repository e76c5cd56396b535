//! Optional TOML configuration supplying CLI defaults.
//!
//! `siggrep.toml` in the working directory (or the file named by
//! `SIGGREP_CONFIG`) can predefine dictionaries and search options.
//! Explicit command-line flags always win over config values, and
//! config values win over built-in defaults.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use super::args::{DictionariesArgs, ModeArg, SearchArgs};

#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    pub search: Option<SearchDefaults>,
}

/// Defaults for the `search` subcommand.
#[derive(Debug, Default, Deserialize)]
pub struct SearchDefaults {
    pub dictionaries: Option<Vec<PathBuf>>,
    pub mode: Option<ModeArg>,
    pub ignore_case: Option<bool>,
    pub greedy: Option<bool>,
    pub parallel: Option<bool>,
    pub respect_name_difference: Option<bool>,
    pub ignore_parameter_style: Option<bool>,
    pub swap_order_depth: Option<i64>,
    pub complement_depth: Option<i64>,
    pub limit: Option<usize>,
}

/// Load the CLI config if one exists.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let path = std::env::var_os("SIGGREP_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("siggrep.toml"));
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)
        .with_context(|| format!("cannot read config {}", path.display()))?;
    let config = parse_cli_config(&text)
        .with_context(|| format!("cannot parse config {}", path.display()))?;
    Ok(Some(config))
}

fn parse_cli_config(text: &str) -> Result<CliConfig> {
    Ok(toml::from_str(text)?)
}

/// Fill unset `search` flags from the config.
pub fn apply_search_config_defaults(config: &CliConfig, args: &mut SearchArgs) {
    let Some(defaults) = &config.search else {
        return;
    };
    if args.dictionaries.is_empty() {
        if let Some(dictionaries) = &defaults.dictionaries {
            args.dictionaries = dictionaries.clone();
        }
    }
    if args.mode.is_none() {
        args.mode = defaults.mode;
    }
    if !args.ignore_case {
        args.ignore_case = defaults.ignore_case.unwrap_or(false);
    }
    if !args.greedy {
        args.greedy = defaults.greedy.unwrap_or(false);
    }
    if !args.parallel {
        args.parallel = defaults.parallel.unwrap_or(false);
    }
    if args.respect_name_difference.is_none() {
        args.respect_name_difference = defaults.respect_name_difference;
    }
    if args.ignore_parameter_style.is_none() {
        args.ignore_parameter_style = defaults.ignore_parameter_style;
    }
    if args.swap_order_depth.is_none() {
        args.swap_order_depth = defaults.swap_order_depth;
    }
    if args.complement_depth.is_none() {
        args.complement_depth = defaults.complement_depth;
    }
    if args.limit.is_none() {
        args.limit = defaults.limit;
    }
}

/// Fill unset `dictionaries` flags from the config.
pub fn apply_dictionaries_config_defaults(config: &CliConfig, args: &mut DictionariesArgs) {
    let Some(defaults) = &config.search else {
        return;
    };
    if args.dictionaries.is_empty() {
        if let Some(dictionaries) = &defaults.dictionaries {
            args.dictionaries = dictionaries.clone();
        }
    }
}
