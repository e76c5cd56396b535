use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::models::{Mode, OptionStatus, SearchOptions};

/// Top-level CLI entrypoint for `siggrep`.
#[derive(Parser, Debug)]
#[command(
    name = "siggrep",
    about = "Signature-directed search over library API catalogs",
    author = "siggrep developers",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the loaded catalogs with a name, signature,
    /// active-pattern, or computation-expression query.
    Search(SearchArgs),
    /// Show the assemblies and entry counts of catalog files.
    Dictionaries(DictionariesArgs),
}

/// Dialect selector exposed on the command line.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeArg {
    Primary,
    Secondary,
}

impl ModeArg {
    pub fn to_model(self) -> Mode {
        match self {
            ModeArg::Primary => Mode::Primary,
            ModeArg::Secondary => Mode::Secondary,
        }
    }
}

/// Output format for search results.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Table,
    Json,
}

/// Arguments specific to the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query text, e.g. `'a list -> int`, `Seq.map : _`,
    /// `(||) : ... -> 'a -> bool`, or `{ let! } : async<'a>`.
    pub query: String,

    /// Catalog files to search, in order.
    #[arg(short = 'd', long = "dictionary", env = "SIGGREP_DICTIONARY")]
    pub dictionaries: Vec<PathBuf>,

    /// Initialization strategy (primary or secondary dialect).
    #[arg(long = "mode", value_enum)]
    pub mode: Option<ModeArg>,

    /// Compare identities case-insensitively.
    #[arg(long = "ignore-case")]
    pub ignore_case: bool,

    /// Let a trailing query wildcard absorb the rest of an arrow.
    #[arg(long = "greedy")]
    pub greedy: bool,

    /// Fan the catalog scan out over worker threads. Output order is
    /// stabilized by the distance sort either way.
    #[arg(long = "parallel")]
    pub parallel: bool,

    /// Add distance when identities only match through compiled
    /// names (true by default).
    #[arg(long = "respect-name-difference")]
    pub respect_name_difference: Option<bool>,

    /// Allow curried/tupled reshaping and abbreviation transparency
    /// (true by default).
    #[arg(long = "ignore-parameter-style")]
    pub ignore_parameter_style: Option<bool>,

    /// Budget of adjacent swaps tried on the query side. Negative
    /// values clamp to 0.
    #[arg(long = "swap-order-depth", allow_hyphen_values = true)]
    pub swap_order_depth: Option<i64>,

    /// Budget of trailing optional parameters dropped from a target.
    /// Negative values clamp to 0.
    #[arg(long = "complement-depth", allow_hyphen_values = true)]
    pub complement_depth: Option<i64>,

    /// Maximum number of results to print.
    #[arg(long = "limit")]
    pub limit: Option<usize>,

    /// Output format (text, table, or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Arguments specific to the `dictionaries` subcommand.
#[derive(Args, Debug)]
pub struct DictionariesArgs {
    /// Catalog files to inspect.
    #[arg(short = 'd', long = "dictionary", env = "SIGGREP_DICTIONARY")]
    pub dictionaries: Vec<PathBuf>,

    /// Output format (text, table, or json).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Fold the search flags into a `SearchOptions` record; unset flags
/// keep the documented defaults.
pub fn search_options_from_args(args: &SearchArgs) -> SearchOptions {
    let mut options = SearchOptions::default();
    if let Some(mode) = args.mode {
        options.mode = mode.to_model();
    }
    if args.ignore_case {
        options.ignore_case = OptionStatus::Enabled;
    }
    if args.greedy {
        options.greedy_matching = OptionStatus::Enabled;
    }
    if args.parallel {
        options.parallel = OptionStatus::Enabled;
    }
    if let Some(respect) = args.respect_name_difference {
        options.respect_name_difference = OptionStatus::from(respect);
    }
    if let Some(ignore) = args.ignore_parameter_style {
        options.ignore_parameter_style = OptionStatus::from(ignore);
    }
    if let Some(depth) = args.swap_order_depth {
        options.swap_order_depth = SearchOptions::clamp_depth(depth);
    }
    if let Some(depth) = args.complement_depth {
        options.complement_depth = SearchOptions::clamp_depth(depth);
    }
    options
}
