//! CLI argument definitions for Tradelens.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `report` | Series, YoY growth and subcategory breakdown for one selection |
//! | `lookup` | Description and children of an HS code |
//! | `country` | Resolve a country name, Census code or ISO2 code |
//! | `search` | Keyword search over HS descriptions |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | `600000` | Per-request transport timeout |
//! | `--max-attempts` | `5` | Fetch attempts before giving up |
//! | `--retry-interval-ms` | `500` | Pause between attempts |
//! | `--deadline-ms` | none | Overall budget per fetch |
//! | `--catalog` | bundled | HS/country catalog JSON file |
//! | `--no-cache` | `false` | Bypass the session fetch cache |
//! | `--verbose` | `false` | Debug logging on stderr |
//!
//! # Examples
//!
//! ```bash
//! tradelens report --flow imports --country Mexico --code 08 --start 2021-01 --end 2022-01
//! tradelens lookup 0804 --format table
//! tradelens country MX
//! tradelens search fresh avocados --mode all --in 08
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Tradelens - U.S. international trade statistics by country and HS code.
#[derive(Debug, Parser)]
#[command(
    name = "tradelens",
    author,
    version,
    about = "U.S. international trade statistics by country and HS code"
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Per-request transport timeout in milliseconds.
    #[arg(long, global = true, default_value_t = 600_000)]
    pub timeout_ms: u64,

    /// Total fetch attempts, including the first one.
    #[arg(long, global = true, default_value_t = 5)]
    pub max_attempts: u32,

    /// Fixed pause between failed attempts in milliseconds.
    #[arg(long, global = true, default_value_t = 500)]
    pub retry_interval_ms: u64,

    /// Overall budget for one fetch, across attempts, in milliseconds.
    #[arg(long, global = true)]
    pub deadline_ms: Option<u64>,

    /// Catalog JSON file replacing the bundled HS/country tables.
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Always fetch; do not read or populate the cache.
    #[arg(long, global = true, default_value_t = false)]
    pub no_cache: bool,

    /// Debug logging on stderr (RUST_LOG overrides).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Plain-text tables for terminal display.
    Table,
    /// Single JSON envelope.
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FlowArg {
    Imports,
    Exports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchModeArg {
    /// Descriptions containing any keyword.
    Any,
    /// Descriptions containing every keyword.
    All,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Trade series, YoY growth and subcategory breakdown.
    ///
    /// The primary series is fetched from one year before --start so the
    /// growth rate exists for the first displayed month.
    ///
    /// # Examples
    ///
    ///   tradelens report --country Mexico --code 08
    ///   tradelens report --flow exports --country CA --code 8703 --start 2022-01 --end 2023-12
    Report(ReportArgs),

    /// Description and immediate children of an HS code.
    Lookup(LookupArgs),

    /// Resolve a country by name, then Census code, then ISO2.
    Country(CountryArgs),

    /// Keyword search over HS code descriptions.
    Search(SearchArgs),
}

/// Arguments for the `report` command.
#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(long, value_enum, default_value_t = FlowArg::Imports)]
    pub flow: FlowArg,

    /// Country name, Census code or ISO2 code.
    #[arg(long, default_value = "Mexico")]
    pub country: String,

    /// HS code (2 to 10 digits).
    #[arg(long, default_value = "08")]
    pub code: String,

    /// First displayed month (YYYY-MM or YYYY-MM-DD).
    #[arg(long, default_value = "2021-01")]
    pub start: String,

    /// Last displayed month (YYYY-MM or YYYY-MM-DD).
    #[arg(long, default_value = "2025-01")]
    pub end: String,
}

/// Arguments for the `lookup` command.
#[derive(Debug, Args)]
pub struct LookupArgs {
    /// HS code to describe.
    pub code: String,
}

/// Arguments for the `country` command.
#[derive(Debug, Args)]
pub struct CountryArgs {
    /// Country name, Census code or ISO2 code.
    pub identifier: String,
}

/// Arguments for the `search` command.
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Keywords matched case-insensitively against descriptions.
    #[arg(required = true, num_args = 1..)]
    pub keywords: Vec<String>,

    #[arg(long, value_enum, default_value_t = SearchModeArg::Any)]
    pub mode: SearchModeArg,

    /// Restrict results to codes under this prefix (repeatable).
    #[arg(long = "in", value_name = "CODE")]
    pub in_codes: Vec<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_defaults_match_the_dashboard() {
        let cli = Cli::try_parse_from(["tradelens", "report"]).expect("defaults parse");
        let Command::Report(args) = cli.command else {
            panic!("expected report command");
        };
        assert_eq!(args.flow, FlowArg::Imports);
        assert_eq!(args.country, "Mexico");
        assert_eq!(args.code, "08");
        assert_eq!(args.start, "2021-01");
        assert_eq!(cli.max_attempts, 5);
    }

    #[test]
    fn search_accepts_repeated_prefixes() {
        let cli = Cli::try_parse_from([
            "tradelens", "search", "fresh", "fruit", "--mode", "all", "--in", "08", "--in", "09",
        ])
        .expect("search parses");
        let Command::Search(args) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.keywords, vec!["fresh", "fruit"]);
        assert_eq!(args.mode, SearchModeArg::All);
        assert_eq!(args.in_codes, vec!["08", "09"]);
    }
}
