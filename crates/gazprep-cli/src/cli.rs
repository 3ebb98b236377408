//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API.

use clap::{Args, Parser, Subcommand, ValueEnum};
use gazprep_core::StageParams;
use is_terminal::IsTerminal;
use std::path::{Path, PathBuf};

/// Gazprep - filter and normalize gazetteer records before indexing
///
/// Reads gazetteer records as JSON Lines, drops the ones outside the
/// configured categories and rewrites the survivors into the shape the
/// search index expects.
#[derive(Parser, Debug)]
#[command(
    name = "gazprep",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "GAZPREP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for reports
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Filter and normalize a JSON Lines file, writing the kept records
    Process(ProcessArgs),

    /// Report the verdict and normalizations for each record without writing them
    Check(CheckArgs),

    /// Manage configuration files
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Stage settings that override the configuration file
#[derive(Args, Debug, Default, Clone)]
pub struct StageOverrides {
    /// Category to keep (repeatable, comma-separated, `all` keeps everything)
    #[arg(long = "include-category", value_name = "CATEGORY")]
    pub include_category: Vec<String>,

    /// Field holding the record category
    #[arg(long, value_name = "FIELD")]
    pub category_field: Option<String>,

    /// Country code to keep (repeatable, comma-separated)
    #[arg(long = "country", value_name = "CODE")]
    pub countries: Vec<String>,

    /// Drop records without a name
    #[arg(long)]
    pub require_name: bool,

    /// Remove lat/lon after writing geo
    #[arg(long)]
    pub remove_lat_lon: bool,

    /// Do not mark short names as search-only
    #[arg(long)]
    pub no_short_name_flag: bool,

    /// Mark short word-and-digits names as search-only
    #[arg(long)]
    pub flag_short_alphanumeric: bool,

    /// File of stop terms (CSV with an `exclusion` column, or one per line)
    #[arg(long, value_name = "FILE")]
    pub stop_terms_file: Option<PathBuf>,

    /// Copy names into script-specific fields
    #[arg(long)]
    pub expand_scripts: bool,
}

impl StageOverrides {
    /// Layer the flags that were given on top of file-sourced parameters
    pub fn apply(&self, params: &mut StageParams) {
        if !self.include_category.is_empty() {
            params.include_category = Some(self.include_category.clone());
        }
        if let Some(field) = &self.category_field {
            params.category_field = Some(field.clone());
        }
        if !self.countries.is_empty() {
            params.countries = Some(self.countries.clone());
        }
        if self.require_name {
            params.require_name = Some(true);
        }
        if self.remove_lat_lon {
            params.remove_source_lat_lon = Some(true);
        }
        if self.no_short_name_flag {
            params.flag_short_names = Some(false);
        }
        if self.flag_short_alphanumeric {
            params.flag_short_alphanumeric = Some(true);
        }
        if let Some(path) = &self.stop_terms_file {
            params.stop_terms_file = Some(path.clone());
        }
        if self.expand_scripts {
            params.expand_scripts = Some(true);
        }
    }
}

/// Arguments for the process command
#[derive(Parser, Debug)]
pub struct ProcessArgs {
    /// JSON Lines input file (stdin when omitted or `-`)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Write kept records to a file instead of stdout
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,

    /// Number of worker tasks
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Records handed to a worker at a time
    #[arg(long, default_value = "1000")]
    pub batch_size: usize,

    #[command(flatten)]
    pub stage: StageOverrides,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// JSON Lines input file (stdin when omitted or `-`)
    #[arg(value_name = "INPUT")]
    pub input: Option<PathBuf>,

    /// Only report excluded records
    #[arg(long)]
    pub only_excluded: bool,

    #[command(flatten)]
    pub stage: StageOverrides,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Validate the effective configuration
    Validate,
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file
    #[arg(long, default_value = ".gazprep.toml")]
    pub path: PathBuf,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "toml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stderr().is_terminal()
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}

/// `None` and `-` both mean stdin
pub fn input_path(input: Option<&Path>) -> Option<&Path> {
    input.filter(|path| path.as_os_str() != "-")
}
