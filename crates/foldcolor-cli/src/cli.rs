use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "foldcolor - Batch RNA secondary-structure folding with base-pairing probability coloring and RNArtist visualization scripts.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Number of sequences folded in parallel.
    /// Overrides the profile and the configuration file; defaults to the number of logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to the global configuration file in TOML format.
    /// Defaults to `foldcolor.toml` in the working directory, then the user config directory.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fold every sequence of a FASTA file or directory and write colored reports and scripts.
    Run(RunArgs),
    /// List the available colormaps.
    Colormaps(ColormapsArgs),
    /// Check that the external tools (RNAfold, Java, RNArtistCore) can be found.
    Check(CheckArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// A FASTA file, or a directory whose *.fasta, *.fa and *.txt files are read.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Path to a JSON folding profile.
    #[arg(short, long, value_name = "PATH")]
    pub profile: Option<PathBuf>,

    /// Root directory for run outputs, overriding `output.root`.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Override the colormap from the configuration and profile.
    #[arg(long, value_name = "NAME")]
    pub colormap: Option<String>,

    /// Override the coloring mode (`paired_only` or `all_pi`).
    #[arg(long, value_name = "MODE")]
    pub coloring_mode: Option<String>,

    #[command(flatten)]
    pub tools: ToolArgs,

    /// Write scripts but do not run RNArtistCore.
    #[arg(long)]
    pub skip_render: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S colormap.name=viridis
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `colormaps` subcommand.
#[derive(Args, Debug)]
pub struct ColormapsArgs {
    /// Show the colormaps of one category instead of the category overview.
    #[arg(long, value_name = "NAME")]
    pub category: Option<String>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub tools: ToolArgs,
}

/// Explicit locations of the external tools.
#[derive(Args, Debug, Clone, Default)]
pub struct ToolArgs {
    /// Path to the RNAfold executable.
    #[arg(long, value_name = "PATH")]
    pub rnafold: Option<PathBuf>,

    /// Path to the Java runtime.
    #[arg(long, value_name = "PATH")]
    pub java: Option<PathBuf>,

    /// Path to the RNArtistCore jar.
    #[arg(long, value_name = "PATH")]
    pub jar: Option<PathBuf>,
}
