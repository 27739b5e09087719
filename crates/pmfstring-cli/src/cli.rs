use crate::utils::parser;
use clap::{Args, Parser, Subcommand};
use pmfstring::core::energy::spring::Spring;
use pmfstring::core::surface::interpolation::InterpolationMethod;
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Anthony J. Pane",
    version,
    about = "pmfstring - Refine minimum-energy paths on two-dimensional potential-of-mean-force surfaces with a grid-search string method.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Relax an initial path on a PMF surface and write the resulting profile.
    Relax(RelaxArgs),
    /// Evaluate an initial path without moving it and print its per-node energies.
    Inspect(InspectArgs),
}

/// Inputs shared by every command that builds a path on a surface.
#[derive(Args, Debug)]
pub struct InputArgs {
    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the PMF sample table (CSV with columns x,y,energy,probability).
    #[arg(long, value_name = "PATH")]
    pub samples: Option<PathBuf>,

    /// Override the initial path with a CSV file of node positions (columns x,y).
    #[arg(short = 'p', long = "path", value_name = "PATH")]
    pub path_file: Option<PathBuf>,

    /// Override the interpolation method used between grid samples.
    /// One of: nearest, linear, slinear, cubic, quintic, pchip.
    #[arg(short = 'm', long, value_name = "METHOD")]
    pub interpolation: Option<InterpolationMethod>,

    /// Read surface energies from the nearest grid sample only,
    /// ignoring any interpolation method from the config file.
    #[arg(long, conflicts_with = "interpolation")]
    pub no_interpolation: bool,

    /// Add a spring between adjacent nodes. Replaces the springs of the config file.
    /// Can be used multiple times. Example: --spring x:10.0:0.0 or --spring y:5:0.1:2
    #[arg(long = "spring", value_name = "AXIS:K:EQ[:EXP]", value_parser = parser::parse_spring)]
    pub springs: Vec<Spring>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S optimization.steps=200
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `relax` subcommand.
#[derive(Args, Debug)]
pub struct RelaxArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    // --- Outputs ---
    /// Path for the relaxed per-node profile (CSV).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Also write the per-node profile of the initial path (CSV).
    #[arg(long, value_name = "PATH")]
    pub initial_output: Option<PathBuf>,

    /// Also write the arc-length normalized profile (CSV).
    #[arg(long, value_name = "PATH")]
    pub normalized_output: Option<PathBuf>,

    /// Also write the resampled waypoints (CSV). Requires a waypoint count.
    #[arg(long, value_name = "PATH")]
    pub waypoints_output: Option<PathBuf>,

    // --- Optimization Overrides ---
    /// Override the number of relaxation iterations.
    #[arg(short = 'n', long, value_name = "INT")]
    pub steps: Option<usize>,

    /// Override the search step along x.
    #[arg(long, value_name = "FLOAT")]
    pub dx: Option<f64>,

    /// Override the search step along y.
    #[arg(long, value_name = "FLOAT")]
    pub dy: Option<f64>,

    // --- Profile Overrides ---
    /// Measure the normalized profile from the last node instead of the first.
    #[arg(long)]
    pub flip: bool,

    /// Override the number of waypoints to resample the relaxed path to.
    #[arg(short = 'w', long, value_name = "INT")]
    pub waypoints: Option<usize>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    #[command(flatten)]
    pub inputs: InputArgs,

    /// Also write the per-node profile of the path (CSV).
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,
}
