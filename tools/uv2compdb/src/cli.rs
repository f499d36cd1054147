//! Command-line interface definitions for uv2compdb.

use std::path::PathBuf;

use clap::Parser;
use uv2compdb_core::DefineUnescape;

/// Generate compile_commands.json by parsing a Keil µVision project.
#[derive(Parser)]
#[command(name = "uv2compdb", version, about)]
pub struct Cli {
    /// Path to the .uvproj / .uvprojx file.
    pub project: PathBuf,

    /// Extra arguments appended to every command (shell-quoted string).
    #[arg(long, short = 'a', allow_hyphen_values = true)]
    pub arguments: Option<String>,

    /// Build the target when the .dep or build log is missing.
    #[arg(long, short = 'b')]
    pub build: bool,

    /// Target name (default: the first target of the project).
    #[arg(long, short = 't')]
    pub target: Option<String>,

    /// Output file or directory (default: compile_commands.json).
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Add the compiler's predefined macros.
    #[arg(long, short = 'p')]
    pub predefined: bool,

    /// Print the project's target names and exit.
    #[arg(long, short = 'l')]
    pub list_targets: bool,

    /// Configuration file (default: uv2compdb.toml next to the project).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// How escaped quotes in project defines are recovered:
    /// backslash-quote, double-backslash-quote or verbatim.
    #[arg(long)]
    pub define_unescape: Option<DefineUnescape>,

    /// Only show warnings and errors.
    #[arg(long, short = 'q', conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose output.
    #[arg(long, short = 'v')]
    pub verbose: bool,
}
