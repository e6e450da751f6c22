//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Regenerate protobuf bindings for every package in a proto monorepo and
/// push them to their target repositories.
///
/// Git credentials must already be configured in the environment
/// (for example through a credential helper).
#[derive(Parser)]
#[command(name = "protodeploy")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Monorepo root (defaults to the current directory)
    #[arg(long, env = "PROTODEPLOY_ROOT")]
    pub root: Option<PathBuf>,

    /// Configuration file (defaults to protodeploy.toml in the root, if present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of targets deployed concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
