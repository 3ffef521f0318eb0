use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;
mod output;

use output::OutputFormat;

/// bootforge - compile bootable container disk images into osbuild manifests
#[derive(Parser)]
#[command(name = "bootforge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile an image request into a manifest
  Compile {
    /// Path to the image request (.yaml, .yml or .json)
    request: PathBuf,

    /// Write the manifest to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// List container sources that still need resolving
  Sources {
    /// Path to the image request (.yaml, .yml or .json)
    request: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },

  /// Show the partition layout as described to the qemu assembler
  Disk {
    /// Path to the image request (.yaml, .yml or .json)
    request: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Compile { request, output } => cmd::cmd_compile(&request, output.as_deref()),
    Commands::Sources { request, format } => cmd::cmd_sources(&request, format),
    Commands::Disk { request, format } => cmd::cmd_disk(&request, format),
  }
}
