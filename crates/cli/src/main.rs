mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BuildArgs, SelectionArgs};
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "crossforge")]
#[command(about = "Cross-target build orchestration for Go programs")]
#[command(version)]
struct Cli {
  /// Increase log verbosity (-v info, -vv debug, -vvv trace)
  #[arg(short, long, global = true, action = clap::ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build a Go package for every resolved platform
  Build(BuildArgs),

  /// Show which platforms a specification resolves to
  Resolve {
    #[command(flatten)]
    selection: SelectionArgs,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// List platform groups, or the platforms of one group
  Groups {
    /// Group to show
    name: Option<String>,

    /// JSON group file layered over the built-in groups
    #[arg(long)]
    groups_file: Option<PathBuf>,

    /// Write the effective groups to a JSON file
    #[arg(long)]
    save: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// List the platforms the Go toolchain supports
  List {
    /// Only show platforms for this operating system
    #[arg(long)]
    os: Option<String>,

    /// Use the built-in platform list instead of asking `go`
    #[arg(long)]
    offline: bool,

    /// Path to the go executable
    #[arg(long, default_value = "go")]
    go: String,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Show detected native toolchains and derived build environments
  Env {
    /// Derive the environment for this os/arch
    #[arg(short, long)]
    platform: Option<String>,

    /// Android NDK root, overriding discovery
    #[arg(long)]
    ndk_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    cgo: cmd::CgoArg,

    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },
}

fn init_tracing(verbose: u8) {
  let level = match verbose {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .with_target(false)
    .init();
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  match cli.command {
    Commands::Build(args) => cmd::cmd_build(args),
    Commands::Resolve { selection, format } => cmd::cmd_resolve(&selection, format),
    Commands::Groups {
      name,
      groups_file,
      save,
      format,
    } => cmd::cmd_groups(name.as_deref(), groups_file.as_deref(), save.as_deref(), format),
    Commands::List { os, offline, go, format } => cmd::cmd_list(os.as_deref(), offline, &go, format),
    Commands::Env {
      platform,
      ndk_path,
      cgo,
      format,
    } => cmd::cmd_env(platform.as_deref(), ndk_path.as_deref(), cgo, format),
  }
}
