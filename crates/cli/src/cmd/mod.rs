mod build;
mod env;
mod groups;
mod list;
mod resolve;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crossforge_lib::config::SessionConfig;
use crossforge_lib::env::CgoMode;
use crossforge_lib::groups::GroupRegistry;
use crossforge_lib::target::OutputLayout;

pub use build::{BuildArgs, cmd_build};
pub use env::cmd_env;
pub use groups::cmd_groups;
pub use list::cmd_list;
pub use resolve::cmd_resolve;

/// Flags that decide which platforms a session covers.
#[derive(Debug, Clone, Default, Args)]
pub struct SelectionArgs {
  /// Platform specification: groups, os/arch pairs or OS names, comma-separated
  #[arg(short, long)]
  pub platforms: Option<String>,

  /// Groups to add
  #[arg(long, value_delimiter = ',')]
  pub include: Vec<String>,

  /// Groups to remove
  #[arg(long, value_delimiter = ',')]
  pub exclude: Vec<String>,

  /// Build only these groups
  #[arg(long, value_delimiter = ',')]
  pub only: Vec<String>,

  /// Remove these groups (cannot be combined with --only)
  #[arg(long, value_delimiter = ',')]
  pub except: Vec<String>,

  /// Inline group, e.g. "edge:linux/arm64,linux/arm"
  #[arg(long = "group")]
  pub custom_group: Option<String>,

  /// Expand bare OS names to every architecture instead of the host's
  #[arg(long)]
  pub all_archs: bool,

  /// Use the built-in platform list instead of asking `go`
  #[arg(long)]
  pub offline: bool,

  /// JSON group file layered over the built-in groups
  #[arg(long)]
  pub groups_file: Option<PathBuf>,

  /// Path to the go executable
  #[arg(long)]
  pub go: Option<PathBuf>,
}

impl SelectionArgs {
  /// Overlay the flags that were given onto `config`.
  pub fn apply(&self, config: &mut SessionConfig) {
    if let Some(platforms) = &self.platforms {
      config.platforms = platforms.clone();
    }
    config.include.extend(self.include.iter().cloned());
    config.exclude.extend(self.exclude.iter().cloned());
    config.only.extend(self.only.iter().cloned());
    config.except.extend(self.except.iter().cloned());
    if self.custom_group.is_some() {
      config.custom_group = self.custom_group.clone();
    }
    config.all_archs |= self.all_archs;
    config.offline |= self.offline;
    if self.groups_file.is_some() {
      config.groups_file = self.groups_file.clone();
    }
    if let Some(go) = &self.go {
      config.go = go.clone();
    }
  }
}

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum CgoArg {
  /// Enable cgo only where the target needs it
  #[default]
  Auto,
  On,
  Off,
}

impl From<CgoArg> for CgoMode {
  fn from(arg: CgoArg) -> Self {
    match arg {
      CgoArg::Auto => CgoMode::Auto,
      CgoArg::On => CgoMode::On,
      CgoArg::Off => CgoMode::Off,
    }
  }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
  /// <out>/<os>/<arch>/<name>
  PerPlatform,
  /// <out>/<name>-<os>-<arch>
  Flat,
}

impl From<LayoutArg> for OutputLayout {
  fn from(arg: LayoutArg) -> Self {
    match arg {
      LayoutArg::PerPlatform => OutputLayout::PerPlatform,
      LayoutArg::Flat => OutputLayout::Flat,
    }
  }
}

/// Built-in groups, overridden by the groups in `groups_file` if given.
pub(crate) fn load_registry(groups_file: Option<&Path>) -> Result<GroupRegistry> {
  let builtin = GroupRegistry::builtin();
  match groups_file {
    Some(path) => {
      let user = GroupRegistry::load(path).with_context(|| format!("Failed to load groups: {}", path.display()))?;
      Ok(builtin.with_overrides(user))
    }
    None => Ok(builtin),
  }
}
