//! Host access used by probing.
//!
//! Every filesystem lookup and child process the prober performs goes through
//! [`HostSystem`], so probes can run against a fake host in tests.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::trace;

use crate::platform::{Platform, host_platform};

/// Captured result of a short-lived probe command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
  pub success: bool,
  pub stdout: String,
  pub stderr: String,
}

/// Read-only view of the host used by toolchain and catalog probes.
pub trait HostSystem: Send + Sync {
  /// The platform this process runs on, in Go naming.
  fn host_platform(&self) -> Option<Platform>;

  fn env_var(&self, key: &str) -> Option<String>;

  /// Locate an executable on the search path.
  fn which(&self, program: &str) -> Option<PathBuf>;

  /// Run a program to completion and capture its output.
  fn run(&self, program: &Path, args: &[&str]) -> io::Result<CommandOutput>;

  fn is_dir(&self, path: &Path) -> bool;

  fn is_file(&self, path: &Path) -> bool;

  /// Names of the immediate subdirectories of `path` (empty if unreadable).
  fn list_dirs(&self, path: &Path) -> Vec<String>;

  fn home_dir(&self) -> Option<PathBuf>;
}

/// [`HostSystem`] backed by the real process environment and filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealSystem;

impl HostSystem for RealSystem {
  fn host_platform(&self) -> Option<Platform> {
    host_platform()
  }

  fn env_var(&self, key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
  }

  fn which(&self, program: &str) -> Option<PathBuf> {
    which::which(program).ok()
  }

  fn run(&self, program: &Path, args: &[&str]) -> io::Result<CommandOutput> {
    trace!(program = %program.display(), ?args, "running probe command");
    let output = Command::new(program).args(args).output()?;
    Ok(CommandOutput {
      success: output.status.success(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
  }

  fn is_dir(&self, path: &Path) -> bool {
    path.is_dir()
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn list_dirs(&self, path: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(path) else {
      return Vec::new();
    };
    entries
      .filter_map(Result::ok)
      .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
      .filter_map(|entry| entry.file_name().into_string().ok())
      .collect()
  }

  fn home_dir(&self) -> Option<PathBuf> {
    dirs::home_dir()
  }
}
