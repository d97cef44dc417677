//! The full platform catalog.
//!
//! The live catalog comes from `go tool dist list`. When it cannot be read for
//! any reason (no `go` on the path, non-zero exit, empty or garbled output) or
//! when offline mode is requested, the static list below is used instead and
//! a [`Degradation::StaticCatalog`] is recorded. There is exactly one fallback
//! path; callers never decide for themselves when to degrade.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::error::Degradation;
use crate::platform::{Platform, PlatformSet};
use crate::toolchain::HostSystem;

/// `go tool dist list` as of Go 1.23.
pub const STATIC_CATALOG: &[&str] = &[
  "aix/ppc64",
  "android/386",
  "android/amd64",
  "android/arm",
  "android/arm64",
  "darwin/amd64",
  "darwin/arm64",
  "dragonfly/amd64",
  "freebsd/386",
  "freebsd/amd64",
  "freebsd/arm",
  "freebsd/arm64",
  "freebsd/riscv64",
  "illumos/amd64",
  "ios/amd64",
  "ios/arm64",
  "js/wasm",
  "linux/386",
  "linux/amd64",
  "linux/arm",
  "linux/arm64",
  "linux/loong64",
  "linux/mips",
  "linux/mips64",
  "linux/mips64le",
  "linux/mipsle",
  "linux/ppc64",
  "linux/ppc64le",
  "linux/riscv64",
  "linux/s390x",
  "netbsd/386",
  "netbsd/amd64",
  "netbsd/arm",
  "netbsd/arm64",
  "openbsd/386",
  "openbsd/amd64",
  "openbsd/arm",
  "openbsd/arm64",
  "openbsd/ppc64",
  "openbsd/riscv64",
  "plan9/386",
  "plan9/amd64",
  "plan9/arm",
  "solaris/amd64",
  "wasip1/wasm",
  "windows/386",
  "windows/amd64",
  "windows/arm",
  "windows/arm64",
];

/// Why the live catalog could not be used.
#[derive(Debug, Error)]
pub enum CatalogError {
  #[error("'{0}' not found on PATH")]
  ToolMissing(String),

  #[error("failed to run {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  #[error("{program} exited unsuccessfully: {stderr}")]
  Failed { program: String, stderr: String },

  #[error("catalog output contained no platforms")]
  Empty,

  #[error("offline mode requested")]
  Offline,
}

/// A source of the complete platform list.
pub trait PlatformCatalog: Send + Sync {
  fn platforms(&self) -> Result<Vec<Platform>, CatalogError>;
}

/// Live catalog read from the Go toolchain.
pub struct GoDistCatalog<'a> {
  system: &'a dyn HostSystem,
  go: String,
}

impl<'a> GoDistCatalog<'a> {
  pub fn new(system: &'a dyn HostSystem) -> Self {
    Self {
      system,
      go: "go".to_string(),
    }
  }

  /// Use a specific `go` executable name or path.
  pub fn with_go(mut self, go: impl Into<String>) -> Self {
    self.go = go.into();
    self
  }
}

impl PlatformCatalog for GoDistCatalog<'_> {
  fn platforms(&self) -> Result<Vec<Platform>, CatalogError> {
    let program: PathBuf = self
      .system
      .which(&self.go)
      .ok_or_else(|| CatalogError::ToolMissing(self.go.clone()))?;

    let output = self
      .system
      .run(&program, &["tool", "dist", "list"])
      .map_err(|source| CatalogError::Spawn {
        program: program.display().to_string(),
        source,
      })?;

    if !output.success {
      return Err(CatalogError::Failed {
        program: program.display().to_string(),
        stderr: output.stderr.trim().to_string(),
      });
    }

    let platforms = parse_dist_list(&output.stdout);
    if platforms.is_empty() {
      return Err(CatalogError::Empty);
    }
    Ok(platforms)
  }
}

/// Parse `go tool dist list` output, ignoring blank and malformed lines.
pub fn parse_dist_list(output: &str) -> Vec<Platform> {
  output
    .lines()
    .map(str::trim)
    .filter(|line| !line.is_empty())
    .filter_map(|line| Platform::parse(line).ok())
    .collect()
}

pub fn static_platforms() -> Vec<Platform> {
  STATIC_CATALOG.iter().filter_map(|id| Platform::parse(id).ok()).collect()
}

/// The catalog as loaded for one resolution, plus whether it is degraded.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
  pub platforms: PlatformSet,
  pub degradation: Option<Degradation>,
}

impl CatalogSnapshot {
  /// Load the catalog, falling back to the static list on any failure.
  pub fn load(catalog: &dyn PlatformCatalog, offline: bool) -> Self {
    let live = if offline {
      Err(CatalogError::Offline)
    } else {
      catalog.platforms()
    };

    match live {
      Ok(platforms) => {
        debug!(count = platforms.len(), "loaded live platform catalog");
        Self {
          platforms: platforms.into_iter().collect(),
          degradation: None,
        }
      }
      Err(e) => {
        let degradation = Degradation::StaticCatalog { reason: e.to_string() };
        warn!(reason = %e, "platform catalog unavailable, using static list");
        Self {
          platforms: static_platforms().into_iter().collect(),
          degradation: Some(degradation),
        }
      }
    }
  }

  /// Every architecture the catalog lists for `os`.
  pub fn archs_for_os(&self, os: &str) -> Vec<String> {
    let mut archs: Vec<String> = self
      .platforms
      .iter()
      .filter(|p| p.os == os)
      .map(|p| p.arch.clone())
      .collect();
    archs.sort();
    archs
  }
}
