//! Session configuration.
//!
//! A [`SessionConfig`] can be read from a TOML file; the CLI overlays its
//! flags on top. Every field has a default, so an empty file is valid.
//!
//! ```toml
//! platforms = "desktop,android/arm64"
//! exclude = ["mobile"]
//! jobs = 4
//! layout = "flat"
//! cgo = "auto"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::dispatch::{DispatchConfig, num_cpus};
use crate::env::CgoMode;
use crate::resolve::ResolveRequest;
use crate::target::OutputLayout;

/// Environment variable consulted when `jobs` is 0.
pub const JOBS_ENV: &str = "CROSSFORGE_JOBS";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid config {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("{var} must be a positive integer, got '{value}'")]
  InvalidEnv { var: &'static str, value: String },
}

/// Everything one build session needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SessionConfig {
  /// Comma-separated platform specification.
  pub platforms: String,
  pub include: Vec<String>,
  pub exclude: Vec<String>,
  pub only: Vec<String>,
  pub except: Vec<String>,
  pub custom_group: Option<String>,
  pub all_archs: bool,
  /// Use the static platform catalog only.
  pub offline: bool,
  /// JSON group file layered over the built-in groups.
  pub groups_file: Option<PathBuf>,

  /// Concurrent builds; 0 means `CROSSFORGE_JOBS` or the logical core count.
  pub jobs: usize,
  pub retry: bool,
  pub max_retries: u32,
  pub retry_backoff_ms: u64,
  /// Per-invocation compiler time limit.
  pub timeout_secs: Option<u64>,
  pub verbose: bool,

  /// Package passed to `go build`.
  pub source: PathBuf,
  pub output_dir: PathBuf,
  /// Defaults to the source's file stem or directory name.
  pub binary_name: Option<String>,
  pub layout: OutputLayout,
  /// Remove the output directory before building.
  pub clean: bool,

  pub ndk_path: Option<PathBuf>,
  pub cgo: CgoMode,
  /// Fail instead of skipping when a native toolchain is missing.
  pub strict: bool,
  /// Build iOS targets on non-darwin hosts.
  pub force: bool,
  /// Skip every platform that needs native interop.
  pub skip_native: bool,
  pub ldflags: Option<String>,
  pub tags: Option<String>,
  /// Path to the `go` executable.
  pub go: PathBuf,
}

impl Default for SessionConfig {
  fn default() -> Self {
    Self {
      platforms: "default".to_string(),
      include: Vec::new(),
      exclude: Vec::new(),
      only: Vec::new(),
      except: Vec::new(),
      custom_group: None,
      all_archs: false,
      offline: false,
      groups_file: None,
      jobs: 0,
      retry: true,
      max_retries: 3,
      retry_backoff_ms: 1000,
      timeout_secs: None,
      verbose: false,
      source: PathBuf::from("."),
      output_dir: PathBuf::from("build"),
      binary_name: None,
      layout: OutputLayout::default(),
      clean: false,
      ndk_path: None,
      cgo: CgoMode::default(),
      strict: false,
      force: false,
      skip_native: false,
      ldflags: None,
      tags: None,
      go: PathBuf::from("go"),
    }
  }
}

impl SessionConfig {
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    debug!(path = %path.display(), "loaded session config");
    Ok(config)
  }

  pub fn resolve_request(&self) -> ResolveRequest {
    ResolveRequest {
      spec: self.platforms.clone(),
      include: self.include.clone(),
      exclude: self.exclude.clone(),
      only: self.only.clone(),
      except: self.except.clone(),
      custom_group: self.custom_group.clone(),
      all_archs: self.all_archs,
      offline: self.offline,
    }
  }

  /// Job count after applying `CROSSFORGE_JOBS` and the core-count default.
  pub fn effective_jobs(&self) -> Result<usize, ConfigError> {
    if self.jobs > 0 {
      return Ok(self.jobs);
    }
    match std::env::var(JOBS_ENV) {
      Ok(value) if !value.trim().is_empty() => match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidEnv { var: JOBS_ENV, value }),
      },
      _ => Ok(num_cpus()),
    }
  }

  pub fn dispatch_config(&self) -> Result<DispatchConfig, ConfigError> {
    Ok(DispatchConfig {
      jobs: self.effective_jobs()?,
      retry: self.retry,
      max_retries: self.max_retries,
      retry_backoff: Duration::from_millis(self.retry_backoff_ms),
      verbose: self.verbose,
    })
  }

  pub fn timeout(&self) -> Option<Duration> {
    self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
  }

  /// Output file name without platform suffixes.
  pub fn binary_name(&self) -> String {
    if let Some(name) = self.binary_name.as_deref().filter(|n| !n.trim().is_empty()) {
      return name.to_string();
    }
    let source = if self.source.file_name().is_some() {
      Some(self.source.clone())
    } else {
      std::env::current_dir().ok().map(|cwd| cwd.join(&self.source))
    };
    source
      .as_deref()
      .and_then(|s| s.canonicalize().ok().or_else(|| Some(s.to_path_buf())))
      .and_then(|s| s.file_stem().and_then(|n| n.to_str()).map(str::to_string))
      .filter(|n| !n.is_empty() && n != "." && n != "..")
      .unwrap_or_else(|| "app".to_string())
  }
}
