//! Platform identity and set algebra.
//!
//! A [`Platform`] is an `(os, arch)` pair using the Go toolchain's naming
//! (`linux/amd64`, `darwin/arm64`, `js/wasm`). Platforms are plain values;
//! their identity is the `"os/arch"` key.

pub mod host;
pub mod set;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub use host::{host_arch, host_os, host_platform};
pub use set::PlatformSet;

/// Error returned when a string is not a valid `os/arch` pair.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed platform '{input}': {reason}")]
pub struct PlatformParseError {
  pub input: String,
  pub reason: &'static str,
}

/// Target identifier combining operating system and architecture (e.g. "linux/amd64")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Platform {
  pub os: String,
  pub arch: String,
}

impl Platform {
  /// Create a new platform identifier
  pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
    Self {
      os: os.into(),
      arch: arch.into(),
    }
  }

  /// Parse an `os/arch` token.
  ///
  /// Surrounding whitespace is trimmed. Exactly one `/` is required and both
  /// halves must be non-empty names that cannot act as path components
  /// (`.`, `..`, backslashes).
  pub fn parse(input: &str) -> Result<Self, PlatformParseError> {
    let trimmed = input.trim();
    let err = |reason| PlatformParseError {
      input: trimmed.to_string(),
      reason,
    };

    let mut parts = trimmed.split('/');
    let (Some(os), Some(arch), None) = (parts.next(), parts.next(), parts.next()) else {
      return Err(err("expected exactly one '/'"));
    };

    let (os, arch) = (os.trim(), arch.trim());
    if os.is_empty() {
      return Err(err("missing operating system"));
    }
    if arch.is_empty() {
      return Err(err("missing architecture"));
    }
    if [os, arch].iter().any(|half| matches!(*half, "." | "..") || half.contains('\\')) {
      return Err(err("operating system and architecture must be plain names"));
    }

    Ok(Self::new(os, arch))
  }

  /// Returns the identity key (e.g. "linux/amd64")
  pub fn id(&self) -> String {
    format!("{}/{}", self.os, self.arch)
  }

  pub fn is_windows(&self) -> bool {
    self.os == "windows"
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.os, self.arch)
  }
}

impl FromStr for Platform {
  type Err = PlatformParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::parse(s)
  }
}

impl Serialize for Platform {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

impl<'de> Deserialize<'de> for Platform {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Platform::parse(&raw).map_err(serde::de::Error::custom)
  }
}
