//! Error taxonomy shared across resolution, probing and dispatch.
//!
//! - [`ResolveError`] is fatal and aborts a session before any build starts.
//! - [`Degradation`] is a non-fatal probe finding; it narrows the usable
//!   platform set or the derived environment and is reported, never raised.
//!
//! Per-target build failures and skips live in [`crate::dispatch::Outcome`].

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::platform::{Platform, PlatformParseError};

/// Which selection list a group name came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionList {
  Only,
  Include,
  Exclude,
  Except,
}

impl std::fmt::Display for SelectionList {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let name = match self {
      Self::Only => "only",
      Self::Include => "include",
      Self::Exclude => "exclude",
      Self::Except => "except",
    };
    write!(f, "{}", name)
  }
}

/// Fatal errors raised while turning a specification into build targets.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// `only` and `except` were both supplied.
  #[error("'only' and 'except' cannot be combined")]
  ConflictingSelection,

  /// A group list named a group the registry does not know.
  #[error("unknown platform group '{name}' in {list} list")]
  UnknownGroup { name: String, list: SelectionList },

  /// A token in the base specification was not a valid `os/arch` pair.
  #[error(transparent)]
  MalformedPlatform(#[from] PlatformParseError),

  /// The inline custom group could not be parsed.
  #[error("malformed custom group '{input}': {reason}")]
  MalformedCustomGroup { input: String, reason: String },

  /// Resolution produced an empty set.
  #[error("no valid platforms to build")]
  NoValidPlatforms,

  /// Strict mode: a platform needs a toolchain that is not installed.
  #[error("{platform} requires {tool}, which was not found")]
  ToolchainUnavailable { platform: Platform, tool: String },

  /// The cross SDK has no compiler template for this architecture.
  #[error("{platform}: no cross-compiler template for architecture '{arch}'")]
  UnsupportedSdkArch { platform: Platform, arch: String },
}

/// Non-fatal findings from toolchain probing and environment derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Degradation {
  /// A platform was dropped because its native toolchain is missing.
  #[error("{platform}: skipped, {tool} not found")]
  ToolchainMissing { platform: Platform, tool: String },

  /// Native interop was requested but no compiler is available.
  #[error("{platform}: cgo requested but {tool} not found, building with CGO_ENABLED=0")]
  InteropDisabled { platform: Platform, tool: String },

  /// A configured NDK location was ignored.
  #[error("ignoring NDK path from {origin}: {path} is not an NDK root")]
  NdkPathRejected { origin: String, path: PathBuf },

  /// An NDK root was found but its prebuilt host type could not be inferred.
  #[error("could not infer NDK host type under {root}")]
  NdkUnclassified { root: PathBuf },

  /// The live platform catalog was unavailable.
  #[error("platform catalog unavailable ({reason}), using static list; results may be incomplete")]
  StaticCatalog { reason: String },
}
