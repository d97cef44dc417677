//! C compiler discovery.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, trace};

use super::HostSystem;

/// Executables probed, in preference order.
pub const COMPILER_CANDIDATES: &[&str] = &["clang", "gcc", "cc"];

/// Compiler family, inferred from `--version` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerKind {
  Clang,
  Gcc,
  Generic,
}

impl fmt::Display for CompilerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      Self::Clang => "clang",
      Self::Gcc => "gcc",
      Self::Generic => "generic",
    };
    write!(f, "{}", s)
  }
}

/// Snapshot of one probed compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainInfo {
  pub name: String,
  pub available: bool,
  pub path: Option<PathBuf>,
  pub version: String,
  pub kind: CompilerKind,
}

impl ToolchainInfo {
  fn missing(name: &str) -> Self {
    Self {
      name: name.to_string(),
      available: false,
      path: None,
      version: String::new(),
      kind: kind_from_name(name),
    }
  }
}

/// Probe every candidate compiler.
///
/// Unavailable candidates are kept in the map with `available: false`. A
/// compiler whose version cannot be read is still available, with version
/// `"unknown"`.
pub fn probe_compilers(system: &dyn HostSystem) -> BTreeMap<String, ToolchainInfo> {
  COMPILER_CANDIDATES
    .iter()
    .map(|name| (name.to_string(), probe_one(system, name)))
    .collect()
}

fn probe_one(system: &dyn HostSystem, name: &str) -> ToolchainInfo {
  let Some(path) = system.which(name) else {
    trace!(compiler = name, "not found on PATH");
    return ToolchainInfo::missing(name);
  };

  let banner = match system.run(&path, &["--version"]) {
    Ok(out) if out.success => out.stdout,
    Ok(out) => {
      debug!(compiler = name, stderr = %out.stderr.trim(), "--version exited unsuccessfully");
      String::new()
    }
    Err(e) => {
      debug!(compiler = name, error = %e, "failed to run --version");
      String::new()
    }
  };

  let kind = classify(name, &banner);
  let version = parse_version(&banner);
  debug!(compiler = name, path = %path.display(), %version, %kind, "found compiler");

  ToolchainInfo {
    name: name.to_string(),
    available: true,
    path: Some(path),
    version,
    kind,
  }
}

fn kind_from_name(name: &str) -> CompilerKind {
  match name {
    "clang" => CompilerKind::Clang,
    "gcc" => CompilerKind::Gcc,
    _ => CompilerKind::Generic,
  }
}

fn classify(name: &str, banner: &str) -> CompilerKind {
  let lower = banner.to_lowercase();
  if lower.contains("clang") {
    CompilerKind::Clang
  } else if lower.contains("gcc") || lower.contains("free software foundation") {
    CompilerKind::Gcc
  } else {
    kind_from_name(name)
  }
}

/// Extract a version from a `--version` banner.
///
/// Handles `clang version X` (including Apple's banner) and GCC's
/// `gcc (distro info) X` first line. Anything else yields `"unknown"`.
pub fn parse_version(banner: &str) -> String {
  let Some(first) = banner.lines().map(str::trim).find(|l| !l.is_empty()) else {
    return "unknown".to_string();
  };

  let tokens: Vec<&str> = first.split_whitespace().collect();
  let after_version = tokens
    .iter()
    .position(|t| *t == "version")
    .and_then(|pos| tokens.get(pos + 1))
    .filter(|v| looks_like_version(v));
  if let Some(v) = after_version {
    return v.to_string();
  }

  match tokens.last() {
    Some(last) if looks_like_version(last) => last.to_string(),
    _ => "unknown".to_string(),
  }
}

fn looks_like_version(token: &str) -> bool {
  token.chars().next().is_some_and(|c| c.is_ascii_digit()) && token.contains('.')
}

/// Numeric comparison key for a version string; unparsable parts count as 0.
pub(crate) fn version_key(version: &str) -> Vec<u64> {
  version
    .split(['.', '-', '_'])
    .map(|part| {
      part
        .chars()
        .take_while(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
    })
    .collect()
}
