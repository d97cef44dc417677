//! Named, reusable platform collections.
//!
//! A [`GroupRegistry`] is built once (from the built-in table or a JSON file)
//! and then only read. It is passed by reference to the resolver; there is no
//! process-wide registry.

mod builtin;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::platform::{Platform, PlatformSet};

/// Broad classification used when listing groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupCategory {
  #[default]
  General,
  Desktop,
  Server,
  Mobile,
  Web,
  Embedded,
  OsFamily,
  Custom,
}

impl GroupCategory {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::General => "general",
      Self::Desktop => "desktop",
      Self::Server => "server",
      Self::Mobile => "mobile",
      Self::Web => "web",
      Self::Embedded => "embedded",
      Self::OsFamily => "os-family",
      Self::Custom => "custom",
    }
  }
}

impl fmt::Display for GroupCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A named platform collection with descriptive metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformGroup {
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub category: GroupCategory,
  #[serde(default)]
  pub tags: Vec<String>,
  pub platforms: PlatformSet,
}

impl PlatformGroup {
  /// Create a custom group from a list of platforms.
  pub fn custom(name: impl Into<String>, platforms: impl IntoIterator<Item = Platform>) -> Self {
    Self {
      name: name.into(),
      description: String::new(),
      category: GroupCategory::Custom,
      tags: Vec::new(),
      platforms: platforms.into_iter().collect(),
    }
  }

  /// Render the platforms as a comma-separated specification string.
  ///
  /// Feeding the result back through the resolver reproduces the same set.
  pub fn to_spec(&self) -> String {
    self
      .platforms
      .sorted()
      .iter()
      .map(Platform::id)
      .collect::<Vec<_>>()
      .join(",")
  }
}

/// Errors loading or saving a group file.
#[derive(Debug, Error)]
pub enum GroupFileError {
  #[error("failed to read group file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to write group file {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("invalid group file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to serialize groups for {path}: {source}")]
  Serialize {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  #[error("duplicate group name '{0}'")]
  DuplicateName(String),

  #[error("group name must not be empty")]
  EmptyName,
}

#[derive(Serialize, Deserialize)]
struct GroupFile {
  groups: Vec<PlatformGroup>,
}

/// Read-only registry of platform groups keyed by case-sensitive name.
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
  groups: BTreeMap<String, PlatformGroup>,
}

impl GroupRegistry {
  /// Registry holding the built-in groups (`default`, `desktop`, `server`, ...).
  pub fn builtin() -> Self {
    let mut groups = BTreeMap::new();
    for group in builtin::groups() {
      groups.insert(group.name.clone(), group);
    }
    Self { groups }
  }

  /// Build a registry from explicit groups, rejecting empty or duplicate names.
  pub fn from_groups(groups: impl IntoIterator<Item = PlatformGroup>) -> Result<Self, GroupFileError> {
    let mut map = BTreeMap::new();
    for group in groups {
      if group.name.trim().is_empty() {
        return Err(GroupFileError::EmptyName);
      }
      if map.contains_key(&group.name) {
        return Err(GroupFileError::DuplicateName(group.name));
      }
      map.insert(group.name.clone(), group);
    }
    Ok(Self { groups: map })
  }

  /// Return a new registry with `other`'s groups layered on top of this one.
  ///
  /// Groups in `other` replace same-named groups here.
  pub fn with_overrides(&self, other: GroupRegistry) -> Self {
    let mut groups = self.groups.clone();
    groups.extend(other.groups);
    Self { groups }
  }

  /// Load groups from a JSON file of the form `{ "groups": [ ... ] }`.
  pub fn load(path: &Path) -> Result<Self, GroupFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| GroupFileError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let file: GroupFile = serde_json::from_str(&content).map_err(|source| GroupFileError::Parse {
      path: path.to_path_buf(),
      source,
    })?;

    debug!(path = %path.display(), groups = file.groups.len(), "loaded group file");
    Self::from_groups(file.groups)
  }

  /// Write every group to a JSON file readable by [`GroupRegistry::load`].
  pub fn save(&self, path: &Path) -> Result<(), GroupFileError> {
    let file = GroupFile {
      groups: self.groups.values().cloned().collect(),
    };
    let json = serde_json::to_string_pretty(&file).map_err(|source| GroupFileError::Serialize {
      path: path.to_path_buf(),
      source,
    })?;
    std::fs::write(path, json).map_err(|source| GroupFileError::Write {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn get(&self, name: &str) -> Option<&PlatformGroup> {
    self.groups.get(name)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.groups.contains_key(name)
  }

  /// Iterate groups ordered by name.
  pub fn iter(&self) -> impl Iterator<Item = &PlatformGroup> {
    self.groups.values()
  }

  pub fn len(&self) -> usize {
    self.groups.len()
  }

  pub fn is_empty(&self) -> bool {
    self.groups.is_empty()
  }
}
