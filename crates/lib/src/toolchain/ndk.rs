//! Android NDK discovery.
//!
//! Resolution order: explicit path, then `ANDROID_NDK_HOME`,
//! `ANDROID_NDK_ROOT` and `NDK_ROOT`, then the conventional SDK install
//! locations for the host OS.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::HostSystem;
use super::compilers::version_key;
use crate::error::Degradation;

/// Environment variables consulted, in order.
pub const NDK_ENV_VARS: &[&str] = &["ANDROID_NDK_HOME", "ANDROID_NDK_ROOT", "NDK_ROOT"];

/// Host type an NDK's prebuilt tools were built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NdkHost {
  Windows,
  Linux,
  Darwin,
}

impl NdkHost {
  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Windows => "windows",
      Self::Linux => "linux",
      Self::Darwin => "darwin",
    }
  }

  fn from_dir_name(name: &str) -> Option<Self> {
    let name = name.to_lowercase();
    if name.contains("windows") {
      Some(Self::Windows)
    } else if name.contains("linux") {
      Some(Self::Linux)
    } else if name.contains("darwin") || name.contains("mac") {
      Some(Self::Darwin)
    } else {
      None
    }
  }
}

impl fmt::Display for NdkHost {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// Where an NDK root came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "kebab-case")]
pub enum NdkSource {
  Explicit,
  EnvVar(String),
  Filesystem,
}

impl fmt::Display for NdkSource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Explicit => write!(f, "explicit path"),
      Self::EnvVar(name) => write!(f, "${}", name),
      Self::Filesystem => write!(f, "filesystem search"),
    }
  }
}

/// A resolved NDK.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NdkInstallation {
  pub root: PathBuf,
  pub host: NdkHost,
  /// `toolchains/llvm/prebuilt/<host-tag>` directory.
  pub prebuilt: PathBuf,
  pub source: NdkSource,
}

impl NdkInstallation {
  pub fn bin_dir(&self) -> PathBuf {
    self.prebuilt.join("bin")
  }

  pub fn sysroot(&self) -> PathBuf {
    self.prebuilt.join("sysroot")
  }
}

/// Locate and classify an NDK.
///
/// Never fails: rejected locations and an unclassifiable root are returned
/// as degradations alongside `None`.
pub fn probe_ndk(system: &dyn HostSystem, explicit: Option<&Path>) -> (Option<NdkInstallation>, Vec<Degradation>) {
  let mut degradations = Vec::new();

  let Some((root, source)) = locate_root(system, explicit, &mut degradations) else {
    debug!("no Android NDK found");
    return (None, degradations);
  };

  let prebuilt_parent = root.join("toolchains").join("llvm").join("prebuilt");
  let mut tags = system.list_dirs(&prebuilt_parent);
  tags.sort();

  let classified = tags
    .iter()
    .find_map(|tag| NdkHost::from_dir_name(tag).map(|host| (host, prebuilt_parent.join(tag))))
    .or_else(|| {
      let mut names = system.list_dirs(&root);
      names.sort();
      names
        .iter()
        .find_map(|name| NdkHost::from_dir_name(name))
        .map(|host| (host, prebuilt_parent.join(format!("{}-x86_64", host))))
    });

  match classified {
    Some((host, prebuilt)) => {
      info!(root = %root.display(), %host, %source, "using Android NDK");
      let ndk = NdkInstallation {
        root,
        host,
        prebuilt,
        source,
      };
      (Some(ndk), degradations)
    }
    None => {
      let degradation = Degradation::NdkUnclassified { root };
      warn!("{}", degradation);
      degradations.push(degradation);
      (None, degradations)
    }
  }
}

fn locate_root(
  system: &dyn HostSystem,
  explicit: Option<&Path>,
  degradations: &mut Vec<Degradation>,
) -> Option<(PathBuf, NdkSource)> {
  if let Some(path) = explicit {
    if system.is_dir(path) {
      return Some((path.to_path_buf(), NdkSource::Explicit));
    }
    reject(degradations, NdkSource::Explicit, path);
  }

  for var in NDK_ENV_VARS {
    let Some(value) = system.env_var(var) else {
      continue;
    };
    let path = PathBuf::from(value);
    if system.is_dir(&path) && system.is_dir(&path.join("toolchains")) {
      return Some((path, NdkSource::EnvVar(var.to_string())));
    }
    reject(degradations, NdkSource::EnvVar(var.to_string()), &path);
  }

  search_install_locations(system).map(|path| (path, NdkSource::Filesystem))
}

fn reject(degradations: &mut Vec<Degradation>, source: NdkSource, path: &Path) {
  let degradation = Degradation::NdkPathRejected {
    origin: source.to_string(),
    path: path.to_path_buf(),
  };
  warn!("{}", degradation);
  degradations.push(degradation);
}

/// `<sdk>/ndk` directories conventionally used on the host OS.
pub fn search_locations(system: &dyn HostSystem) -> Vec<PathBuf> {
  let host_os = system.host_platform().map(|p| p.os).unwrap_or_default();
  let home = system.home_dir();
  let mut bases = Vec::new();

  if let Some(home) = &home {
    match host_os.as_str() {
      "windows" => bases.push(home.join("AppData").join("Local").join("Android").join("Sdk")),
      "darwin" => {
        bases.push(home.join("Library").join("Android").join("sdk"));
        bases.push(home.join("Android").join("Sdk"));
      }
      _ => bases.push(home.join("Android").join("Sdk")),
    }
  }

  match host_os.as_str() {
    "windows" => bases.push(PathBuf::from(r"C:\Android\Sdk")),
    "darwin" => bases.push(PathBuf::from("/opt/android-sdk")),
    _ => {
      bases.push(PathBuf::from("/opt/android-sdk"));
      bases.push(PathBuf::from("/usr/local/android-sdk"));
    }
  }

  for var in ["ANDROID_HOME", "ANDROID_SDK_ROOT"] {
    if let Some(sdk) = system.env_var(var) {
      bases.push(PathBuf::from(sdk));
    }
  }

  let mut locations: Vec<PathBuf> = Vec::new();
  for base in bases {
    let ndk = base.join("ndk");
    if !locations.contains(&ndk) {
      locations.push(ndk);
    }
  }
  locations
}

fn search_install_locations(system: &dyn HostSystem) -> Option<PathBuf> {
  let mut found: Vec<(String, PathBuf)> = Vec::new();

  for base in search_locations(system) {
    if !system.is_dir(&base) {
      continue;
    }
    for version in system.list_dirs(&base) {
      let candidate = base.join(&version);
      if is_valid_ndk_dir(system, &candidate) {
        debug!(path = %candidate.display(), "found NDK candidate");
        found.push((version, candidate));
      }
    }
  }

  found
    .into_iter()
    .max_by(|(a, pa), (b, pb)| version_key(a).cmp(&version_key(b)).then_with(|| pa.cmp(pb)))
    .map(|(_, path)| path)
}

fn is_valid_ndk_dir(system: &dyn HostSystem, path: &Path) -> bool {
  system.is_file(&path.join("source.properties")) && system.is_dir(&path.join("toolchains"))
}
