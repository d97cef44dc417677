//! Build target materialization.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::platform::Platform;

/// How output files are arranged under the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLayout {
  /// `<out>/<os>/<arch>/<bin>`
  #[default]
  PerPlatform,
  /// `<out>/<bin>-<os>-<arch>`
  Flat,
}

impl fmt::Display for OutputLayout {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::PerPlatform => write!(f, "per-platform"),
      Self::Flat => write!(f, "flat"),
    }
  }
}

/// One platform's build: where the compiled artifact goes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct BuildTarget {
  pub platform: Platform,
  pub output_name: String,
  pub output_path: PathBuf,
}

impl BuildTarget {
  pub fn id(&self) -> String {
    self.platform.id()
  }

  /// Directory that must exist before the compiler runs.
  pub fn output_dir(&self) -> Option<&Path> {
    self.output_path.parent()
  }
}

fn extension(platform: &Platform) -> &'static str {
  if platform.is_windows() {
    ".exe"
  } else if platform.arch == "wasm" {
    ".wasm"
  } else {
    ""
  }
}

/// Compute the target for `platform`. Pure; touches no filesystem.
pub fn materialize(binary_name: &str, output_dir: &Path, layout: OutputLayout, platform: &Platform) -> BuildTarget {
  let ext = extension(platform);
  let (output_name, output_path) = match layout {
    OutputLayout::PerPlatform => {
      let name = format!("{}{}", binary_name, ext);
      let path = output_dir.join(&platform.os).join(&platform.arch).join(&name);
      (name, path)
    }
    OutputLayout::Flat => {
      let name = format!("{}-{}-{}{}", binary_name, platform.os, platform.arch, ext);
      let path = output_dir.join(&name);
      (name, path)
    }
  };

  BuildTarget {
    platform: platform.clone(),
    output_name,
    output_path,
  }
}
