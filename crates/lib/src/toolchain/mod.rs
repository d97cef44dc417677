//! Toolchain probing.
//!
//! A [`ToolchainProbe`] is taken once per session and then shared read-only.
//! It records which C compilers exist, where the Android NDK lives, and what
//! went wrong along the way. Probing never fails a session; missing tools turn
//! into skipped platforms or a disabled native interop layer.

mod compilers;
mod ndk;
mod system;

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::warn;

pub use compilers::{COMPILER_CANDIDATES, CompilerKind, ToolchainInfo, parse_version, probe_compilers};
pub use ndk::{NDK_ENV_VARS, NdkHost, NdkInstallation, NdkSource, probe_ndk, search_locations};
pub use system::{CommandOutput, HostSystem, RealSystem};

use crate::error::{Degradation, ResolveError};
use crate::platform::Platform;

pub const ANDROID_NDK: &str = "Android NDK";
pub const CLANG: &str = "clang";
pub const C_COMPILER: &str = "C compiler";

/// Whether building for `platform` needs cgo and a native C toolchain.
pub fn requires_native_interop(platform: &Platform) -> bool {
  matches!(platform.os.as_str(), "android" | "ios")
}

/// Human-readable name of the native tool a platform needs.
pub fn required_tool(platform: &Platform) -> &'static str {
  match platform.os.as_str() {
    "android" => ANDROID_NDK,
    "ios" => CLANG,
    _ => C_COMPILER,
  }
}

/// Why a target was not built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "kebab-case")]
pub enum SkipReason {
  ToolchainUnavailable { tool: String },
  HostUnsupported { host: String },
  NativeInteropSkipped,
}

impl fmt::Display for SkipReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::ToolchainUnavailable { tool } => write!(f, "{} not found", tool),
      Self::HostUnsupported { host } => write!(f, "requires a darwin host, running on {}", host),
      Self::NativeInteropSkipped => write!(f, "native interop targets skipped"),
    }
  }
}

/// Snapshot of the host's native toolchains.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolchainProbe {
  pub host: Option<Platform>,
  pub compilers: BTreeMap<String, ToolchainInfo>,
  pub ndk: Option<NdkInstallation>,
  pub degradations: Vec<Degradation>,
}

impl ToolchainProbe {
  /// Probe compilers and the NDK through `system`.
  pub fn detect(system: &dyn HostSystem, explicit_ndk: Option<&Path>) -> Self {
    let compilers = probe_compilers(system);
    let (ndk, degradations) = probe_ndk(system, explicit_ndk);
    Self {
      host: system.host_platform(),
      compilers,
      ndk,
      degradations,
    }
  }

  fn available(&self) -> impl Iterator<Item = &ToolchainInfo> {
    // BTreeMap order is alphabetical; restore candidate preference order.
    COMPILER_CANDIDATES
      .iter()
      .filter_map(|name| self.compilers.get(*name))
      .filter(|info| info.available)
  }

  /// The preferred available compiler: a clang if any, else the first found.
  pub fn best_compiler(&self) -> Option<&ToolchainInfo> {
    self.best_clang().or_else(|| self.available().next())
  }

  pub fn best_clang(&self) -> Option<&ToolchainInfo> {
    self
      .available()
      .filter(|info| info.kind == CompilerKind::Clang)
      .max_by(|a, b| compilers::version_key(&a.version).cmp(&compilers::version_key(&b.version)))
  }

  /// Whether a native toolchain usable for `platform` was found. WebAssembly
  /// targets never have one.
  pub fn has_toolchain_for(&self, platform: &Platform) -> bool {
    if platform.arch == "wasm" {
      return false;
    }
    match platform.os.as_str() {
      "android" => self.ndk.is_some(),
      "ios" => self.best_clang().is_some(),
      _ => self.best_compiler().is_some(),
    }
  }
}

/// Split platforms into those whose native toolchain is present and those
/// that must be skipped.
///
/// Platforms that do not need native interop always pass. In strict mode the
/// first skip becomes [`ResolveError::ToolchainUnavailable`].
pub fn filter_by_toolchain_availability(
  platforms: &[Platform],
  probe: &ToolchainProbe,
  strict: bool,
) -> Result<(Vec<Platform>, Vec<(Platform, SkipReason)>), ResolveError> {
  let mut usable = Vec::new();
  let mut skipped = Vec::new();

  for platform in platforms {
    if !requires_native_interop(platform) || probe.has_toolchain_for(platform) {
      usable.push(platform.clone());
      continue;
    }

    let tool = required_tool(platform).to_string();
    if strict {
      return Err(ResolveError::ToolchainUnavailable {
        platform: platform.clone(),
        tool,
      });
    }
    warn!(
      "{}",
      Degradation::ToolchainMissing {
        platform: platform.clone(),
        tool: tool.clone(),
      }
    );
    skipped.push((platform.clone(), SkipReason::ToolchainUnavailable { tool }));
  }

  Ok((usable, skipped))
}

/// Whether the host can produce binaries for `platform` at all.
///
/// iOS binaries need the Apple SDK, so they only build on darwin hosts unless
/// `force` is set.
pub fn host_can_build(platform: &Platform, host: Option<&Platform>, force: bool) -> Result<(), SkipReason> {
  if platform.os != "ios" || force {
    return Ok(());
  }
  match host {
    Some(h) if h.os == "darwin" => Ok(()),
    Some(h) => Err(SkipReason::HostUnsupported { host: h.os.clone() }),
    None => Err(SkipReason::HostUnsupported {
      host: "unknown".to_string(),
    }),
  }
}
