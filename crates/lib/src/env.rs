//! Per-target build environment.
//!
//! [`derive_environment`] is a pure function of the platform, the toolchain
//! snapshot and the user's cgo choice. The result is layered on top of the
//! inherited process environment when the compiler is spawned.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Degradation, ResolveError};
use crate::platform::Platform;
use crate::toolchain::{NdkHost, NdkInstallation, ToolchainProbe, required_tool, requires_native_interop};

/// Minimum Android API level targeted by the NDK compiler wrappers.
pub const ANDROID_API_LEVEL: u32 = 21;

/// The user's cgo preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CgoMode {
  /// Enable only where the platform requires it.
  #[default]
  Auto,
  /// Enable wherever a compiler is available.
  On,
  /// Never enable.
  Off,
}

/// Environment derived for one target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DerivedEnv {
  pub vars: BTreeMap<String, String>,
  pub native_interop: bool,
  pub warnings: Vec<Degradation>,
}

impl DerivedEnv {
  pub fn get(&self, key: &str) -> Option<&str> {
    self.vars.get(key).map(String::as_str)
  }

  fn set(&mut self, key: &str, value: impl Into<String>) {
    self.vars.insert(key.to_string(), value.into());
  }
}

/// Compute the environment for building `platform`.
///
/// Fails only when native interop is enabled for an Android architecture the
/// NDK has no compiler wrapper for.
pub fn derive_environment(platform: &Platform, probe: &ToolchainProbe, cgo: CgoMode) -> Result<DerivedEnv, ResolveError> {
  let mut env = DerivedEnv::default();
  env.set("GOOS", &platform.os);
  env.set("GOARCH", &platform.arch);

  let wanted = match cgo {
    CgoMode::Off => false,
    CgoMode::On => true,
    CgoMode::Auto => requires_native_interop(platform),
  };
  let available = probe.has_toolchain_for(platform);

  env.native_interop = wanted && available;
  env.set("CGO_ENABLED", if env.native_interop { "1" } else { "0" });

  if cgo == CgoMode::On && !available {
    env.warnings.push(Degradation::InteropDisabled {
      platform: platform.clone(),
      tool: required_tool(platform).to_string(),
    });
  }

  if !env.native_interop {
    return Ok(env);
  }

  match platform.os.as_str() {
    "android" => {
      if let Some(ndk) = &probe.ndk {
        android_vars(&mut env, platform, ndk)?;
      }
    }
    "ios" => {
      if let Some(clang) = probe.best_clang().and_then(|c| c.path.as_deref()) {
        env.set("CC", path_str(clang));
        env.set("CXX", path_str(&clang.with_file_name("clang++")));
      }
    }
    _ => {}
  }

  Ok(env)
}

/// NDK compiler wrapper prefix for a Go architecture.
pub fn android_triple(arch: &str) -> Option<&'static str> {
  match arch {
    "arm" => Some("armv7a-linux-androideabi"),
    "arm64" => Some("aarch64-linux-android"),
    "386" => Some("i686-linux-android"),
    "amd64" => Some("x86_64-linux-android"),
    _ => None,
  }
}

fn android_vars(env: &mut DerivedEnv, platform: &Platform, ndk: &NdkInstallation) -> Result<(), ResolveError> {
  let triple = android_triple(&platform.arch).ok_or_else(|| ResolveError::UnsupportedSdkArch {
    platform: platform.clone(),
    arch: platform.arch.clone(),
  })?;

  let suffix = if ndk.host == NdkHost::Windows { ".cmd" } else { "" };
  let bin = ndk.bin_dir();
  let cc = bin.join(format!("{}{}-clang{}", triple, ANDROID_API_LEVEL, suffix));
  let cxx = bin.join(format!("{}{}-clang++{}", triple, ANDROID_API_LEVEL, suffix));
  let sysroot = ndk.sysroot();

  let root = path_str(&ndk.root);
  env.set("ANDROID_NDK_HOME", root.clone());
  env.set("ANDROID_NDK_ROOT", root);
  env.set("CC", path_str(&cc));
  env.set("CXX", path_str(&cxx));
  env.set("CGO_CFLAGS", format!("-I{}", path_str(&sysroot.join("usr").join("include"))));
  env.set("CGO_LDFLAGS", format!("-L{}", path_str(&sysroot.join("usr").join("lib"))));
  Ok(())
}

fn path_str(path: &Path) -> String {
  path.display().to_string()
}
