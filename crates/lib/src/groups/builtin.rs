//! Built-in platform groups.

use super::{GroupCategory, PlatformGroup};
use crate::platform::Platform;

struct Def {
  name: &'static str,
  description: &'static str,
  category: GroupCategory,
  tags: &'static [&'static str],
  platforms: &'static [&'static str],
}

const DEFS: &[Def] = &[
  Def {
    name: "default",
    description: "Desktop platforms plus the primary Android target",
    category: GroupCategory::General,
    tags: &["default", "desktop", "mobile"],
    platforms: &[
      "windows/amd64",
      "windows/386",
      "windows/arm64",
      "linux/amd64",
      "linux/386",
      "linux/arm64",
      "linux/arm",
      "darwin/amd64",
      "darwin/arm64",
      "android/arm64",
    ],
  },
  Def {
    name: "desktop",
    description: "Windows, Linux and macOS desktop targets",
    category: GroupCategory::Desktop,
    tags: &["desktop"],
    platforms: &[
      "windows/amd64",
      "windows/386",
      "windows/arm64",
      "linux/amd64",
      "linux/386",
      "linux/arm64",
      "linux/arm",
      "darwin/amd64",
      "darwin/arm64",
    ],
  },
  Def {
    name: "server",
    description: "Server operating systems (Linux, BSD, Solarish, AIX)",
    category: GroupCategory::Server,
    tags: &["server", "unix"],
    platforms: &[
      "linux/amd64",
      "linux/arm64",
      "linux/ppc64",
      "linux/ppc64le",
      "linux/s390x",
      "freebsd/amd64",
      "freebsd/386",
      "freebsd/arm",
      "freebsd/arm64",
      "freebsd/riscv64",
      "netbsd/amd64",
      "netbsd/386",
      "netbsd/arm",
      "netbsd/arm64",
      "openbsd/amd64",
      "openbsd/386",
      "openbsd/arm",
      "openbsd/arm64",
      "openbsd/ppc64",
      "openbsd/riscv64",
      "dragonfly/amd64",
      "solaris/amd64",
      "illumos/amd64",
      "aix/ppc64",
    ],
  },
  Def {
    name: "mobile",
    description: "Android and iOS; requires a native toolchain",
    category: GroupCategory::Mobile,
    tags: &["mobile", "cgo"],
    platforms: &[
      "android/arm64",
      "android/arm",
      "android/386",
      "android/amd64",
      "ios/amd64",
      "ios/arm64",
    ],
  },
  Def {
    name: "web",
    description: "WebAssembly targets",
    category: GroupCategory::Web,
    tags: &["wasm"],
    platforms: &["js/wasm", "wasip1/wasm"],
  },
  Def {
    name: "embedded",
    description: "ARM, MIPS, RISC-V, LoongArch and Plan 9 targets",
    category: GroupCategory::Embedded,
    tags: &["embedded"],
    platforms: &[
      "linux/arm",
      "linux/arm64",
      "linux/riscv64",
      "linux/mips",
      "linux/mips64",
      "linux/mips64le",
      "linux/mipsle",
      "linux/loong64",
      "plan9/386",
      "plan9/amd64",
      "plan9/arm",
    ],
  },
  Def {
    name: "unix",
    description: "Common 64-bit Unix-like targets",
    category: GroupCategory::OsFamily,
    tags: &["unix"],
    platforms: &[
      "linux/amd64",
      "linux/arm64",
      "freebsd/amd64",
      "freebsd/arm64",
      "netbsd/amd64",
      "openbsd/amd64",
      "darwin/amd64",
      "darwin/arm64",
      "solaris/amd64",
      "illumos/amd64",
      "dragonfly/amd64",
      "aix/ppc64",
    ],
  },
  Def {
    name: "bsd",
    description: "FreeBSD, NetBSD, OpenBSD and DragonFly",
    category: GroupCategory::OsFamily,
    tags: &["unix", "bsd"],
    platforms: &[
      "freebsd/amd64",
      "freebsd/386",
      "freebsd/arm",
      "freebsd/arm64",
      "freebsd/riscv64",
      "netbsd/amd64",
      "netbsd/386",
      "netbsd/arm",
      "netbsd/arm64",
      "openbsd/amd64",
      "openbsd/386",
      "openbsd/arm",
      "openbsd/arm64",
      "openbsd/ppc64",
      "openbsd/riscv64",
      "dragonfly/amd64",
    ],
  },
  Def {
    name: "linux",
    description: "Every Linux architecture",
    category: GroupCategory::OsFamily,
    tags: &["unix", "linux"],
    platforms: &[
      "linux/amd64",
      "linux/386",
      "linux/arm",
      "linux/arm64",
      "linux/mips",
      "linux/mips64",
      "linux/mips64le",
      "linux/mipsle",
      "linux/ppc64",
      "linux/ppc64le",
      "linux/riscv64",
      "linux/s390x",
      "linux/loong64",
    ],
  },
  Def {
    name: "windows",
    description: "Every Windows architecture",
    category: GroupCategory::OsFamily,
    tags: &["windows", "desktop"],
    platforms: &["windows/amd64", "windows/386", "windows/arm64"],
  },
  Def {
    name: "darwin",
    description: "macOS on Intel and Apple Silicon",
    category: GroupCategory::OsFamily,
    tags: &["apple", "desktop"],
    platforms: &["darwin/amd64", "darwin/arm64"],
  },
  Def {
    name: "android",
    description: "Every Android architecture; requires the NDK",
    category: GroupCategory::OsFamily,
    tags: &["mobile", "cgo"],
    platforms: &["android/arm64", "android/arm", "android/386", "android/amd64"],
  },
  Def {
    name: "ios",
    description: "iOS device and simulator; requires a darwin host",
    category: GroupCategory::OsFamily,
    tags: &["mobile", "apple", "cgo"],
    platforms: &["ios/amd64", "ios/arm64"],
  },
];

/// Returns the built-in groups in declaration order.
pub(super) fn groups() -> Vec<PlatformGroup> {
  DEFS
    .iter()
    .map(|def| PlatformGroup {
      name: def.name.to_string(),
      description: def.description.to_string(),
      category: def.category,
      tags: def.tags.iter().map(|t| t.to_string()).collect(),
      platforms: def
        .platforms
        .iter()
        .filter_map(|id| Platform::parse(id).ok())
        .collect(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_builtin_platform_parses() {
    for def in DEFS {
      for id in def.platforms {
        assert!(Platform::parse(id).is_ok(), "{} in group {} is malformed", id, def.name);
      }
    }
  }

  #[test]
  fn builtin_names_are_unique() {
    let mut names: Vec<_> = DEFS.iter().map(|d| d.name).collect();
    names.sort();
    names.dedup();
    assert_eq!(names.len(), DEFS.len());
  }
}
