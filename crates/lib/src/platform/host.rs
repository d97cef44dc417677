//! Host platform detection.
//!
//! Translates Rust's `std::env::consts` names into the Go toolchain's
//! `GOOS`/`GOARCH` vocabulary used for every [`Platform`] in this crate.

use super::Platform;

/// Returns the host operating system in Go naming (e.g. "darwin" for macOS)
///
/// Returns `None` if the OS has no Go equivalent
pub fn host_os() -> Option<&'static str> {
  go_os(std::env::consts::OS)
}

/// Returns the host CPU architecture in Go naming (e.g. "amd64" for x86_64)
///
/// Returns `None` if the architecture has no Go equivalent
pub fn host_arch() -> Option<&'static str> {
  go_arch(std::env::consts::ARCH, cfg!(target_endian = "little"))
}

/// Detect the current platform at runtime
pub fn host_platform() -> Option<Platform> {
  Some(Platform::new(host_os()?, host_arch()?))
}

fn go_os(rust_os: &str) -> Option<&'static str> {
  let os = match rust_os {
    "linux" => "linux",
    "macos" => "darwin",
    "windows" => "windows",
    "android" => "android",
    "ios" => "ios",
    "freebsd" => "freebsd",
    "netbsd" => "netbsd",
    "openbsd" => "openbsd",
    "dragonfly" => "dragonfly",
    "solaris" => "solaris",
    "illumos" => "illumos",
    "aix" => "aix",
    _ => return None,
  };
  Some(os)
}

fn go_arch(rust_arch: &str, little_endian: bool) -> Option<&'static str> {
  let arch = match (rust_arch, little_endian) {
    ("x86_64", _) => "amd64",
    ("x86", _) => "386",
    ("aarch64", _) => "arm64",
    ("arm", _) => "arm",
    ("riscv64", _) => "riscv64",
    ("powerpc64", true) => "ppc64le",
    ("powerpc64", false) => "ppc64",
    ("s390x", _) => "s390x",
    ("mips", true) => "mipsle",
    ("mips", false) => "mips",
    ("mips64", true) => "mips64le",
    ("mips64", false) => "mips64",
    ("loongarch64", _) => "loong64",
    ("wasm32", _) => "wasm",
    _ => return None,
  };
  Some(arch)
}
