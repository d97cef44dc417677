//! Shared test helpers for CLI integration tests.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Platforms the stand-in `go` reports from `go tool dist list`.
pub const DIST_LIST: &[&str] = &[
  "android/arm64",
  "darwin/amd64",
  "darwin/arm64",
  "ios/arm64",
  "js/wasm",
  "linux/amd64",
  "linux/arm64",
  "windows/amd64",
  "windows/arm64",
];

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the fake toolchain
/// and the build output.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn output_path(&self) -> PathBuf {
    self.temp.path().join("dist")
  }

  /// Install a shell script standing in for `go`.
  ///
  /// `go build` writes `GOOS/GOARCH CGO_ENABLED=<value>` to the `-o` path.
  /// Targets listed in `$FAIL_TARGETS` exit 1; a target listed in
  /// `$FLAKY_TARGET` fails until its marker file exists.
  #[cfg(unix)]
  pub fn fake_go(&self) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
      r#"#!/bin/sh
if [ "$1" = "tool" ] && [ "$2" = "dist" ]; then
  printf '{}\n'
  exit 0
fi
if [ "$1" != "build" ]; then
  exit 2
fi
out=""
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; shift; fi
  shift
done
id="$GOOS/$GOARCH"
case " $FAIL_TARGETS " in
  *" $id "*) echo "undefined: main" >&2; exit 1 ;;
esac
if [ "$id" = "$FLAKY_TARGET" ] && [ ! -f "$FLAKY_MARKER" ]; then
  touch "$FLAKY_MARKER"
  echo "flaky failure" >&2
  exit 1
fi
echo "$id CGO_ENABLED=$CGO_ENABLED" > "$out"
"#,
      DIST_LIST.join("\\n")
    );

    let path = self.write_file("bin/go", &script);
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
  }

  /// Command for the crossforge binary with the fake `go` and output dir.
  #[cfg(unix)]
  pub fn build_cmd(&self) -> Command {
    let mut cmd = crossforge();
    cmd
      .arg("build")
      .arg("--go")
      .arg(self.fake_go())
      .arg("-o")
      .arg(self.output_path())
      .args(["-n", "app", "--retry-backoff", "0s"])
      .env_remove("RUST_LOG")
      .env_remove("CROSSFORGE_JOBS");
    cmd
  }
}

pub fn crossforge() -> Command {
  cargo_bin_cmd!("crossforge")
}
