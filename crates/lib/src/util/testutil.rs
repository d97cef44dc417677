//! Test doubles for crossforge-lib.
//!
//! - [`FakeSystem`]: an in-memory host for toolchain and catalog probes
//! - [`FakeCatalog`]: a platform catalog that is either fixed or unreachable
//! - [`ScriptedCompiler`]: a compiler whose per-target outcomes are scripted
//!   and whose invocation windows are recorded

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::catalog::{CatalogError, PlatformCatalog};
use crate::dispatch::{Compiler, InvokeError, Invocation};
use crate::platform::Platform;
use crate::toolchain::{
  CommandOutput, CompilerKind, HostSystem, NdkHost, NdkInstallation, NdkSource, ToolchainInfo, ToolchainProbe,
};

/// In-memory [`HostSystem`].
#[derive(Debug, Default, Clone)]
pub struct FakeSystem {
  host: Option<Platform>,
  env: HashMap<String, String>,
  executables: HashMap<String, PathBuf>,
  outputs: HashMap<PathBuf, CommandOutput>,
  dirs: HashSet<PathBuf>,
  files: HashSet<PathBuf>,
  home: Option<PathBuf>,
}

impl FakeSystem {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_host(mut self, id: &str) -> Self {
    self.host = Platform::parse(id).ok();
    self
  }

  pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
    let home = home.into();
    self.add_dir(&home);
    self.home = Some(home);
    self
  }

  pub fn with_env(mut self, key: &str, value: &str) -> Self {
    self.env.insert(key.to_string(), value.to_string());
    self
  }

  /// Put `name` on the fake PATH at `path`.
  pub fn with_executable(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    self.files.insert(path.clone());
    self.executables.insert(name.to_string(), path);
    self
  }

  /// Output returned whenever the program at `path` is run.
  pub fn with_output(mut self, path: impl Into<PathBuf>, output: CommandOutput) -> Self {
    self.outputs.insert(path.into(), output);
    self
  }

  /// Add a directory and all its ancestors.
  pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
    self.add_dir(&path.into());
    self
  }

  /// Add a file and all its parent directories.
  pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    if let Some(parent) = path.parent() {
      self.add_dir(parent);
    }
    self.files.insert(path);
    self
  }

  fn add_dir(&mut self, path: &Path) {
    for ancestor in path.ancestors() {
      if ancestor.as_os_str().is_empty() {
        continue;
      }
      self.dirs.insert(ancestor.to_path_buf());
    }
  }
}

impl HostSystem for FakeSystem {
  fn host_platform(&self) -> Option<Platform> {
    self.host.clone()
  }

  fn env_var(&self, key: &str) -> Option<String> {
    self.env.get(key).cloned()
  }

  fn which(&self, program: &str) -> Option<PathBuf> {
    self.executables.get(program).cloned()
  }

  fn run(&self, program: &Path, _args: &[&str]) -> io::Result<CommandOutput> {
    self
      .outputs
      .get(program)
      .cloned()
      .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("no scripted output for {}", program.display())))
  }

  fn is_dir(&self, path: &Path) -> bool {
    self.dirs.contains(path)
  }

  fn is_file(&self, path: &Path) -> bool {
    self.files.contains(path)
  }

  fn list_dirs(&self, path: &Path) -> Vec<String> {
    self
      .dirs
      .iter()
      .filter(|d| d.parent() == Some(path))
      .filter_map(|d| d.file_name().and_then(|n| n.to_str()).map(str::to_string))
      .collect()
  }

  fn home_dir(&self) -> Option<PathBuf> {
    self.home.clone()
  }
}

/// A catalog with a fixed answer. Counts how often it was queried.
#[derive(Debug, Default)]
pub struct FakeCatalog {
  platforms: Option<Vec<Platform>>,
  calls: AtomicUsize,
}

impl FakeCatalog {
  pub fn with(ids: &[&str]) -> Self {
    Self {
      platforms: Some(ids.iter().map(|id| Platform::parse(id).unwrap()).collect()),
      calls: AtomicUsize::new(0),
    }
  }

  /// A catalog whose every query fails.
  pub fn unreachable() -> Self {
    Self::default()
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

impl PlatformCatalog for FakeCatalog {
  fn platforms(&self) -> Result<Vec<Platform>, CatalogError> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    self
      .platforms
      .clone()
      .ok_or_else(|| CatalogError::ToolMissing("go".to_string()))
  }
}

/// Build a probe directly: the named compilers are available under
/// `/usr/bin`, and with `ndk` a linux-hosted NDK lives at `/ndk`.
pub fn probe_with(compilers: &[&str], ndk: bool) -> ToolchainProbe {
  let compilers: BTreeMap<String, ToolchainInfo> = compilers
    .iter()
    .map(|name| {
      let kind = match *name {
        "clang" => CompilerKind::Clang,
        "gcc" => CompilerKind::Gcc,
        _ => CompilerKind::Generic,
      };
      let info = ToolchainInfo {
        name: name.to_string(),
        available: true,
        path: Some(PathBuf::from("/usr/bin").join(name)),
        version: "1.0.0".to_string(),
        kind,
      };
      (name.to_string(), info)
    })
    .collect();

  let ndk = ndk.then(|| NdkInstallation {
    root: PathBuf::from("/ndk"),
    host: NdkHost::Linux,
    prebuilt: PathBuf::from("/ndk/toolchains/llvm/prebuilt/linux-x86_64"),
    source: NdkSource::Explicit,
  });

  ToolchainProbe {
    host: Platform::parse("linux/amd64").ok(),
    compilers,
    ndk,
    degradations: Vec::new(),
  }
}

/// Scripted result of one compiler attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
  Succeed,
  Fail,
  SpawnError,
}

/// One recorded invocation window.
#[derive(Debug, Clone)]
pub struct Call {
  pub id: String,
  pub attempt: u32,
  pub verbose: bool,
  pub env: BTreeMap<String, String>,
  pub ldflags: Option<String>,
  pub started: Instant,
  pub finished: Instant,
}

#[derive(Default)]
struct Shared {
  scripts: Mutex<HashMap<String, VecDeque<Step>>>,
  calls: Mutex<Vec<Call>>,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

/// A [`Compiler`] that follows a per-target script; unscripted attempts
/// succeed. Clones share recorded state.
#[derive(Clone, Default)]
pub struct ScriptedCompiler {
  shared: Arc<Shared>,
  delay: Duration,
}

impl ScriptedCompiler {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn script(self, id: &str, steps: impl IntoIterator<Item = Step>) -> Self {
    self
      .shared
      .scripts
      .lock()
      .unwrap()
      .insert(id.to_string(), steps.into_iter().collect());
    self
  }

  /// Make each invocation take `delay`.
  pub fn with_delay(mut self, delay: Duration) -> Self {
    self.delay = delay;
    self
  }

  pub fn calls(&self) -> Vec<Call> {
    self.shared.calls.lock().unwrap().clone()
  }

  pub fn max_in_flight(&self) -> usize {
    self.shared.max_in_flight.load(Ordering::SeqCst)
  }
}

impl Compiler for ScriptedCompiler {
  async fn invoke(&self, invocation: &Invocation) -> Result<(), InvokeError> {
    let id = invocation.target.id();
    let started = Instant::now();
    let now = self.shared.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.shared.max_in_flight.fetch_max(now, Ordering::SeqCst);

    let step = self
      .shared
      .scripts
      .lock()
      .unwrap()
      .get_mut(&id)
      .and_then(VecDeque::pop_front)
      .unwrap_or(Step::Succeed);

    if !self.delay.is_zero() {
      tokio::time::sleep(self.delay).await;
    }

    self.shared.in_flight.fetch_sub(1, Ordering::SeqCst);
    self.shared.calls.lock().unwrap().push(Call {
      id,
      attempt: invocation.attempt,
      verbose: invocation.verbose,
      env: invocation.env.clone(),
      ldflags: invocation.ldflags.clone(),
      started,
      finished: Instant::now(),
    });

    match step {
      Step::Succeed => Ok(()),
      Step::Fail => Err(InvokeError::Exited {
        code: Some(1),
        stderr: "scripted failure".to_string(),
      }),
      Step::SpawnError => Err(InvokeError::Spawn {
        program: "go".to_string(),
        source: io::Error::from(io::ErrorKind::NotFound),
      }),
    }
  }
}
