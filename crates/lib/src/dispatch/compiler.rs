//! Compiler invocation.
//!
//! [`GoCompiler`] runs `go build` for one target with the derived environment
//! layered over the inherited one.

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, info};

use super::types::{InvokeError, Invocation};

/// Something that can build one target.
pub trait Compiler: Send + Sync + 'static {
  fn invoke(&self, invocation: &Invocation) -> impl Future<Output = Result<(), InvokeError>> + Send;
}

/// The Go toolchain.
#[derive(Debug, Clone)]
pub struct GoCompiler {
  go: PathBuf,
  timeout: Option<Duration>,
}

impl Default for GoCompiler {
  fn default() -> Self {
    Self {
      go: PathBuf::from("go"),
      timeout: None,
    }
  }
}

impl GoCompiler {
  pub fn new(go: impl Into<PathBuf>) -> Self {
    Self {
      go: go.into(),
      timeout: None,
    }
  }

  /// Kill an invocation that runs longer than `timeout`.
  pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
    self.timeout = timeout;
    self
  }

  /// Arguments passed to `go` for `invocation`.
  pub fn args(invocation: &Invocation) -> Vec<String> {
    let mut args = vec!["build".to_string()];
    if invocation.verbose {
      args.push("-v".to_string());
      args.push("-x".to_string());
    }
    if let Some(ldflags) = invocation.ldflags.as_deref().filter(|s| !s.is_empty()) {
      args.push("-ldflags".to_string());
      args.push(ldflags.to_string());
    }
    if let Some(tags) = invocation.tags.as_deref().filter(|s| !s.is_empty()) {
      args.push("-tags".to_string());
      args.push(tags.to_string());
    }
    args.push("-o".to_string());
    args.push(invocation.target.output_path.display().to_string());
    args.push(invocation.source.display().to_string());
    args
  }

  async fn run(&self, invocation: &Invocation) -> Result<(), InvokeError> {
    let args = Self::args(invocation);
    let mut command = Command::new(&self.go);
    command.args(&args).envs(&invocation.env).kill_on_drop(true);

    debug!(platform = %invocation.target.id(), go = %self.go.display(), ?args, "spawning compiler");

    let output = command.output().await.map_err(|source| InvokeError::Spawn {
      program: self.go.display().to_string(),
      source,
    })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if invocation.verbose && !stderr.is_empty() {
      debug!(platform = %invocation.target.id(), stderr = %stderr, "compiler output");
    }

    if !output.status.success() {
      return Err(InvokeError::Exited {
        code: output.status.code(),
        stderr: stderr.trim().to_string(),
      });
    }
    Ok(())
  }
}

impl Compiler for GoCompiler {
  async fn invoke(&self, invocation: &Invocation) -> Result<(), InvokeError> {
    info!(platform = %invocation.target.id(), attempt = invocation.attempt, "compiling");
    match self.timeout {
      Some(limit) => match tokio::time::timeout(limit, self.run(invocation)).await {
        Ok(result) => result,
        Err(_) => Err(InvokeError::TimedOut(limit)),
      },
      None => self.run(invocation).await,
    }
  }
}
