//! Types for build dispatch.
//!
//! This module defines the invocation handed to a compiler, the per-target
//! outcome, the streamed progress event and the aggregate session report.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::target::BuildTarget;
use crate::toolchain::SkipReason;

/// Everything a compiler needs to build one target once.
#[derive(Debug, Clone)]
pub struct Invocation {
  pub target: BuildTarget,
  /// Variables layered over the inherited environment.
  pub env: BTreeMap<String, String>,
  pub ldflags: Option<String>,
  pub tags: Option<String>,
  /// Package directory or file passed to `go build`.
  pub source: PathBuf,
  /// 1-based attempt number.
  pub attempt: u32,
  /// Ask the compiler for maximum diagnostic output.
  pub verbose: bool,
}

/// Errors from one compiler invocation.
#[derive(Debug, Error)]
pub enum InvokeError {
  /// The compiler process could not be started.
  #[error("failed to start {program}: {source}")]
  Spawn {
    program: String,
    #[source]
    source: std::io::Error,
  },

  /// The compiler ran and exited non-zero.
  #[error("compiler exited with code {code:?}: {stderr}")]
  Exited { code: Option<i32>, stderr: String },

  /// The compiler exceeded its time limit and was killed.
  #[error("compiler timed out after {0:?}")]
  TimedOut(Duration),

  /// The output directory could not be created.
  #[error("failed to create output directory {path}: {source}")]
  OutputDir {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The dispatcher itself could not run the invocation.
  #[error("dispatch interrupted: {0}")]
  Interrupted(String),
}

impl InvokeError {
  /// Whether another attempt could plausibly succeed.
  pub fn kind(&self) -> FailureKind {
    match self {
      Self::Spawn { .. } | Self::Exited { .. } | Self::TimedOut(_) => FailureKind::Retryable,
      Self::OutputDir { .. } | Self::Interrupted(_) => FailureKind::Terminal,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
  Retryable,
  Terminal,
}

/// Final state of one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
  Succeeded,
  Failed { kind: FailureKind, error: String },
  Skipped { reason: SkipReason },
}

impl fmt::Display for Outcome {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Succeeded => write!(f, "ok"),
      Self::Failed { error, .. } => write!(f, "failed: {}", error),
      Self::Skipped { reason } => write!(f, "skipped: {}", reason),
    }
  }
}

/// Result of dispatching one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildResult {
  pub target: BuildTarget,
  pub outcome: Outcome,
  /// Wall time of the final attempt. Zero for skipped targets.
  pub duration: Duration,
  /// Attempt that produced this result. Zero for skipped targets.
  pub attempt: u32,
}

impl BuildResult {
  pub fn skipped(target: BuildTarget, reason: SkipReason) -> Self {
    Self {
      target,
      outcome: Outcome::Skipped { reason },
      duration: Duration::ZERO,
      attempt: 0,
    }
  }

  pub fn id(&self) -> String {
    self.target.id()
  }

  pub fn is_success(&self) -> bool {
    matches!(self.outcome, Outcome::Succeeded)
  }

  pub fn is_failure(&self) -> bool {
    matches!(self.outcome, Outcome::Failed { .. })
  }

  pub fn is_skipped(&self) -> bool {
    matches!(self.outcome, Outcome::Skipped { .. })
  }

  pub(crate) fn is_retryable(&self) -> bool {
    matches!(
      self.outcome,
      Outcome::Failed {
        kind: FailureKind::Retryable,
        ..
      }
    )
  }
}

/// One streamed progress update.
#[derive(Debug, Clone)]
pub struct BuildEvent {
  pub result: BuildResult,
  /// Targets with a final result so far, including this one.
  pub completed: usize,
  pub total: usize,
  /// Whether this result is final for its target.
  pub terminal: bool,
}

/// Aggregate result of a dispatch session.
#[derive(Debug, Clone, Default)]
pub struct SessionReport {
  /// One result per target, ordered by target identity.
  pub results: Vec<BuildResult>,
  pub elapsed: Duration,
}

impl SessionReport {
  pub fn succeeded(&self) -> usize {
    self.results.iter().filter(|r| r.is_success()).count()
  }

  pub fn failed(&self) -> usize {
    self.results.iter().filter(|r| r.is_failure()).count()
  }

  pub fn skipped(&self) -> usize {
    self.results.iter().filter(|r| r.is_skipped()).count()
  }

  pub fn total(&self) -> usize {
    self.results.len()
  }

  /// True unless at least one target ended in failure. Skips do not count.
  pub fn is_success(&self) -> bool {
    self.failed() == 0
  }

  pub fn get(&self, id: &str) -> Option<&BuildResult> {
    self.results.iter().find(|r| r.id() == id)
  }
}

/// Configuration for dispatch.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
  /// Maximum concurrent compiler invocations in the first round; 0 means one per core.
  pub jobs: usize,
  /// Re-run failed targets in sequential fallback rounds.
  pub retry: bool,
  /// Extra attempts per target after the first.
  pub max_retries: u32,
  /// Pause before fallback round `n`, multiplied by `n`.
  pub retry_backoff: Duration,
  /// Verbose compiler output on the first attempt too.
  pub verbose: bool,
}

impl Default for DispatchConfig {
  fn default() -> Self {
    Self {
      jobs: num_cpus(),
      retry: true,
      max_retries: 3,
      retry_backoff: Duration::from_secs(1),
      verbose: false,
    }
  }
}

impl DispatchConfig {
  /// First-round concurrency with 0 mapped to the core count.
  pub fn effective_jobs(&self) -> usize {
    if self.jobs == 0 { num_cpus() } else { self.jobs }
  }

  /// Total attempts a target may get.
  pub fn max_attempts(&self) -> u32 {
    if self.retry { 1 + self.max_retries } else { 1 }
  }
}

/// Get the number of CPUs for default parallelism.
pub fn num_cpus() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::platform::Platform;
  use crate::target::{OutputLayout, materialize};
  use std::path::Path;

  fn target(id: &str) -> BuildTarget {
    materialize("app", Path::new("out"), OutputLayout::Flat, &Platform::parse(id).unwrap())
  }

  fn result(id: &str, outcome: Outcome) -> BuildResult {
    BuildResult {
      target: target(id),
      outcome,
      duration: Duration::from_millis(5),
      attempt: 1,
    }
  }

  #[test]
  fn report_success_when_empty() {
    let report = SessionReport::default();
    assert!(report.is_success());
    assert_eq!(report.total(), 0);
  }

  #[test]
  fn skipped_targets_do_not_fail_the_session() {
    let report = SessionReport {
      results: vec![
        result("linux/amd64", Outcome::Succeeded),
        BuildResult::skipped(
          target("ios/arm64"),
          SkipReason::HostUnsupported {
            host: "linux".to_string(),
          },
        ),
      ],
      elapsed: Duration::from_secs(1),
    };
    assert!(report.is_success());
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.failed(), 0);
  }

  #[test]
  fn a_single_failure_fails_the_session() {
    let report = SessionReport {
      results: vec![
        result("linux/amd64", Outcome::Succeeded),
        result(
          "linux/arm64",
          Outcome::Failed {
            kind: FailureKind::Terminal,
            error: "exit 1".to_string(),
          },
        ),
      ],
      elapsed: Duration::ZERO,
    };
    assert!(!report.is_success());
    assert_eq!(report.get("linux/arm64").unwrap().attempt, 1);
  }

  #[test]
  fn skipped_result_has_no_attempt_or_duration() {
    let r = BuildResult::skipped(target("ios/arm64"), SkipReason::NativeInteropSkipped);
    assert_eq!(r.attempt, 0);
    assert_eq!(r.duration, Duration::ZERO);
  }

  #[test]
  fn invoke_error_classification() {
    let exited = InvokeError::Exited {
      code: Some(2),
      stderr: String::new(),
    };
    assert_eq!(exited.kind(), FailureKind::Retryable);
    let dir = InvokeError::OutputDir {
      path: PathBuf::from("/ro"),
      source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
    };
    assert_eq!(dir.kind(), FailureKind::Terminal);
  }

  #[test]
  fn max_attempts_counts_first_try() {
    let config = DispatchConfig {
      max_retries: 2,
      ..Default::default()
    };
    assert_eq!(config.max_attempts(), 3);
    let no_retry = DispatchConfig {
      retry: false,
      ..config
    };
    assert_eq!(no_retry.max_attempts(), 1);
  }

  #[test]
  fn dispatch_config_default_jobs() {
    assert!(DispatchConfig::default().jobs >= 1);
  }

  #[test]
  fn zero_jobs_resolves_to_core_count() {
    let zero = DispatchConfig {
      jobs: 0,
      ..Default::default()
    };
    assert_eq!(zero.effective_jobs(), num_cpus());
    let three = DispatchConfig { jobs: 3, ..zero };
    assert_eq!(three.effective_jobs(), 3);
  }
}
