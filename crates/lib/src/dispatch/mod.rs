//! Build dispatch.
//!
//! The dispatcher runs one compiler invocation per target:
//!
//! 1. Round one runs every target concurrently, bounded by a semaphore of
//!    `jobs` permits
//! 2. Targets that failed with a retryable error are re-run in fallback
//!    rounds with exactly one permit and verbose compiler output, until they
//!    succeed or run out of attempts
//! 3. The last result per target identity is the session result
//!
//! Every result is streamed as a [`BuildEvent`]. Progress counts only results
//! that are final for their target, so it never goes backwards.

mod compiler;
mod types;

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

pub use compiler::{Compiler, GoCompiler};
pub use types::{
  BuildEvent, BuildResult, DispatchConfig, FailureKind, InvokeError, Invocation, Outcome, SessionReport, num_cpus,
};

use crate::target::BuildTarget;

/// A fully planned target: where it goes and how to build it.
#[derive(Debug, Clone)]
pub struct Job {
  pub target: BuildTarget,
  pub env: BTreeMap<String, String>,
  pub ldflags: Option<String>,
  pub tags: Option<String>,
  pub source: PathBuf,
}

impl Job {
  pub fn id(&self) -> String {
    self.target.id()
  }

  fn invocation(&self, attempt: u32, verbose: bool) -> Invocation {
    Invocation {
      target: self.target.clone(),
      env: self.env.clone(),
      ldflags: self.ldflags.clone(),
      tags: self.tags.clone(),
      source: self.source.clone(),
      attempt,
      verbose,
    }
  }
}

/// Results gathered so far, shared by all workers of a session.
#[derive(Default)]
struct Ledger {
  completed: usize,
  results: BTreeMap<String, BuildResult>,
}

struct Progress {
  ledger: Mutex<Ledger>,
  total: usize,
  events: Option<UnboundedSender<BuildEvent>>,
}

impl Progress {
  /// Record a result; only final results advance `completed`.
  fn record(&self, result: BuildResult, terminal: bool) {
    let mut ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
    if terminal {
      ledger.completed += 1;
      ledger.results.insert(result.id(), result.clone());
    }
    if let Some(tx) = &self.events {
      let _ = tx.send(BuildEvent {
        result,
        completed: ledger.completed,
        total: self.total,
        terminal,
      });
    }
  }

  fn has_result(&self, id: &str) -> bool {
    let ledger = self.ledger.lock().unwrap_or_else(PoisonError::into_inner);
    ledger.results.contains_key(id)
  }

  fn into_results(self) -> Vec<BuildResult> {
    let ledger = self.ledger.into_inner().unwrap_or_else(PoisonError::into_inner);
    ledger.results.into_values().collect()
  }
}

/// Dispatches jobs to a [`Compiler`].
pub struct Dispatcher<C: Compiler> {
  compiler: Arc<C>,
  config: DispatchConfig,
  events: Option<UnboundedSender<BuildEvent>>,
}

impl<C: Compiler> Dispatcher<C> {
  pub fn new(compiler: C, config: DispatchConfig) -> Self {
    Self {
      compiler: Arc::new(compiler),
      config,
      events: None,
    }
  }

  /// Stream every result to `events` as it arrives.
  pub fn with_events(mut self, events: UnboundedSender<BuildEvent>) -> Self {
    self.events = Some(events);
    self
  }

  /// Build every job, record pre-skipped targets, and report.
  pub async fn run(&self, jobs: Vec<Job>, skipped: Vec<BuildResult>) -> SessionReport {
    let start = Instant::now();
    let progress = Arc::new(Progress {
      ledger: Mutex::new(Ledger::default()),
      total: jobs.len() + skipped.len(),
      events: self.events.clone(),
    });

    for result in skipped {
      info!(platform = %result.id(), reason = %result.outcome, "skipping");
      progress.record(result, true);
    }

    let max_attempts = self.config.max_attempts();
    let jobs: Vec<Arc<Job>> = jobs.into_iter().map(Arc::new).collect();
    let mut pending = jobs.clone();
    let mut attempt = 1;

    while !pending.is_empty() {
      let fallback = attempt > 1;
      let concurrency = if fallback { 1 } else { self.config.effective_jobs() };
      let verbose = self.config.verbose || fallback;

      if fallback {
        warn!(
          count = pending.len(),
          attempt,
          "retrying failed targets sequentially with verbose output"
        );
        let pause = self.config.retry_backoff * (attempt - 1);
        if !pause.is_zero() {
          tokio::time::sleep(pause).await;
        }
      } else {
        info!(count = pending.len(), jobs = concurrency, "dispatching builds");
      }

      let last = attempt >= max_attempts;
      let retry_ids = self
        .run_round(&pending, attempt, concurrency, verbose, last, &progress)
        .await;

      if last {
        break;
      }
      pending = jobs
        .iter()
        .filter(|job| retry_ids.contains(&job.id()))
        .cloned()
        .collect();
      attempt += 1;
    }

    // A worker that panicked never recorded anything.
    for job in &jobs {
      if !progress.has_result(&job.id()) {
        let result = BuildResult {
          target: job.target.clone(),
          outcome: Outcome::Failed {
            kind: FailureKind::Terminal,
            error: "build task aborted".to_string(),
          },
          duration: Duration::ZERO,
          attempt,
        };
        progress.record(result, true);
      }
    }

    let results = match Arc::try_unwrap(progress) {
      Ok(progress) => progress.into_results(),
      Err(shared) => {
        let ledger = shared.ledger.lock().unwrap_or_else(PoisonError::into_inner);
        ledger.results.values().cloned().collect()
      }
    };

    let report = SessionReport {
      results,
      elapsed: start.elapsed(),
    };
    info!(
      succeeded = report.succeeded(),
      failed = report.failed(),
      skipped = report.skipped(),
      elapsed = ?report.elapsed,
      "dispatch finished"
    );
    report
  }

  /// Run one round and return the ids that should be retried.
  async fn run_round(
    &self,
    jobs: &[Arc<Job>],
    attempt: u32,
    concurrency: usize,
    verbose: bool,
    last: bool,
    progress: &Arc<Progress>,
  ) -> BTreeSet<String> {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut join_set = JoinSet::new();

    for job in jobs {
      let job = job.clone();
      let compiler = self.compiler.clone();
      let semaphore = semaphore.clone();
      let progress = progress.clone();

      join_set.spawn(async move {
        let invocation = job.invocation(attempt, verbose);

        let (outcome, duration) = match semaphore.acquire().await {
          Ok(_permit) => {
            let started = Instant::now();
            let outcome = invoke_once(compiler.as_ref(), &invocation).await;
            (outcome, started.elapsed())
          }
          Err(e) => (Err(InvokeError::Interrupted(e.to_string())), Duration::ZERO),
        };

        let outcome = match outcome {
          Ok(()) => {
            info!(platform = %job.id(), attempt, "build succeeded");
            Outcome::Succeeded
          }
          Err(e) => {
            let kind = if last { FailureKind::Terminal } else { e.kind() };
            match kind {
              FailureKind::Retryable => warn!(platform = %job.id(), attempt, error = %e, "build failed, will retry"),
              FailureKind::Terminal => error!(platform = %job.id(), attempt, error = %e, "build failed"),
            }
            Outcome::Failed {
              kind,
              error: e.to_string(),
            }
          }
        };

        let result = BuildResult {
          target: job.target.clone(),
          outcome,
          duration,
          attempt,
        };
        let retry = result.is_retryable();
        progress.record(result, !retry);
        (job.id(), retry)
      });
    }

    let mut retry_ids = BTreeSet::new();
    while let Some(joined) = join_set.join_next().await {
      match joined {
        Ok((id, true)) => {
          retry_ids.insert(id);
        }
        Ok((_, false)) => {}
        Err(e) => error!(error = %e, "build task panicked"),
      }
    }
    retry_ids
  }
}

/// Create the output directory, then invoke the compiler.
async fn invoke_once<C: Compiler>(compiler: &C, invocation: &Invocation) -> Result<(), InvokeError> {
  if let Some(dir) = invocation.target.output_dir().filter(|d| !d.as_os_str().is_empty()) {
    tokio::fs::create_dir_all(dir)
      .await
      .map_err(|source| InvokeError::OutputDir {
        path: dir.to_path_buf(),
        source,
      })?;
  }
  compiler.invoke(invocation).await
}
