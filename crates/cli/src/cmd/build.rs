//! Implementation of the `crossforge build` command.
//!
//! Plans the session, compiles every target through `go build`, prints each
//! result as it lands and finishes with a summary.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use tokio::sync::mpsc;
use tracing::debug;

use crossforge_lib::catalog::GoDistCatalog;
use crossforge_lib::config::SessionConfig;
use crossforge_lib::dispatch::{BuildEvent, Dispatcher, GoCompiler, Outcome, SessionReport};
use crossforge_lib::resolve::ResolutionNote;
use crossforge_lib::session::{execute, plan};
use crossforge_lib::toolchain::{RealSystem, ToolchainProbe};

use super::{CgoArg, LayoutArg, SelectionArgs, load_registry};
use crate::output::{OutputFormat, format_duration, print_error, print_info, print_json, print_stat, print_success, print_warning};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Go package directory or file to build
  pub source: Option<PathBuf>,

  /// TOML session config; flags override its values
  #[arg(short, long)]
  pub config: Option<PathBuf>,

  #[command(flatten)]
  pub selection: SelectionArgs,

  /// Concurrent builds (default: $CROSSFORGE_JOBS or the number of cores)
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Do not retry failed targets
  #[arg(long)]
  pub no_retry: bool,

  /// Sequential retry rounds after the first attempt
  #[arg(long)]
  pub max_retries: Option<u32>,

  /// Pause before retry round n is n times this, e.g. "500ms"
  #[arg(long, value_parser = humantime::parse_duration)]
  pub retry_backoff: Option<Duration>,

  /// Kill a compiler invocation after this long, e.g. "10m"
  #[arg(long, value_parser = humantime::parse_duration)]
  pub timeout: Option<Duration>,

  /// Output directory
  #[arg(short, long)]
  pub output: Option<PathBuf>,

  /// Binary name (default: the source's name)
  #[arg(short, long)]
  pub name: Option<String>,

  #[arg(long, value_enum)]
  pub layout: Option<LayoutArg>,

  /// Remove the output directory first
  #[arg(long)]
  pub clean: bool,

  /// Android NDK root, overriding discovery
  #[arg(long)]
  pub ndk_path: Option<PathBuf>,

  #[arg(long, value_enum)]
  pub cgo: Option<CgoArg>,

  /// Fail when a target's native toolchain is missing instead of skipping it
  #[arg(long)]
  pub strict: bool,

  /// Attempt iOS builds on non-macOS hosts
  #[arg(long)]
  pub force: bool,

  /// Skip targets that need a native toolchain
  #[arg(long)]
  pub skip_native: bool,

  #[arg(long, allow_hyphen_values = true)]
  pub ldflags: Option<String>,

  #[arg(long)]
  pub tags: Option<String>,

  /// Run every `go build` with -v -x
  #[arg(long)]
  pub verbose_go: bool,

  #[arg(long, value_enum, default_value_t)]
  pub format: OutputFormat,
}

impl BuildArgs {
  /// Load the config file if one was given and overlay the flags.
  pub fn into_config(self) -> Result<SessionConfig> {
    let mut config = match &self.config {
      Some(path) => SessionConfig::load(path).with_context(|| format!("Failed to load config: {}", path.display()))?,
      None => SessionConfig::default(),
    };

    self.selection.apply(&mut config);
    if let Some(source) = self.source {
      config.source = source;
    }
    if let Some(jobs) = self.jobs {
      config.jobs = jobs;
    }
    if self.no_retry {
      config.retry = false;
    }
    if let Some(max_retries) = self.max_retries {
      config.max_retries = max_retries;
    }
    if let Some(backoff) = self.retry_backoff {
      config.retry_backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX);
    }
    if let Some(timeout) = self.timeout {
      config.timeout_secs = Some(if timeout.is_zero() { 0 } else { timeout.as_secs().max(1) });
    }
    if let Some(output) = self.output {
      config.output_dir = output;
    }
    if self.name.is_some() {
      config.binary_name = self.name;
    }
    if let Some(layout) = self.layout {
      config.layout = layout.into();
    }
    if let Some(cgo) = self.cgo {
      config.cgo = cgo.into();
    }
    if self.ndk_path.is_some() {
      config.ndk_path = self.ndk_path;
    }
    if self.ldflags.is_some() {
      config.ldflags = self.ldflags;
    }
    if self.tags.is_some() {
      config.tags = self.tags;
    }
    config.clean |= self.clean;
    config.strict |= self.strict;
    config.force |= self.force;
    config.skip_native |= self.skip_native;
    config.verbose |= self.verbose_go;

    Ok(config)
  }
}

pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let format = args.format;
  let config = args.into_config()?;
  debug!(?config, "session config");
  let registry = load_registry(config.groups_file.as_deref())?;

  let system = RealSystem;
  let catalog = GoDistCatalog::new(&system).with_go(config.go.to_string_lossy());
  let probe = ToolchainProbe::detect(&system, config.ndk_path.as_deref());

  let plan = plan(&config, &registry, &catalog, &probe).context("Failed to plan build session")?;
  let dispatch_config = config.dispatch_config().context("Invalid job configuration")?;
  let notes: Vec<String> = plan
    .resolution
    .notes
    .iter()
    .filter(|note| !matches!(note, ResolutionNote::Degraded(_)))
    .map(ToString::to_string)
    .collect();

  if !format.is_json() {
    for note in &notes {
      print_warning(note);
    }
    print_info(&format!(
      "Building {} for {} target(s) with {} job(s), {} skipped",
      config.binary_name(),
      plan.jobs.len(),
      dispatch_config.jobs,
      plan.skipped.len()
    ));
  }

  let compiler = GoCompiler::new(config.go.clone()).with_timeout(config.timeout());
  let (tx, mut rx) = mpsc::unbounded_channel();
  let dispatcher = Dispatcher::new(compiler, dispatch_config).with_events(tx);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let report = rt
    .block_on(async move {
      let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
          if !format.is_json() {
            print_event(&event);
          }
        }
      });

      let report = execute(plan, &dispatcher, &config).await;
      // Closes the event channel so the printer drains and exits.
      drop(dispatcher);
      let _ = printer.await;
      report
    })
    .context("Build session failed")?;

  if format.is_json() {
    print_report_json(&report, &notes)?;
  } else {
    print_summary(&report);
  }

  if !report.is_success() {
    bail!("{} of {} target(s) failed", report.failed(), report.total());
  }
  Ok(())
}

fn print_event(event: &BuildEvent) {
  let result = &event.result;
  let progress = format!("[{}/{}]", event.completed, event.total);

  match &result.outcome {
    Outcome::Succeeded => print_success(&format!(
      "{} {} -> {} ({})",
      progress,
      result.id(),
      result.target.output_path.display(),
      format_duration(result.duration)
    )),
    Outcome::Failed { error, .. } if !event.terminal => print_warning(&format!(
      "{} attempt {} failed, will retry: {}",
      result.id(),
      result.attempt,
      error
    )),
    Outcome::Failed { error, .. } => print_error(&format!(
      "{} {} failed after {} attempt(s): {}",
      progress,
      result.id(),
      result.attempt,
      error
    )),
    Outcome::Skipped { reason } => print_info(&format!("{} {} skipped: {}", progress, result.id(), reason)),
  }
}

fn print_summary(report: &SessionReport) {
  println!();
  print_stat("Succeeded", &report.succeeded().to_string());
  print_stat("Failed", &report.failed().to_string());
  print_stat("Skipped", &report.skipped().to_string());
  for result in &report.results {
    if let Outcome::Skipped { reason } = &result.outcome {
      println!("    {}: {}", result.id(), reason);
    }
  }
  print_stat("Elapsed", &format_duration(report.elapsed));
}

fn print_report_json(report: &SessionReport, notes: &[String]) -> Result<()> {
  let results: Vec<_> = report
    .results
    .iter()
    .map(|r| {
      serde_json::json!({
        "platform": r.target.platform,
        "output": r.target.output_path,
        "outcome": r.outcome,
        "attempt": r.attempt,
        "duration_ms": r.duration.as_millis() as u64,
      })
    })
    .collect();

  print_json(&serde_json::json!({
    "succeeded": report.succeeded(),
    "failed": report.failed(),
    "skipped": report.skipped(),
    "elapsed_ms": report.elapsed.as_millis() as u64,
    "notes": notes,
    "results": results,
  }))
}
