//! End-to-end build session.
//!
//! [`plan`] resolves the platform specification, drops what the host cannot
//! build, derives each target's environment and produces dispatchable jobs.
//! [`execute`] runs a plan through a [`Dispatcher`].

use std::path::PathBuf;

use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::PlatformCatalog;
use crate::config::{ConfigError, SessionConfig};
use crate::dispatch::{BuildResult, Compiler, Dispatcher, Job, SessionReport};
use crate::env::{CgoMode, derive_environment};
use crate::error::{Degradation, ResolveError};
use crate::groups::GroupRegistry;
use crate::platform::Platform;
use crate::resolve::{Resolution, Resolver};
use crate::target::materialize;
use crate::toolchain::{
  SkipReason, ToolchainProbe, filter_by_toolchain_availability, host_can_build, requires_native_interop,
};

/// Linker flags used for Android targets with cgo when none are given.
pub const ANDROID_STATIC_LDFLAGS: &str = "-linkmode=external -extldflags=-static";

#[derive(Debug, Error)]
pub enum SessionError {
  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error("failed to clean output directory {path}: {source}")]
  Clean {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// The dispatchable outcome of planning.
#[derive(Debug, Clone)]
pub struct Plan {
  pub resolution: Resolution,
  pub jobs: Vec<Job>,
  pub skipped: Vec<BuildResult>,
  pub degradations: Vec<Degradation>,
}

/// Resolve and prepare every target. Touches no filesystem.
pub fn plan(
  config: &SessionConfig,
  registry: &GroupRegistry,
  catalog: &dyn PlatformCatalog,
  probe: &ToolchainProbe,
) -> Result<Plan, SessionError> {
  let resolution = Resolver::new(registry, catalog, probe.host.clone()).resolve(&config.resolve_request())?;

  let mut degradations = probe.degradations.clone();
  degradations.extend(resolution.degradations().cloned());

  let binary = config.binary_name();
  let target_for = |platform: &Platform| materialize(&binary, &config.output_dir, config.layout, platform);

  let mut skipped = Vec::new();
  let mut candidates = Vec::new();
  for platform in resolution.sorted() {
    let reason = if config.skip_native && requires_native_interop(&platform) {
      Some(SkipReason::NativeInteropSkipped)
    } else {
      host_can_build(&platform, probe.host.as_ref(), config.force).err()
    };
    match reason {
      Some(reason) => skipped.push(BuildResult::skipped(target_for(&platform), reason)),
      None => candidates.push(platform),
    }
  }

  // With cgo off, mobile targets build as pure Go and need no toolchain.
  let usable = if config.cgo == CgoMode::Off {
    candidates
  } else {
    let (usable, missing) = filter_by_toolchain_availability(&candidates, probe, config.strict)?;
    for (platform, reason) in missing {
      if let SkipReason::ToolchainUnavailable { tool } = &reason {
        degradations.push(Degradation::ToolchainMissing {
          platform: platform.clone(),
          tool: tool.clone(),
        });
      }
      skipped.push(BuildResult::skipped(target_for(&platform), reason));
    }
    usable
  };

  let mut jobs = Vec::with_capacity(usable.len());
  for platform in usable {
    let derived = derive_environment(&platform, probe, config.cgo)?;
    for warning in &derived.warnings {
      warn!("{}", warning);
    }
    degradations.extend(derived.warnings.iter().cloned());

    let ldflags = match config.ldflags.as_deref().filter(|f| !f.trim().is_empty()) {
      Some(flags) => Some(flags.to_string()),
      None if platform.os == "android" && derived.native_interop => Some(ANDROID_STATIC_LDFLAGS.to_string()),
      None => None,
    };

    jobs.push(Job {
      target: target_for(&platform),
      env: derived.vars,
      ldflags,
      tags: config.tags.clone().filter(|t| !t.trim().is_empty()),
      source: config.source.clone(),
    });
  }

  info!(builds = jobs.len(), skipped = skipped.len(), "planned session");
  Ok(Plan {
    resolution,
    jobs,
    skipped,
    degradations,
  })
}

/// Run a plan, cleaning the output directory first if configured.
pub async fn execute<C: Compiler>(
  plan: Plan,
  dispatcher: &Dispatcher<C>,
  config: &SessionConfig,
) -> Result<SessionReport, SessionError> {
  if config.clean {
    let clean_err = |source| SessionError::Clean {
      path: config.output_dir.clone(),
      source,
    };
    if tokio::fs::try_exists(&config.output_dir).await.map_err(clean_err)? {
      info!(path = %config.output_dir.display(), "cleaning output directory");
      tokio::fs::remove_dir_all(&config.output_dir).await.map_err(clean_err)?;
    }
  }

  Ok(dispatcher.run(plan.jobs, plan.skipped).await)
}
