//! Platform resolution.
//!
//! Turns a comma-separated platform specification plus group selection lists
//! into a concrete [`PlatformSet`]. Precedence is fixed:
//!
//! 1. expand the base specification (`all`, group names, `os/arch`, bare OS)
//! 2. `only` replaces everything from step 1
//! 3. `include` adds
//! 4. `exclude` and `except` remove
//! 5. the inline custom group adds
//!
//! `only` and `except` together are rejected before anything else runs.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{CatalogSnapshot, PlatformCatalog};
use crate::error::{Degradation, ResolveError, SelectionList};
use crate::groups::{GroupRegistry, PlatformGroup};
use crate::platform::{Platform, PlatformSet};

/// The token that expands to the full catalog.
pub const ALL: &str = "all";

/// Name given to an inline custom group written without a `name:` prefix.
pub const UNNAMED_CUSTOM_GROUP: &str = "custom";

/// Inputs to one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ResolveRequest {
  /// Comma-separated base specification.
  pub spec: String,
  pub include: Vec<String>,
  pub exclude: Vec<String>,
  pub only: Vec<String>,
  pub except: Vec<String>,
  /// `name:os/arch,os/arch` or `os/arch,os/arch`.
  pub custom_group: Option<String>,
  /// Expand bare OS names to every catalog architecture instead of the host's.
  pub all_archs: bool,
  /// Never query the live catalog.
  pub offline: bool,
}

impl ResolveRequest {
  pub fn new(spec: impl Into<String>) -> Self {
    Self {
      spec: spec.into(),
      ..Default::default()
    }
  }
}

/// A non-fatal observation made while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionNote {
  /// A bare OS name was given but the host architecture is not built for it.
  NativeArchUnsupported { os: String, arch: String },
  /// A bare token matched no group and no catalog OS.
  UnknownOs { os: String },
  /// The catalog fell back to the static list.
  Degraded(Degradation),
}

impl fmt::Display for ResolutionNote {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::NativeArchUnsupported { os, arch } => {
        write!(f, "skipping {}: native architecture {} is not supported", os, arch)
      }
      Self::UnknownOs { os } => write!(f, "skipping '{}': not a group or known operating system", os),
      Self::Degraded(d) => write!(f, "{}", d),
    }
  }
}

/// Result of a successful resolution.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
  pub platforms: PlatformSet,
  pub notes: Vec<ResolutionNote>,
}

impl Resolution {
  pub fn sorted(&self) -> Vec<Platform> {
    self.platforms.sorted()
  }

  /// Catalog degradation recorded during this resolution, if any.
  pub fn degradations(&self) -> impl Iterator<Item = &Degradation> {
    self.notes.iter().filter_map(|note| match note {
      ResolutionNote::Degraded(d) => Some(d),
      _ => None,
    })
  }
}

/// Resolves specifications against a registry and catalog.
pub struct Resolver<'a> {
  registry: &'a GroupRegistry,
  catalog: &'a dyn PlatformCatalog,
  host: Option<Platform>,
}

impl<'a> Resolver<'a> {
  pub fn new(registry: &'a GroupRegistry, catalog: &'a dyn PlatformCatalog, host: Option<Platform>) -> Self {
    Self {
      registry,
      catalog,
      host,
    }
  }

  pub fn resolve(&self, request: &ResolveRequest) -> Result<Resolution, ResolveError> {
    if has_entries(&request.only) && has_entries(&request.except) {
      return Err(ResolveError::ConflictingSelection);
    }

    let mut state = State {
      snapshot: None,
      notes: Vec::new(),
      offline: request.offline,
    };

    let mut platforms = self.expand_spec(&request.spec, request.all_archs, &mut state)?;

    if has_entries(&request.only) {
      platforms = self.collect_groups(&request.only, SelectionList::Only)?;
    }
    platforms.union(&self.collect_groups(&request.include, SelectionList::Include)?);
    platforms.subtract(&self.collect_groups(&request.exclude, SelectionList::Exclude)?);
    platforms.subtract(&self.collect_groups(&request.except, SelectionList::Except)?);

    if let Some(raw) = request.custom_group.as_deref().filter(|s| !s.trim().is_empty()) {
      let group = parse_custom_group(raw)?;
      debug!(group = %group.name, platforms = group.platforms.len(), "adding inline custom group");
      platforms.union(&group.platforms);
    }

    if platforms.is_empty() {
      return Err(ResolveError::NoValidPlatforms);
    }

    info!(count = platforms.len(), "resolved platforms");
    Ok(Resolution {
      platforms,
      notes: state.notes,
    })
  }

  fn expand_spec(&self, spec: &str, all_archs: bool, state: &mut State) -> Result<PlatformSet, ResolveError> {
    let mut set = PlatformSet::new();

    for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
      if token == ALL {
        set.union(&state.catalog(self.catalog).platforms);
      } else if let Some(group) = self.registry.get(token) {
        set.union(&group.platforms);
      } else if token.contains('/') {
        set.insert(Platform::parse(token)?);
      } else {
        self.expand_os(token, all_archs, &mut set, state);
      }
    }

    Ok(set)
  }

  fn expand_os(&self, os: &str, all_archs: bool, set: &mut PlatformSet, state: &mut State) {
    let archs = state.catalog(self.catalog).archs_for_os(os);
    if archs.is_empty() {
      let note = ResolutionNote::UnknownOs { os: os.to_string() };
      info!("{}", note);
      state.notes.push(note);
      return;
    }

    if all_archs {
      for arch in archs {
        set.insert(Platform::new(os, arch));
      }
      return;
    }

    let native = self.host.as_ref().map(|h| h.arch.as_str()).unwrap_or("unknown");
    if archs.iter().any(|a| a == native) {
      set.insert(Platform::new(os, native));
    } else {
      let note = ResolutionNote::NativeArchUnsupported {
        os: os.to_string(),
        arch: native.to_string(),
      };
      info!("{}", note);
      state.notes.push(note);
    }
  }

  fn collect_groups(&self, names: &[String], list: SelectionList) -> Result<PlatformSet, ResolveError> {
    let mut set = PlatformSet::new();
    for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
      let group = self.registry.get(name).ok_or_else(|| ResolveError::UnknownGroup {
        name: name.to_string(),
        list,
      })?;
      set.union(&group.platforms);
    }
    Ok(set)
  }
}

struct State {
  snapshot: Option<CatalogSnapshot>,
  notes: Vec<ResolutionNote>,
  offline: bool,
}

impl State {
  /// Load the catalog on first use.
  fn catalog(&mut self, catalog: &dyn PlatformCatalog) -> &CatalogSnapshot {
    let notes = &mut self.notes;
    let offline = self.offline;
    self.snapshot.get_or_insert_with(|| {
      let snapshot = CatalogSnapshot::load(catalog, offline);
      if let Some(d) = &snapshot.degradation {
        notes.push(ResolutionNote::Degraded(d.clone()));
      }
      snapshot
    })
  }
}

fn has_entries(list: &[String]) -> bool {
  list.iter().any(|s| !s.trim().is_empty())
}

/// Parse an inline custom group: `name:os/arch,...` or `os/arch,...`.
pub fn parse_custom_group(input: &str) -> Result<PlatformGroup, ResolveError> {
  let malformed = |reason: String| ResolveError::MalformedCustomGroup {
    input: input.to_string(),
    reason,
  };

  let (name, list) = match input.split_once(':') {
    Some((name, list)) => {
      let name = name.trim();
      if name.is_empty() {
        return Err(malformed("empty group name".to_string()));
      }
      (name, list)
    }
    None => (UNNAMED_CUSTOM_GROUP, input),
  };

  let mut platforms = Vec::new();
  for entry in list.split(',').map(str::trim).filter(|e| !e.is_empty()) {
    platforms.push(Platform::parse(entry).map_err(|e| malformed(e.to_string()))?);
  }
  if platforms.is_empty() {
    return Err(malformed("no platforms listed".to_string()));
  }

  Ok(PlatformGroup::custom(name, platforms))
}
