//! Implementation of the `crossforge resolve` command.

use anyhow::{Context, Result};

use crossforge_lib::catalog::GoDistCatalog;
use crossforge_lib::config::SessionConfig;
use crossforge_lib::platform::host_platform;
use crossforge_lib::resolve::Resolver;
use crossforge_lib::toolchain::RealSystem;

use super::{SelectionArgs, load_registry};
use crate::output::{OutputFormat, print_info, print_json, print_warning};

pub fn cmd_resolve(selection: &SelectionArgs, format: OutputFormat) -> Result<()> {
  let mut config = SessionConfig::default();
  selection.apply(&mut config);

  let registry = load_registry(config.groups_file.as_deref())?;
  let system = RealSystem;
  let catalog = GoDistCatalog::new(&system).with_go(config.go.to_string_lossy());

  let resolution = Resolver::new(&registry, &catalog, host_platform())
    .resolve(&config.resolve_request())
    .with_context(|| format!("Failed to resolve '{}'", config.platforms))?;
  let platforms = resolution.sorted();

  if format.is_json() {
    let notes: Vec<String> = resolution.notes.iter().map(ToString::to_string).collect();
    return print_json(&serde_json::json!({
      "platforms": platforms,
      "notes": notes,
    }));
  }

  for note in &resolution.notes {
    print_warning(&note.to_string());
  }
  print_info(&format!("{} platform(s)", platforms.len()));
  for platform in &platforms {
    println!("  {}", platform);
  }
  Ok(())
}
