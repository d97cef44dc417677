//! Implementation of the `crossforge list` command.

use anyhow::Result;

use crossforge_lib::catalog::{CatalogSnapshot, GoDistCatalog};
use crossforge_lib::platform::Platform;
use crossforge_lib::toolchain::RealSystem;

use crate::output::{OutputFormat, print_json, print_warning};

pub fn cmd_list(os: Option<&str>, offline: bool, go: &str, format: OutputFormat) -> Result<()> {
  let system = RealSystem;
  let catalog = GoDistCatalog::new(&system).with_go(go);
  let snapshot = CatalogSnapshot::load(&catalog, offline);

  let platforms: Vec<Platform> = snapshot
    .platforms
    .sorted()
    .into_iter()
    .filter(|p| os.is_none_or(|os| p.os == os))
    .collect();

  if format.is_json() {
    return print_json(&serde_json::json!({
      "static": snapshot.degradation.is_some(),
      "platforms": platforms,
    }));
  }

  if let Some(degradation) = &snapshot.degradation {
    print_warning(&degradation.to_string());
  }
  for platform in &platforms {
    println!("{}", platform);
  }
  Ok(())
}
