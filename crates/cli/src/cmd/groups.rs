//! Implementation of the `crossforge groups` command.

use std::path::Path;

use anyhow::{Context, Result, bail};

use crossforge_lib::groups::PlatformGroup;

use super::load_registry;
use crate::output::{OutputFormat, print_json, print_stat, print_success};

pub fn cmd_groups(
  name: Option<&str>,
  groups_file: Option<&Path>,
  save: Option<&Path>,
  format: OutputFormat,
) -> Result<()> {
  let registry = load_registry(groups_file)?;

  if let Some(path) = save {
    registry
      .save(path)
      .with_context(|| format!("Failed to save groups: {}", path.display()))?;
    print_success(&format!("Saved {} groups to {}", registry.len(), path.display()));
    return Ok(());
  }

  if let Some(name) = name {
    let Some(group) = registry.get(name) else {
      bail!("unknown group '{}'", name);
    };
    return if format.is_json() {
      print_json(group)
    } else {
      print_group(group);
      Ok(())
    };
  }

  if format.is_json() {
    let groups: Vec<&PlatformGroup> = registry.iter().collect();
    return print_json(&groups);
  }

  for group in registry.iter() {
    println!(
      "{:<16} {:<10} {:>3}  {}",
      group.name,
      group.category.as_str(),
      group.platforms.len(),
      group.description
    );
  }
  Ok(())
}

fn print_group(group: &PlatformGroup) {
  println!("{}", group.name);
  if !group.description.is_empty() {
    print_stat("Description", &group.description);
  }
  print_stat("Category", group.category.as_str());
  if !group.tags.is_empty() {
    print_stat("Tags", &group.tags.join(", "));
  }
  print_stat("Platforms", &group.to_spec());
}
