//! Implementation of the `crossforge env` command.
//!
//! Without a platform, reports what the toolchain probe found on this host.
//! With one, prints the variables `go build` would run under for it.

use std::path::Path;

use anyhow::{Context, Result};

use crossforge_lib::env::derive_environment;
use crossforge_lib::platform::Platform;
use crossforge_lib::toolchain::{RealSystem, ToolchainProbe};

use super::CgoArg;
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_warning, symbols};

pub fn cmd_env(platform: Option<&str>, ndk_path: Option<&Path>, cgo: CgoArg, format: OutputFormat) -> Result<()> {
  let probe = ToolchainProbe::detect(&RealSystem, ndk_path);

  match platform {
    Some(raw) => print_derived(raw, &probe, cgo, format),
    None if format.is_json() => print_json(&probe),
    None => {
      print_probe(&probe);
      Ok(())
    }
  }
}

fn print_derived(raw: &str, probe: &ToolchainProbe, cgo: CgoArg, format: OutputFormat) -> Result<()> {
  let platform = Platform::parse(raw)?;
  let derived = derive_environment(&platform, probe, cgo.into())
    .with_context(|| format!("Failed to derive environment for {}", platform))?;

  if format.is_json() {
    return print_json(&derived);
  }

  for warning in &derived.warnings {
    print_warning(&warning.to_string());
  }
  for (key, value) in &derived.vars {
    println!("{}={}", key, value);
  }
  Ok(())
}

fn print_probe(probe: &ToolchainProbe) {
  let host = probe.host.as_ref().map_or_else(|| "unknown".to_string(), ToString::to_string);
  print_info(&format!("Host: {}", host));

  println!();
  println!("Compilers:");
  for (name, info) in &probe.compilers {
    match &info.path {
      Some(path) if info.available => println!(
        "  {} {:<6} {} ({} {})",
        symbols::SUCCESS,
        name,
        path.display(),
        info.kind,
        info.version
      ),
      _ => println!("  {} {:<6} not found", symbols::ERROR, name),
    }
  }

  println!();
  match &probe.ndk {
    Some(ndk) => {
      println!("Android NDK:");
      print_stat("Root", &ndk.root.display().to_string());
      print_stat("Host", ndk.host.as_str());
      print_stat("Toolchain", &ndk.bin_dir().display().to_string());
      print_stat("Found via", &ndk.source.to_string());
    }
    None => println!("Android NDK: not found"),
  }

  for degradation in &probe.degradations {
    print_warning(&degradation.to_string());
  }
}
