//! CLI output formatting utilities.
//!
//! Status lines carry a leading symbol; errors and warnings go to stderr so
//! stdout stays parseable.

use std::time::Duration;

use anyhow::Context;
use clap::ValueEnum;

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const WARNING: &str = "⚠";
  pub const INFO: &str = "•";
}

pub fn format_duration(duration: Duration) -> String {
  let secs = duration.as_secs();
  let millis = duration.subsec_millis();

  if secs >= 60 {
    let mins = secs / 60;
    let remaining_secs = secs % 60;
    format!("{}m {}s", mins, remaining_secs)
  } else if secs > 0 {
    format!("{}.{:02}s", secs, millis / 10)
  } else {
    format!("{}ms", millis)
  }
}

pub fn print_success(message: &str) {
  println!("{} {}", symbols::SUCCESS, message);
}

pub fn print_error(message: &str) {
  eprintln!("{} {}", symbols::ERROR, message);
}

pub fn print_warning(message: &str) {
  eprintln!("{} {}", symbols::WARNING, message);
}

pub fn print_info(message: &str) {
  println!("{} {}", symbols::INFO, message);
}

pub fn print_stat(label: &str, value: &str) {
  println!("  {}: {}", label, value);
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}
