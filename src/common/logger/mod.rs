use std::{fs, path::Path};

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub mod formatter;
pub mod writer;

pub use formatter::*;
pub use writer::*;

use crate::configs::LoggingConfig;

/// Builds the filter directive from the configured level and extra filters.
/// Chatty dependency targets are pinned to `warn` unless overridden.
pub fn filter_directive(logging: Option<&LoggingConfig>) -> String {
  let level = logging.and_then(|l| l.level.as_deref()).unwrap_or("info");
  let filters = logging.and_then(|l| l.filters.as_deref()).unwrap_or("");

  if filters.is_empty() {
    format!("{},hyper=warn,reqwest=warn", level)
  } else {
    format!("{},hyper=warn,reqwest=warn,{}", level, filters)
  }
}

pub fn init(logging: Option<&LoggingConfig>) {
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(filter_directive(logging)));

  let stdout_layer = fmt::layer()
    .event_format(LineFormatter::new(true))
    .with_ansi(true);

  let file_layer = logging.and_then(|l| l.file.as_ref()).map(|file_config| {
    if let Some(parent) = Path::new(&file_config.path).parent() {
      if let Err(e) = fs::create_dir_all(parent) {
        eprintln!("Failed to create log directory: {}", e);
      }
    }

    fmt::layer()
      .with_writer(CircularFileWriter::new(
        file_config.path.clone(),
        file_config.max_lines,
      ))
      .event_format(LineFormatter::new(false))
      .with_ansi(false)
  });

  tracing_subscriber::registry()
    .with(env_filter)
    .with(stdout_layer)
    .with(file_layer)
    .init();
}

/// Shortens user-supplied queries for log lines.
pub fn preview(query: &str) -> String {
  const MAX: usize = 50;
  if query.chars().count() > MAX {
    let head: String = query.chars().take(MAX).collect();
    format!("{}...", head)
  } else {
    query.to_string()
  }
}
