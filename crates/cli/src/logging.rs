//! Logging setup for CLI commands

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use zarchive::config::LoggingConfig;

/// Initialize logging for short commands (console only, warnings and up)
pub fn init_cli_logging() {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();
}

/// Parse log level from config string
fn parse_log_level(level: &str) -> tracing::Level {
  match level.to_lowercase().as_str() {
    "off" | "error" => tracing::Level::ERROR,
    "warn" => tracing::Level::WARN,
    "info" => tracing::Level::INFO,
    "debug" => tracing::Level::DEBUG,
    "trace" => tracing::Level::TRACE,
    _ => tracing::Level::INFO,
  }
}

/// Initialize logging with config-driven settings.
///
/// Always logs to stderr. When `logging.file` is set, the same events are
/// also appended to that file without ANSI colors.
///
/// Returns the guard that must be kept alive for the duration of the program
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
  let level = parse_log_level(&config.level);

  // Build env filter (allows RUST_LOG override)
  let env_filter = EnvFilter::builder()
    .with_default_directive(level.into())
    .from_env_lossy();

  let console = fmt::layer().with_target(true).with_writer(std::io::stderr);

  let Some(file) = config.file.as_deref() else {
    tracing_subscriber::registry().with(env_filter).with(console).init();
    return None;
  };

  let dir = file.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
  let Some(name) = file.file_name() else {
    tracing_subscriber::registry().with(env_filter).with(console).init();
    tracing::warn!(path = %file.display(), "Log file path has no file name, logging to console only");
    return None;
  };
  if let Err(e) = std::fs::create_dir_all(dir) {
    // Fall back to console-only logging
    tracing_subscriber::registry().with(env_filter).with(console).init();
    tracing::warn!(dir = %dir.display(), error = %e, "Could not create log directory, logging to console only");
    return None;
  }

  let file_appender = tracing_appender::rolling::never(dir, name);
  let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

  tracing_subscriber::registry()
    .with(env_filter)
    .with(console)
    .with(fmt::layer().with_target(true).with_ansi(false).with_writer(file_writer))
    .init();

  Some(guard)
}
