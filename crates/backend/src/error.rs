//! Error types for the archive engine.

use std::path::PathBuf;

use crate::client::ClientError;

/// Unified error type for sync runs.
///
/// Rate limiting never shows up here: the client layer absorbs it by waiting
/// and retrying, so a `Client` error is always terminal for the run.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
  /// Configuration is missing or invalid. Raised before any remote call.
  #[error("{0}")]
  Config(String),
  /// Incremental sync was requested but no stream index exists yet.
  #[error(
    "You are trying to incrementally update your index, but we cannot find a stream index at {}.\n\n\
     Most likely, you have never built the index. Run `zarchive sync --full` once to build it.\n\n\
     (It's also possible that you have built the index but modified the configuration \
     or moved files in your file system.)",
    path.display()
  )]
  MissingIndex { path: PathBuf },
  /// The remote service failed in a way that is not a rate limit.
  #[error("Remote error: {0}")]
  Client(#[from] ClientError),
  /// The remote service answered with something the pager cannot continue from.
  #[error("Protocol error: {0}")]
  Protocol(String),
  #[error("IO error at {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("Invalid JSON document at {}: {source}", path.display())]
  Json {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },
}

impl ArchiveError {
  pub fn config(msg: impl Into<String>) -> Self {
    Self::Config(msg.into())
  }

  pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
    Self::Io {
      path: path.into(),
      source,
    }
  }

  pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
    Self::Json {
      path: path.into(),
      source,
    }
  }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
