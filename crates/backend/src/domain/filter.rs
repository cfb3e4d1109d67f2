use std::collections::HashSet;

use super::config::ArchiveConfig;
use crate::error::{ArchiveError, Result};

/// Decides which streams are in scope for archiving.
///
/// Built once from explicit config values and handed to the orchestrator as a
/// plain predicate.
#[derive(Debug, Clone)]
pub struct StreamFilter {
  included: HashSet<String>,
  excluded: HashSet<String>,
}

impl StreamFilter {
  pub fn new<I, E>(included: I, excluded: E) -> Result<Self>
  where
    I: IntoIterator<Item = String>,
    E: IntoIterator<Item = String>,
  {
    let included: HashSet<String> = included.into_iter().collect();
    if included.is_empty() {
      return Err(ArchiveError::config("Please add \"*\" to included_streams."));
    }

    Ok(Self {
      included,
      excluded: excluded.into_iter().collect(),
    })
  }

  pub fn from_config(config: &ArchiveConfig) -> Result<Self> {
    let Some(included) = &config.included_streams else {
      return Err(ArchiveError::config("Please set included_streams."));
    };
    Self::new(included.iter().cloned(), config.excluded_streams.iter().cloned())
  }

  /// Exclusion wins over inclusion; `"*"` includes everything else.
  pub fn is_eligible(&self, stream_name: &str) -> bool {
    if self.excluded.contains(stream_name) {
      return false;
    }
    self.included.contains("*") || self.included.contains(stream_name)
  }
}
