use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{debug, warn};

use super::{read_json, write_json};
use crate::{domain::message::Message, error::Result};

/// Result of merging a batch into a topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOutcome {
  /// New messages written
  pub appended: usize,
  /// Incoming messages already present (same id)
  pub skipped: usize,
  /// Topic size after the merge
  pub total: usize,
  /// Timestamp of the newest message after the merge
  pub latest_date: Option<i64>,
}

/// Merge `new` into `old`, keyed by message id.
///
/// Ids already in `old` are skipped. When every surviving new message is newer
/// than the stored tail this is a plain append; otherwise the result is stably
/// sorted by id so the ascending-id invariant holds either way.
pub fn merge_messages(old: Vec<Message>, new: Vec<Message>) -> (Vec<Message>, MergeOutcome) {
  let mut seen: HashSet<u64> = old.iter().map(|m| m.id).collect();
  let mut merged = old;
  let mut appended = 0;
  let mut skipped = 0;
  let mut in_order = true;

  for message in new {
    if !seen.insert(message.id) {
      skipped += 1;
      continue;
    }
    if let Some(last) = merged.last()
      && message.id < last.id
    {
      in_order = false;
    }
    merged.push(message);
    appended += 1;
  }

  if !in_order {
    merged.sort_by_key(|m| m.id);
  }

  let outcome = MergeOutcome {
    appended,
    skipped,
    total: merged.len(),
    latest_date: merged.last().map(|m| m.timestamp),
  };
  (merged, outcome)
}

/// The persisted message list of one (stream, topic) pair.
#[derive(Debug, Clone)]
pub struct TopicStore {
  path: PathBuf,
}

impl TopicStore {
  pub(crate) fn new(path: PathBuf) -> Self {
    Self { path }
  }

  /// Stored messages, or an empty list if the topic has never been written.
  pub fn load(&self) -> Result<Vec<Message>> {
    Ok(read_json(&self.path)?.unwrap_or_default())
  }

  /// Replace the topic with exactly `messages`.
  pub fn write_fresh(&self, messages: &[Message]) -> Result<()> {
    write_json(&self.path, messages)
  }

  /// Merge `new` into `old` and write the result, replacing prior contents.
  pub fn merge_and_save(&self, old: Vec<Message>, new: Vec<Message>) -> Result<MergeOutcome> {
    let (merged, outcome) = merge_messages(old, new);

    if outcome.skipped > 0 {
      warn!(
        path = %self.path.display(),
        skipped = outcome.skipped,
        "Skipped messages already present in topic"
      );
    }

    write_json(&self.path, &merged)?;
    debug!(
      path = %self.path.display(),
      appended = outcome.appended,
      total = outcome.total,
      "Merged topic"
    );
    Ok(outcome)
  }
}
