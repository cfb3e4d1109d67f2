// Stream index: the root document of an archive
//
// Tracks, per stream name, the sync cursor (`latest_id`) and per-topic
// summaries. Loaded whole, mutated in memory for the length of a run, and
// written whole at the end of it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ArchiveStore, read_json, write_json};
use crate::error::{ArchiveError, Result};

/// Format of the `time` field, e.g. "Mar 04 2025 at 17:20".
pub const TIME_FORMAT: &str = "%b %d %Y at %H:%M";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSummary {
  /// Number of archived messages in the topic
  pub size: usize,
  /// Epoch seconds of the newest archived message
  pub latest_date: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEntry {
  /// Remote stream id, as first seen
  pub id: u64,
  /// Highest message id archived for this stream
  pub latest_id: u64,
  #[serde(default)]
  pub topic_data: BTreeMap<String, TopicSummary>,
}

impl StreamEntry {
  pub fn new(id: u64) -> Self {
    Self {
      id,
      latest_id: 0,
      topic_data: BTreeMap::new(),
    }
  }

  /// Overwrite a topic's summary. `size` is the new total, not a delta.
  pub fn record_topic_result(&mut self, topic: &str, size: usize, latest_date: i64) {
    self
      .topic_data
      .insert(topic.to_string(), TopicSummary { size, latest_date });
  }

  /// Raise the cursor to `id` if it is higher (full rebuild).
  pub fn advance_cursor(&mut self, id: u64) {
    self.latest_id = self.latest_id.max(id);
  }

  /// Set the cursor to the newest fetched id (incremental update).
  pub fn set_cursor(&mut self, id: u64) {
    self.latest_id = id;
  }

  /// Topics ordered by most recent activity, newest first; ties by name.
  pub fn sorted_topics(&self) -> Vec<(&str, &TopicSummary)> {
    let mut topics: Vec<_> = self.topic_data.iter().map(|(k, v)| (k.as_str(), v)).collect();
    topics.sort_by(|a, b| b.1.latest_date.cmp(&a.1.latest_date).then_with(|| a.0.cmp(b.0)));
    topics
  }

  pub fn message_count(&self) -> usize {
    self.topic_data.values().map(|t| t.size).sum()
  }

  pub fn latest_date(&self) -> Option<i64> {
    self.topic_data.values().map(|t| t.latest_date).max()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamIndex {
  /// Completion time of the last successful run (UTC)
  #[serde(default)]
  pub time: String,
  /// Keyed by stream name. A renamed stream shows up as a new entry.
  pub streams: BTreeMap<String, StreamEntry>,
}

impl StreamIndex {
  pub fn new() -> Self {
    Self::default()
  }

  /// Read the index. A missing index is fatal: incremental sync needs a prior full run.
  pub fn load(store: &ArchiveStore) -> Result<Self> {
    let path = store.index_path();
    read_json(&path)?.ok_or(ArchiveError::MissingIndex { path })
  }

  /// Stamp `time` with the current UTC time and write the whole index.
  pub fn save(&mut self, store: &ArchiveStore) -> Result<()> {
    self.save_at(store, Utc::now())
  }

  pub fn save_at(&mut self, store: &ArchiveStore, now: DateTime<Utc>) -> Result<()> {
    self.time = now.format(TIME_FORMAT).to_string();
    write_json(&store.index_path(), self)?;
    info!(streams = self.streams.len(), time = %self.time, "Saved stream index");
    Ok(())
  }

  /// Entry for `name`, created with a zero cursor if unseen.
  pub fn upsert_stream(&mut self, name: &str, stream_id: u64) -> &mut StreamEntry {
    self
      .streams
      .entry(name.to_string())
      .or_insert_with(|| StreamEntry::new(stream_id))
  }

  pub fn stream(&self, name: &str) -> Option<&StreamEntry> {
    self.streams.get(name)
  }

  /// Streams ordered by name.
  pub fn sorted_streams(&self) -> Vec<(&str, &StreamEntry)> {
    self.streams.iter().map(|(k, v)| (k.as_str(), v)).collect()
  }
}
