//! Sync orchestration.
//!
//! A run walks the eligible streams one at a time, writes Topic Stores as it
//! goes, and saves the Stream Index once at the very end. If a run dies part
//! way, topics already written stay written and the index still reflects the
//! previous run; the next incremental run re-fetches from the old cursor and
//! the id-keyed merge drops what is already on disk.

use tracing::{debug, info};

use crate::{
  client::{MessageQuery, MessageSource, RetryConfig},
  domain::message::StreamDescriptor,
  error::Result,
  fetch::Fetcher,
  partition::partition_by_topic,
  store::{ArchiveStore, StreamIndex},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
  /// Rebuild every topic from the beginning of history.
  Full,
  /// Fetch only what is newer than each stream's cursor.
  Incremental,
}

/// Counts from one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
  pub streams: usize,
  pub topics: usize,
  pub messages: usize,
}

pub struct Archiver<'a, C: MessageSource + ?Sized> {
  fetcher: Fetcher<'a, C>,
  store: ArchiveStore,
  is_eligible: Box<dyn Fn(&str) -> bool + Send + Sync + 'a>,
}

impl<'a, C: MessageSource + ?Sized> Archiver<'a, C> {
  pub fn new(client: &'a C, store: ArchiveStore, is_eligible: impl Fn(&str) -> bool + Send + Sync + 'a) -> Self {
    Self {
      fetcher: Fetcher::new(client),
      store,
      is_eligible: Box::new(is_eligible),
    }
  }

  pub fn with_page_size(mut self, page_size: u32) -> Self {
    self.fetcher = self.fetcher.with_page_size(page_size);
    self
  }

  pub fn with_retry(mut self, retry: RetryConfig) -> Self {
    self.fetcher = self.fetcher.with_retry(retry);
    self
  }

  pub fn store(&self) -> &ArchiveStore {
    &self.store
  }

  pub async fn run(&self, mode: SyncMode) -> Result<SyncReport> {
    match mode {
      SyncMode::Full => self.populate_all().await,
      SyncMode::Incremental => self.populate_incremental().await,
    }
  }

  async fn eligible_streams(&self) -> Result<Vec<StreamDescriptor>> {
    let streams = self.fetcher.streams().await?;
    let total = streams.len();
    let eligible: Vec<_> = streams
      .into_iter()
      .filter(|s| {
        let keep = (self.is_eligible)(&s.name);
        if !keep {
          debug!(stream = %s.name, "Skipping stream not in scope");
        }
        keep
      })
      .collect();
    debug!(total, eligible = eligible.len(), "Listed streams");
    Ok(eligible)
  }

  /// Fetch every topic of every eligible stream from scratch and write a brand-new index.
  pub async fn populate_all(&self) -> Result<SyncReport> {
    let streams = self.eligible_streams().await?;
    let mut index = StreamIndex::new();
    let mut report = SyncReport::default();

    for stream in &streams {
      info!(stream = %stream.name, "Archiving stream");
      let topics = self.fetcher.topics(stream.stream_id).await?;
      let entry = index.upsert_stream(&stream.name, stream.stream_id);

      for topic in &topics {
        let query = MessageQuery::topic(&stream.name, &topic.name);
        let messages = self.fetcher.fetch_all(&query, 0).await?;

        let Some(last) = messages.last() else {
          debug!(stream = %stream.name, topic = %topic.name, "Topic has no visible messages, skipping");
          continue;
        };
        let (last_id, latest_date) = (last.id, last.timestamp);

        self.store.topic(stream, &topic.name).write_fresh(&messages)?;
        entry.record_topic_result(&topic.name, messages.len(), latest_date);
        entry.advance_cursor(last_id);

        report.topics += 1;
        report.messages += messages.len();
      }

      report.streams += 1;
    }

    index.save(&self.store)?;
    info!(
      streams = report.streams,
      topics = report.topics,
      messages = report.messages,
      "Full sync complete"
    );
    Ok(report)
  }

  /// Fetch messages newer than each stream's cursor and merge them into their topics.
  pub async fn populate_incremental(&self) -> Result<SyncReport> {
    let mut index = StreamIndex::load(&self.store)?;
    let streams = self.eligible_streams().await?;
    let mut report = SyncReport::default();

    for stream in &streams {
      info!(stream = %stream.name, "Updating stream");
      let entry = index.upsert_stream(&stream.name, stream.stream_id);

      let query = MessageQuery::stream(&stream.name);
      let new_messages = self.fetcher.fetch_all(&query, entry.latest_id + 1).await?;
      if let Some(last) = new_messages.last() {
        entry.set_cursor(last.id);
      }
      report.messages += new_messages.len();

      for (topic, messages) in partition_by_topic(new_messages) {
        let topic_store = self.store.topic(stream, &topic);
        let old = topic_store.load()?;
        let outcome = topic_store.merge_and_save(old, messages)?;

        entry.record_topic_result(&topic, outcome.total, outcome.latest_date.unwrap_or_default());
        report.topics += 1;
      }

      report.streams += 1;
    }

    index.save(&self.store)?;
    info!(
      streams = report.streams,
      topics = report.topics,
      messages = report.messages,
      "Incremental sync complete"
    );
    Ok(report)
  }
}
