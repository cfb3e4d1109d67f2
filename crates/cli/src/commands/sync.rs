//! Sync command

use anyhow::{Context, Result};
use std::time::Instant;
use tracing::info;
use zarchive::{
  client::{RetryConfig, ZulipClient},
  config::Config,
  filter::StreamFilter,
  store::ArchiveStore,
  sync::{Archiver, SyncMode},
};

/// Run a full rebuild or an incremental update
pub async fn cmd_sync(config: &Config, full: bool) -> Result<()> {
  // Validate everything local before the first request goes out
  let filter = StreamFilter::from_config(&config.archive)?;
  let client = ZulipClient::new(&config.zulip)?;
  let store = ArchiveStore::new(config.json_root());

  let mode = if full { SyncMode::Full } else { SyncMode::Incremental };
  info!(mode = ?mode, root = %store.root().display(), "Starting sync");

  let archiver = Archiver::new(&client, store, move |name| filter.is_eligible(name))
    .with_page_size(config.archive.page_size)
    .with_retry(RetryConfig::from_secs_f64(config.archive.retry_padding_secs));

  let started = Instant::now();
  let report = archiver
    .run(mode)
    .await
    .with_context(|| format!("{} sync failed", if full { "Full" } else { "Incremental" }))?;

  println!(
    "Synced {} streams: {} messages across {} topics in {:.1}s",
    report.streams,
    report.messages,
    report.topics,
    started.elapsed().as_secs_f64()
  );
  println!("Archive: {}", archiver.store().root().display());

  Ok(())
}
