//! Status command

use anyhow::Result;
use chrono::DateTime;
use zarchive::{
  config::Config,
  store::{ArchiveStore, StreamEntry, StreamIndex, TIME_FORMAT},
};

/// Print what the archive currently holds
pub fn cmd_status(config: &Config, json: bool) -> Result<()> {
  let store = ArchiveStore::new(config.json_root());
  let index = StreamIndex::load(&store)?;

  if json {
    println!("{}", serde_json::to_string_pretty(&index)?);
    return Ok(());
  }

  println!("Archive: {}", store.root().display());
  println!("Last sync: {}", if index.time.is_empty() { "unknown" } else { &index.time });
  println!();

  if index.streams.is_empty() {
    println!("No streams archived.");
    return Ok(());
  }

  for (name, entry) in index.sorted_streams() {
    println!("{}", stream_line(name, entry));
    for (topic, summary) in entry.sorted_topics() {
      println!("  {:<40} {:>6}  {}", topic, summary.size, format_date(summary.latest_date));
    }
  }

  Ok(())
}

fn stream_line(name: &str, entry: &StreamEntry) -> String {
  format!(
    "{} (id {}): {} messages in {} topics, cursor {}, last active {}",
    name,
    entry.id,
    entry.message_count(),
    entry.topic_data.len(),
    entry.latest_id,
    entry.latest_date().map(format_date).unwrap_or_else(|| "never".to_string())
  )
}

fn format_date(epoch_secs: i64) -> String {
  DateTime::from_timestamp(epoch_secs, 0)
    .map(|d| d.format(TIME_FORMAT).to_string())
    .unwrap_or_else(|| "-".to_string())
}
