//! Paginated message fetching.
//!
//! Drives the message listing endpoint from an anchor to the newest match,
//! one page at a time, oldest first. Rate limits are absorbed by
//! [`with_rate_limit_retry`]; every other failure propagates.

use tracing::{debug, trace};

use crate::{
  client::{MessageQuery, MessageSource, RetryConfig, with_rate_limit_retry},
  domain::message::{Message, StreamDescriptor, TopicDescriptor},
  error::{ArchiveError, Result},
};

/// Messages requested per round-trip, as the API docs recommend.
pub const PAGE_SIZE: u32 = 1000;

pub struct Fetcher<'a, C: MessageSource + ?Sized> {
  client: &'a C,
  page_size: u32,
  retry: RetryConfig,
}

impl<'a, C: MessageSource + ?Sized> Fetcher<'a, C> {
  pub fn new(client: &'a C) -> Self {
    Self {
      client,
      page_size: PAGE_SIZE,
      retry: RetryConfig::default(),
    }
  }

  pub fn with_page_size(mut self, page_size: u32) -> Self {
    self.page_size = page_size.max(1);
    self
  }

  pub fn with_retry(mut self, retry: RetryConfig) -> Self {
    self.retry = retry;
    self
  }

  pub async fn streams(&self) -> Result<Vec<StreamDescriptor>> {
    let client = self.client;
    Ok(with_rate_limit_retry(&self.retry, move || client.list_streams()).await?)
  }

  pub async fn topics(&self, stream_id: u64) -> Result<Vec<TopicDescriptor>> {
    let client = self.client;
    Ok(with_rate_limit_retry(&self.retry, move || client.list_topics(stream_id)).await?)
  }

  /// Every message matching `query` with `id >= anchor`, in ascending id order.
  ///
  /// Each page after the first starts one past the last id returned, so no
  /// message is returned twice. The server's `found_newest` flag is trusted
  /// to end the walk.
  pub async fn fetch_all(&self, query: &MessageQuery, anchor: u64) -> Result<Vec<Message>> {
    let client = self.client;
    let page_size = self.page_size;
    let mut anchor = anchor;
    let mut messages: Vec<Message> = Vec::new();
    let mut pages = 0usize;

    loop {
      let page = with_rate_limit_retry(&self.retry, move || client.get_messages(query, anchor, page_size)).await?;
      pages += 1;
      debug!(
        stream = %query.stream,
        topic = ?query.topic,
        anchor,
        returned = page.messages.len(),
        found_newest = page.found_newest,
        "Fetched message page"
      );

      let last_id = page.messages.last().map(|m| m.id);
      messages.extend(page.messages);

      if page.found_newest {
        break;
      }

      let Some(last_id) = last_id else {
        return Err(ArchiveError::Protocol(format!(
          "empty page without found_newest for stream '{}' at anchor {}",
          query.stream, anchor
        )));
      };
      anchor = last_id + 1;
    }

    trace!(stream = %query.stream, pages, total = messages.len(), "Fetch complete");
    Ok(messages)
  }
}
