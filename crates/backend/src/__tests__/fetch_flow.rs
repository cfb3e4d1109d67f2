//! Integration tests for paginated fetching against an in-memory source.

#[cfg(test)]
mod tests {
  use std::time::Duration;

  use async_trait::async_trait;
  use pretty_assertions::assert_eq;

  use crate::{
    __tests__::helpers::{Call, MockSource},
    client::{ClientError, MessagePage, MessageQuery, MessageSource, RetryConfig},
    error::ArchiveError,
    fetch::Fetcher,
    message::{StreamDescriptor, TopicDescriptor},
  };

  fn source_with(ids: impl IntoIterator<Item = u64>) -> MockSource {
    let source = MockSource::new();
    source.add_stream(1, "general");
    for id in ids {
      source.post("general", id, if id % 2 == 0 { "even" } else { "odd" });
    }
    source
  }

  fn fetcher(source: &MockSource) -> Fetcher<'_, MockSource> {
    Fetcher::new(source)
      .with_page_size(3)
      .with_retry(RetryConfig::new(Duration::ZERO))
  }

  fn ids(messages: &[crate::message::Message]) -> Vec<u64> {
    messages.iter().map(|m| m.id).collect()
  }

  #[tokio::test]
  async fn test_fetch_all_walks_every_page() {
    let source = source_with(1..=10);

    let messages = fetcher(&source)
      .fetch_all(&MessageQuery::stream("general"), 0)
      .await
      .unwrap();

    assert_eq!(ids(&messages), (1..=10).collect::<Vec<_>>());
    assert_eq!(source.message_anchors(), vec![0, 4, 7, 10]);
  }

  #[tokio::test]
  async fn test_fetch_all_stops_on_exact_final_page() {
    let source = source_with(1..=9);

    let messages = fetcher(&source)
      .fetch_all(&MessageQuery::stream("general"), 0)
      .await
      .unwrap();

    assert_eq!(messages.len(), 9);
    // The third page already contains the newest message.
    assert_eq!(source.message_anchors(), vec![0, 4, 7]);
  }

  #[tokio::test]
  async fn test_fetch_all_from_anchor_with_sparse_ids() {
    let source = source_with([2, 5, 11, 12, 40, 41, 97]);

    let messages = fetcher(&source)
      .fetch_all(&MessageQuery::stream("general"), 12)
      .await
      .unwrap();

    assert_eq!(ids(&messages), vec![12, 40, 41, 97]);
    assert_eq!(source.message_anchors(), vec![12, 42]);
  }

  #[tokio::test]
  async fn test_fetch_all_narrows_to_topic() {
    let source = source_with(1..=10);

    let messages = fetcher(&source)
      .fetch_all(&MessageQuery::topic("general", "even"), 0)
      .await
      .unwrap();

    assert_eq!(ids(&messages), vec![2, 4, 6, 8, 10]);
    assert!(messages.iter().all(|m| m.subject == "even"));
  }

  #[tokio::test]
  async fn test_fetch_all_with_nothing_new() {
    let source = source_with(1..=4);

    let messages = fetcher(&source)
      .fetch_all(&MessageQuery::stream("general"), 5)
      .await
      .unwrap();

    assert!(messages.is_empty());
    assert_eq!(source.message_anchors(), vec![5]);
  }

  #[tokio::test]
  async fn test_rate_limits_do_not_change_result() {
    let clean = source_with(1..=10);
    let expected = fetcher(&clean)
      .fetch_all(&MessageQuery::stream("general"), 0)
      .await
      .unwrap();

    let limited = source_with(1..=10);
    limited.rate_limit_next(3);
    let messages = fetcher(&limited)
      .fetch_all(&MessageQuery::stream("general"), 0)
      .await
      .unwrap();

    assert_eq!(messages, expected);
    // Three rejected attempts at anchor 0, then the normal walk.
    assert_eq!(limited.message_anchors(), vec![0, 0, 0, 0, 4, 7, 10]);
  }

  #[tokio::test]
  async fn test_listing_retries_rate_limits() {
    let source = source_with(1..=2);
    source.rate_limit_next(2);

    let streams = fetcher(&source).streams().await.unwrap();

    assert_eq!(streams, vec![StreamDescriptor::new(1, "general")]);
    assert_eq!(source.calls(), vec![Call::ListStreams; 3]);
  }

  #[tokio::test]
  async fn test_api_errors_propagate() {
    let source = source_with(1..=2);

    let err = fetcher(&source)
      .fetch_all(&MessageQuery::stream("nowhere"), 0)
      .await
      .unwrap_err();

    assert!(matches!(err, ArchiveError::Client(ClientError::Api { .. })));
  }

  /// Answers every request with an empty, unfinished page.
  struct StuckSource;

  #[async_trait]
  impl MessageSource for StuckSource {
    async fn list_streams(&self) -> Result<Vec<StreamDescriptor>, ClientError> {
      Ok(Vec::new())
    }

    async fn list_topics(&self, _stream_id: u64) -> Result<Vec<TopicDescriptor>, ClientError> {
      Ok(Vec::new())
    }

    async fn get_messages(&self, _query: &MessageQuery, _anchor: u64, _page_size: u32) -> Result<MessagePage, ClientError> {
      Ok(MessagePage {
        messages: Vec::new(),
        found_newest: false,
      })
    }
  }

  #[tokio::test]
  async fn test_empty_unfinished_page_is_protocol_error() {
    let err = Fetcher::new(&StuckSource)
      .fetch_all(&MessageQuery::stream("general"), 0)
      .await
      .unwrap_err();

    assert!(matches!(err, ArchiveError::Protocol(_)));
    assert!(err.to_string().contains("general"));
  }
}
