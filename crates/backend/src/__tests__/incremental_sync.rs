//! Integration tests for incremental updates on top of a full rebuild.

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use crate::{
    __tests__::helpers::{MockSource, TestContext},
    error::ArchiveError,
    message::{Message, StreamDescriptor},
    store::{StreamIndex, TopicSummary},
    sync::{SyncMode, SyncReport},
  };

  fn workspace() -> MockSource {
    let source = MockSource::new();
    source.add_stream(1, "general").add_stream(2, "design team");
    for (id, topic) in [(1, "lunch"), (2, "deploys"), (3, "lunch"), (4, "lunch"), (5, "deploys"), (6, "lunch"), (7, "lunch")] {
      source.post("general", id, topic);
    }
    source.post("design team", 8, "logo").post("design team", 9, "logo");
    source
  }

  /// Workspace already archived by a full run, with the call log cleared.
  async fn archived(ctx: &TestContext) -> MockSource {
    let source = workspace();
    ctx.archiver(&source, &[]).run(SyncMode::Full).await.unwrap();
    source.clear_calls();
    source
  }

  #[tokio::test]
  async fn test_missing_index_fails_before_remote_calls() {
    let ctx = TestContext::new();
    let source = workspace();

    let err = ctx
      .archiver(&source, &[])
      .run(SyncMode::Incremental)
      .await
      .unwrap_err();

    assert!(matches!(err, ArchiveError::MissingIndex { .. }));
    assert!(source.calls().is_empty());
  }

  #[tokio::test]
  async fn test_new_message_converges() {
    let ctx = TestContext::new();
    let source = archived(&ctx).await;
    source.post("general", 10, "lunch");

    let report = ctx
      .archiver(&source, &[])
      .run(SyncMode::Incremental)
      .await
      .unwrap();

    assert_eq!(
      report,
      SyncReport {
        streams: 2,
        topics: 1,
        messages: 1,
      }
    );
    // Each stream resumes one past its cursor.
    assert_eq!(source.message_anchors(), vec![8, 10]);
    assert_eq!(ctx.topic_ids(1, "general", "lunch"), vec![1, 3, 4, 6, 7, 10]);

    let index = StreamIndex::load(&ctx.store).unwrap();
    let general = index.stream("general").unwrap();
    assert_eq!(general.latest_id, 10);
    assert_eq!(general.topic_data["lunch"], TopicSummary { size: 6, latest_date: 100 });
    assert_eq!(general.topic_data["deploys"], TopicSummary { size: 2, latest_date: 50 });
    assert_eq!(index.stream("design team").unwrap().latest_id, 9);
  }

  #[tokio::test]
  async fn test_nothing_new_leaves_topics_alone() {
    let ctx = TestContext::new();
    let source = archived(&ctx).await;
    let before = StreamIndex::load(&ctx.store).unwrap();
    let lunch = ctx.topic_bytes(1, "general", "lunch");

    let report = ctx
      .archiver(&source, &[])
      .run(SyncMode::Incremental)
      .await
      .unwrap();

    assert_eq!(report.messages, 0);
    assert_eq!(report.topics, 0);
    assert_eq!(StreamIndex::load(&ctx.store).unwrap().streams, before.streams);
    assert_eq!(ctx.topic_bytes(1, "general", "lunch"), lunch);
  }

  #[tokio::test]
  async fn test_new_topic_and_new_stream() {
    let ctx = TestContext::new();
    let source = archived(&ctx).await;
    source.post("general", 10, "standup");
    source.add_stream(3, "random").post("random", 11, "cats");

    ctx
      .archiver(&source, &[])
      .run(SyncMode::Incremental)
      .await
      .unwrap();

    assert_eq!(ctx.topic_ids(1, "general", "standup"), vec![10]);
    assert_eq!(ctx.topic_ids(3, "random", "cats"), vec![11]);

    let index = StreamIndex::load(&ctx.store).unwrap();
    let random = index.stream("random").unwrap();
    assert_eq!(random.id, 3);
    assert_eq!(random.latest_id, 11);
    assert_eq!(random.topic_data["cats"], TopicSummary { size: 1, latest_date: 110 });
    assert_eq!(index.stream("general").unwrap().topic_data.len(), 3);
    // An unseen stream starts from a zero cursor.
    assert!(source.message_anchors().contains(&1));
  }

  #[tokio::test]
  async fn test_rerun_after_crash_does_not_duplicate() {
    let ctx = TestContext::new();
    let source = archived(&ctx).await;
    source.post("general", 10, "lunch").post("general", 11, "deploys");

    // A previous run wrote the lunch topic and died before saving the index.
    let lunch = ctx.store.topic(&StreamDescriptor::new(1, "general"), "lunch");
    let old = lunch.load().unwrap();
    lunch
      .merge_and_save(old, vec![Message::new(10, "lunch", 100)])
      .unwrap();

    ctx
      .archiver(&source, &[])
      .run(SyncMode::Incremental)
      .await
      .unwrap();

    assert_eq!(ctx.topic_ids(1, "general", "lunch"), vec![1, 3, 4, 6, 7, 10]);
    assert_eq!(ctx.topic_ids(1, "general", "deploys"), vec![2, 5, 11]);

    let index = StreamIndex::load(&ctx.store).unwrap();
    let general = index.stream("general").unwrap();
    assert_eq!(general.topic_data["lunch"].size, 6);
    assert_eq!(general.topic_data["deploys"].size, 3);
    assert_eq!(general.latest_id, 11);
  }

  #[tokio::test]
  async fn test_excluded_stream_keeps_its_entry() {
    let ctx = TestContext::new();
    let source = archived(&ctx).await;
    source.post("design team", 10, "logo");

    ctx
      .archiver(&source, &["design team"])
      .run(SyncMode::Incremental)
      .await
      .unwrap();

    assert!(!source.queried_streams().contains("design team"));
    let index = StreamIndex::load(&ctx.store).unwrap();
    assert_eq!(index.stream("design team").unwrap().latest_id, 9);
    assert_eq!(ctx.topic_ids(2, "design team", "logo"), vec![8, 9]);
  }

  #[tokio::test]
  async fn test_incremental_survives_rate_limits() {
    let ctx = TestContext::new();
    let source = archived(&ctx).await;
    source.post("general", 10, "lunch").post("general", 11, "lunch");
    source.post("general", 12, "lunch").post("general", 13, "deploys");
    source.rate_limit_next(4);

    let report = ctx
      .archiver(&source, &[])
      .run(SyncMode::Incremental)
      .await
      .unwrap();

    assert_eq!(report.messages, 4);
    assert_eq!(ctx.topic_ids(1, "general", "lunch"), vec![1, 3, 4, 6, 7, 10, 11, 12]);
    assert_eq!(ctx.topic_ids(1, "general", "deploys"), vec![2, 5, 13]);
    assert_eq!(StreamIndex::load(&ctx.store).unwrap().stream("general").unwrap().latest_id, 13);
  }
}
