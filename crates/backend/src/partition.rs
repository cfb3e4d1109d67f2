use std::collections::BTreeMap;

use crate::domain::message::Message;

/// Group a stream-wide fetch by topic, keeping each topic's messages in fetch order.
pub fn partition_by_topic(messages: Vec<Message>) -> BTreeMap<String, Vec<Message>> {
  let mut topics: BTreeMap<String, Vec<Message>> = BTreeMap::new();
  for message in messages {
    topics.entry(message.subject.clone()).or_default().push(message);
  }
  topics
}
