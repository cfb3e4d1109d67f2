use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message as returned by the remote service.
///
/// Only the fields the engine reasons about are typed; everything else
/// (sender, content, reactions, ...) rides along in `extra` and is written
/// back out untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
  pub id: u64,
  /// Topic name. The remote API still calls it `subject`.
  pub subject: String,
  /// Epoch seconds.
  pub timestamp: i64,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

impl Message {
  pub fn new(id: u64, subject: impl Into<String>, timestamp: i64) -> Self {
    Self {
      id,
      subject: subject.into(),
      timestamp,
      extra: Map::new(),
    }
  }

  pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.extra.insert(key.into(), value.into());
    self
  }
}

/// A stream as listed by the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
  pub stream_id: u64,
  pub name: String,
}

impl StreamDescriptor {
  pub fn new(stream_id: u64, name: impl Into<String>) -> Self {
    Self {
      stream_id,
      name: name.into(),
    }
  }
}

/// A topic as listed for one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDescriptor {
  pub name: String,
  /// Id of the newest message in the topic, when the server reports it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_id: Option<u64>,
}

impl TopicDescriptor {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      max_id: None,
    }
  }
}
