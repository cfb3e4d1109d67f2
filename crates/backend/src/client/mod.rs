//! Remote message API.
//!
//! The sync engine only ever talks to a [`MessageSource`]; [`ZulipClient`] is
//! the HTTP implementation and tests substitute an in-memory one.

mod rate_limit;
mod zulip;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

pub use rate_limit::{RetryConfig, with_rate_limit_retry};
pub use zulip::ZulipClient;

use crate::domain::message::{Message, StreamDescriptor, TopicDescriptor};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
  /// The server asked us to slow down. Not terminal; see [`with_rate_limit_retry`].
  #[error("Rate limited, retry after {retry_after:?}")]
  RateLimited { retry_after: Duration },
  #[error("Request failed: {0}")]
  Http(#[from] reqwest::Error),
  #[error("API error ({code}): {msg}")]
  Api { code: String, msg: String },
  #[error("Invalid request URL: {0}")]
  Url(String),
  #[error("Unexpected response: {0}")]
  Decode(String),
}

/// One term of a message narrow, serialized as the API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NarrowTerm {
  pub operator: &'static str,
  pub operand: String,
}

/// Which messages to list: a whole stream, or one topic within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
  pub stream: String,
  pub topic: Option<String>,
  pub client_gravatar: bool,
  pub apply_markdown: bool,
}

impl MessageQuery {
  pub fn stream(stream: impl Into<String>) -> Self {
    Self {
      stream: stream.into(),
      topic: None,
      client_gravatar: true,
      apply_markdown: true,
    }
  }

  pub fn topic(stream: impl Into<String>, topic: impl Into<String>) -> Self {
    Self {
      topic: Some(topic.into()),
      ..Self::stream(stream)
    }
  }

  pub fn narrow(&self) -> Vec<NarrowTerm> {
    let mut terms = vec![NarrowTerm {
      operator: "stream",
      operand: self.stream.clone(),
    }];
    if let Some(topic) = &self.topic {
      terms.push(NarrowTerm {
        operator: "topic",
        operand: topic.clone(),
      });
    }
    terms
  }
}

/// One page of a message listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MessagePage {
  pub messages: Vec<Message>,
  /// True once the page reaches the newest matching message.
  pub found_newest: bool,
}

#[async_trait]
pub trait MessageSource: Send + Sync {
  /// Public streams visible to the archiving account.
  async fn list_streams(&self) -> Result<Vec<StreamDescriptor>, ClientError>;

  async fn list_topics(&self, stream_id: u64) -> Result<Vec<TopicDescriptor>, ClientError>;

  /// Messages matching `query` with `id >= anchor`, oldest first, at most `page_size`.
  async fn get_messages(&self, query: &MessageQuery, anchor: u64, page_size: u32) -> Result<MessagePage, ClientError>;
}
