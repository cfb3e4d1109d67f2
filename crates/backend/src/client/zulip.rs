use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{StatusCode, Url, header::RETRY_AFTER};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, info, trace, warn};

use super::{ClientError, MessagePage, MessageQuery, MessageSource};
use crate::{
  config::ZulipConfig,
  domain::message::{Message, StreamDescriptor, TopicDescriptor},
  error::{ArchiveError, Result},
};

/// HTTP client for the Zulip REST API.
#[derive(Debug, Clone)]
pub struct ZulipClient {
  client: reqwest::Client,
  /// Always ends with `/api/v1/`
  api_base: Url,
  email: String,
  api_key: String,
}

impl ZulipClient {
  pub fn new(config: &ZulipConfig) -> Result<Self> {
    let site = config
      .site
      .as_deref()
      .ok_or_else(|| ArchiveError::config("Please set zulip.site (or ZULIP_SITE)."))?;
    let email = config
      .email
      .clone()
      .ok_or_else(|| ArchiveError::config("Please set zulip.email (or ZULIP_EMAIL)."))?;
    let api_key = config
      .api_key
      .clone()
      .ok_or_else(|| ArchiveError::config("Please set zulip.api_key (or ZULIP_API_KEY)."))?;

    let api_base = Self::api_base(site)?;
    info!(site = %api_base, email, "Zulip client initialized");

    Ok(Self {
      client: reqwest::Client::new(),
      api_base,
      email,
      api_key,
    })
  }

  fn api_base(site: &str) -> Result<Url> {
    let site = format!("{}/api/v1/", site.trim_end_matches('/'));
    Url::parse(&site).map_err(|e| ArchiveError::config(format!("Invalid zulip.site '{}': {}", site, e)))
  }

  fn endpoint(&self, path: &str, params: &[(&str, String)]) -> std::result::Result<Url, ClientError> {
    let mut url = self.api_base.join(path).map_err(|e| ClientError::Url(e.to_string()))?;
    if !params.is_empty() {
      url.query_pairs_mut().extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())));
    }
    Ok(url)
  }

  async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> std::result::Result<T, ClientError> {
    let url = self.endpoint(path, params)?;
    trace!(path, "Sending request to Zulip");
    let start = Instant::now();

    let response = self
      .client
      .get(url)
      .basic_auth(&self.email, Some(&self.api_key))
      .send()
      .await?;

    let status = response.status();
    let header_retry_after = response
      .headers()
      .get(RETRY_AFTER)
      .and_then(|v| v.to_str().ok())
      .and_then(|s| s.trim().parse::<f64>().ok());
    let body = response.text().await?;

    debug!(
      path,
      status = %status,
      elapsed_ms = start.elapsed().as_millis(),
      bytes = body.len(),
      "Received response from Zulip"
    );

    decode_envelope(status, header_retry_after, &body)
  }
}

/// The `{"result": ..., "msg": ...}` wrapper every endpoint returns.
#[derive(Debug, Deserialize)]
struct Envelope {
  result: String,
  #[serde(default)]
  msg: String,
  #[serde(default)]
  code: Option<String>,
  #[serde(rename = "retry-after", default)]
  retry_after: Option<f64>,
  #[serde(flatten)]
  payload: Map<String, Value>,
}

fn seconds(secs: f64) -> Duration {
  Duration::try_from_secs_f64(secs).unwrap_or_default()
}

/// Turn a raw response into a payload, a rate-limit signal, or an error.
fn decode_envelope<T: DeserializeOwned>(
  status: StatusCode,
  header_retry_after: Option<f64>,
  body: &str,
) -> std::result::Result<T, ClientError> {
  let envelope: Envelope = match serde_json::from_str(body) {
    Ok(envelope) => envelope,
    Err(_) if status == StatusCode::TOO_MANY_REQUESTS => {
      return Err(ClientError::RateLimited {
        retry_after: seconds(header_retry_after.unwrap_or(0.0)),
      });
    }
    Err(e) => return Err(ClientError::Decode(format!("status {}: {}", status, e))),
  };

  if envelope.result == "success" {
    return serde_json::from_value(Value::Object(envelope.payload))
      .map_err(|e| ClientError::Decode(format!("status {}: {}", status, e)));
  }

  let retry_after = envelope.retry_after.or(if status == StatusCode::TOO_MANY_REQUESTS {
    Some(header_retry_after.unwrap_or(0.0))
  } else {
    None
  });
  if let Some(secs) = retry_after {
    return Err(ClientError::RateLimited {
      retry_after: seconds(secs),
    });
  }

  warn!(status = %status, code = ?envelope.code, msg = %envelope.msg, "Zulip API error");
  Err(ClientError::Api {
    code: envelope.code.unwrap_or_else(|| status.as_u16().to_string()),
    msg: envelope.msg,
  })
}

#[derive(Debug, Deserialize)]
struct StreamsResponse {
  streams: Vec<StreamDescriptor>,
}

#[derive(Debug, Deserialize)]
struct TopicsResponse {
  topics: Vec<TopicDescriptor>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
  messages: Vec<Message>,
  #[serde(default)]
  found_newest: bool,
}

#[async_trait]
impl MessageSource for ZulipClient {
  async fn list_streams(&self) -> std::result::Result<Vec<StreamDescriptor>, ClientError> {
    // Public streams only, whether or not the bot is subscribed.
    let params = [
      ("include_public", "true".to_string()),
      ("include_subscribed", "false".to_string()),
    ];
    let response: StreamsResponse = self.get("streams", &params).await?;
    Ok(response.streams)
  }

  async fn list_topics(&self, stream_id: u64) -> std::result::Result<Vec<TopicDescriptor>, ClientError> {
    let response: TopicsResponse = self.get(&format!("users/me/{}/topics", stream_id), &[]).await?;
    Ok(response.topics)
  }

  async fn get_messages(
    &self,
    query: &MessageQuery,
    anchor: u64,
    page_size: u32,
  ) -> std::result::Result<MessagePage, ClientError> {
    let narrow = serde_json::to_string(&query.narrow()).map_err(|e| ClientError::Decode(e.to_string()))?;
    let params = [
      ("anchor", anchor.to_string()),
      ("num_before", "0".to_string()),
      ("num_after", page_size.to_string()),
      ("narrow", narrow),
      ("client_gravatar", query.client_gravatar.to_string()),
      ("apply_markdown", query.apply_markdown.to_string()),
    ];
    let response: MessagesResponse = self.get("messages", &params).await?;
    Ok(MessagePage {
      messages: response.messages,
      found_newest: response.found_newest,
    })
  }
}
