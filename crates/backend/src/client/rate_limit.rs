// Rate-limit handling for remote calls
//
// The server reports how long to back off; we wait that long plus a fixed
// padding and re-issue the identical request. Retries are unbounded and the
// wait does not grow.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use super::ClientError;

/// Configuration for rate-limit waits
#[derive(Debug, Clone)]
pub struct RetryConfig {
  /// Added on top of the server's `retry-after`
  pub padding: Duration,
}

impl Default for RetryConfig {
  fn default() -> Self {
    Self {
      padding: Duration::from_secs(1),
    }
  }
}

impl RetryConfig {
  pub fn new(padding: Duration) -> Self {
    Self { padding }
  }

  /// Build from the `retry_padding_secs` config value; negative or non-finite values mean no padding.
  pub fn from_secs_f64(padding_secs: f64) -> Self {
    Self::new(Duration::try_from_secs_f64(padding_secs).unwrap_or_default())
  }

  /// How long to sleep for a given `retry-after`
  pub fn wait_for(&self, retry_after: Duration) -> Duration {
    retry_after + self.padding
  }
}

/// Run `op` until it returns anything other than a rate-limit error.
pub async fn with_rate_limit_retry<T, F, Fut>(config: &RetryConfig, mut op: F) -> Result<T, ClientError>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = Result<T, ClientError>>,
{
  let mut attempt: u32 = 0;

  loop {
    match op().await {
      Err(ClientError::RateLimited { retry_after }) => {
        attempt += 1;
        let wait = config.wait_for(retry_after);
        warn!(
          attempt,
          retry_after_ms = retry_after.as_millis(),
          wait_ms = wait.as_millis(),
          "Rate limit hit, waiting before retry"
        );
        sleep(wait).await;
      }
      other => {
        if attempt > 0 && other.is_ok() {
          info!(attempt, "Request succeeded after rate limit wait");
        }
        return other;
      }
    }
  }
}
