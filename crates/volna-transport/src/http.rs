//! Reqwest-backed API client.
//!
//! One [`HttpTransport`] serves both halves of the [`VkTransport`]
//! contract: `call` POSTs API methods with the token and version merged
//! in, `poll` issues the long-running GET against a poll server. Method
//! calls are paced to the platform rate limit; polls are not, since
//! a hanging poll is the normal case.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, Proxy};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

use volna_core::error::{TransportError, TransportResult};
use volna_core::transport::VkTransport;

/// API version sent with every method call unless overridden.
pub const DEFAULT_API_VERSION: &str = "5.199";

const API_BASE: &str = "https://api.vk.com/method";

/// Minimum spacing between method calls with a community token (20 req/s).
const GROUP_CALL_SPACING: Duration = Duration::from_millis(50);
/// Minimum spacing between method calls with a personal token (3 req/s).
const USER_CALL_SPACING: Duration = Duration::from_millis(334);

// =============================================================================
// Builder
// =============================================================================

/// Configures and builds an [`HttpTransport`].
pub struct HttpTransportBuilder {
    token: String,
    version: String,
    user_token: bool,
    timeout: Duration,
    proxy: Option<String>,
}

impl HttpTransportBuilder {
    /// Overrides the API version.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Marks the token as a personal one, which tightens the call pacing.
    pub fn user_token(mut self) -> Self {
        self.user_token = true;
        self
    }

    /// Routes all requests through the given proxy URL.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.proxy = Some(url.into());
        self
    }

    /// Overrides the method-call request timeout.
    ///
    /// Polls carry their own per-request timeout and ignore this value.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builds the transport, validating the proxy URL if one was given.
    pub fn build(self) -> TransportResult<HttpTransport> {
        let mut builder = ClientBuilder::new()
            .connect_timeout(Duration::from_secs(10))
            .timeout(self.timeout);
        if let Some(url) = &self.proxy {
            let proxy = Proxy::all(url)
                .map_err(|e| TransportError::InvalidConfig(format!("proxy `{url}`: {e}")))?;
            builder = builder.proxy(proxy);
        }
        let client = builder
            .build()
            .map_err(|e| TransportError::InvalidConfig(e.to_string()))?;
        Ok(HttpTransport {
            client,
            token: self.token,
            version: self.version,
            spacing: if self.user_token { USER_CALL_SPACING } else { GROUP_CALL_SPACING },
            last_call: Mutex::new(None),
        })
    }
}

// =============================================================================
// Transport
// =============================================================================

/// HTTP implementation of [`VkTransport`].
///
/// ```rust,ignore
/// let transport: BoxedTransport = Arc::new(
///     HttpTransport::builder(token).build()?,
/// );
/// ```
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    token: String,
    version: String,
    spacing: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl HttpTransport {
    /// Starts building a transport around an access token.
    pub fn builder(token: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder {
            token: token.into(),
            version: DEFAULT_API_VERSION.to_string(),
            user_token: false,
            timeout: Duration::from_secs(30),
            proxy: None,
        }
    }

    /// Waits until the pacing interval allows another method call.
    ///
    /// The lock is held through the sleep so concurrent callers queue up
    /// instead of racing past the spacing check.
    async fn pace(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let next_allowed = previous + self.spacing;
            if next_allowed > Instant::now() {
                tokio::time::sleep_until(next_allowed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl VkTransport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> TransportResult<Value> {
        self.pace().await;
        let mut form = form_pairs(&params);
        form.push(("access_token".into(), self.token.clone()));
        form.push(("v".into(), self.version.clone()));

        trace!(method, "calling api method");
        let response = self
            .client
            .post(format!("{API_BASE}/{method}"))
            .form(&form)
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::Request(format!("HTTP {}: {}", status.as_u16(), text)));
        }
        response
            .json()
            .await
            .map_err(|e| TransportError::InvalidBody(e.to_string()))
    }

    async fn poll(&self, url: &str, params: Value, timeout: Duration) -> TransportResult<Value> {
        let query = form_pairs(&params);
        let response = self
            .client
            .get(url)
            .query(&query)
            .timeout(timeout)
            .send()
            .await
            .map_err(request_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TransportError::Request(format!("HTTP {}: {}", status.as_u16(), text)));
        }
        response
            .json()
            .await
            .map_err(|e| TransportError::InvalidBody(e.to_string()))
    }
}

/// Flattens a JSON parameter object into request pairs.
///
/// Strings go out verbatim; everything else keeps its JSON serialization,
/// which is what the API expects for numbers and id lists.
fn form_pairs(params: &Value) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    if let Some(map) = params.as_object() {
        for (key, value) in map {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            pairs.push((key.clone(), rendered));
        }
    }
    pairs
}

fn request_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout(err.to_string())
    } else {
        TransportError::Request(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn string_params_are_not_requoted() {
        let mut pairs = form_pairs(&json!({
            "key": "abc:def",
            "ts": 1700000000i64,
            "message_ids": "1,2,3",
            "updates": [1, 2],
        }));
        pairs.sort();
        assert_eq!(
            pairs,
            vec![
                ("key".to_string(), "abc:def".to_string()),
                ("message_ids".to_string(), "1,2,3".to_string()),
                ("ts".to_string(), "1700000000".to_string()),
                ("updates".to_string(), "[1,2]".to_string()),
            ],
        );
    }

    #[test]
    fn invalid_proxy_is_a_config_error() {
        let err = HttpTransport::builder("tok")
            .proxy("not a proxy url")
            .build()
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidConfig(_)));
    }

    #[test]
    fn token_kind_selects_the_spacing() {
        let group = HttpTransport::builder("tok").build().unwrap();
        assert_eq!(group.spacing, GROUP_CALL_SPACING);

        let user = HttpTransport::builder("tok").user_token().build().unwrap();
        assert_eq!(user.spacing, USER_CALL_SPACING);
    }

    #[tokio::test]
    async fn pacing_spaces_consecutive_calls() {
        let transport = HttpTransport::builder("tok").build().unwrap();
        let start = Instant::now();
        transport.pace().await;
        transport.pace().await;
        assert!(start.elapsed() >= GROUP_CALL_SPACING);
    }
}
