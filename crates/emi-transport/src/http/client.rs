//! Command client with bounded retry.

use std::time::Duration;

use rand::Rng;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

use emi_core::model::{Command, HttpResult};
use emi_core::{
    CommandClientConfig, CommandError, CommandResult, RetryPolicy, TransportError,
    TransportResult,
};

const EMPTY_BODY: &[u8] = b"{}";

/// Issues request/response commands against the gateway API.
///
/// Every call posts a JSON body to `{api_url}/{endpoint}` and unwraps the
/// [`HttpResult`] envelope of the answer. Failed attempts (network errors,
/// non-2xx status, undecodable responses) are retried per the configured
/// [`RetryPolicy`]; callers must only issue commands that are safe to
/// repeat, or use [`RetryPolicy::none`].
///
/// The client is cheap to clone and safe to share between tasks.
#[derive(Debug, Clone)]
pub struct CommandClient {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
    retry: RetryPolicy,
}

impl CommandClient {
    /// Creates a client from its configuration.
    pub fn new(config: CommandClientConfig) -> TransportResult<Self> {
        let base_url = parse_base_url(&config.api_url)?;
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .build()
            .map_err(|e| TransportError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            access_token: config.access_token,
            retry: config.retry,
        })
    }

    /// Returns a copy of this client using a different retry policy.
    pub fn with_retry(&self, retry: RetryPolicy) -> Self {
        Self {
            retry,
            ..self.clone()
        }
    }

    /// Returns the active retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Returns the normalized base address.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins an endpoint path onto the base address.
    pub fn endpoint_url(&self, endpoint: &str) -> CommandResult<Url> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| CommandError::InvalidEndpoint {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    /// Calls `endpoint` and decodes the envelope's `data` into `Resp`.
    ///
    /// `request` is serialized once up front; `None` sends `{}`. A `204`
    /// answer or an absent `data` field yields `Resp::default()`.
    ///
    /// `cancel` covers both the network round trip and the wait between
    /// attempts; once it fires the call returns [`CommandError::Cancelled`].
    pub async fn call<Req, Resp>(
        &self,
        cancel: &CancellationToken,
        endpoint: &str,
        request: Option<&Req>,
    ) -> CommandResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned + Default,
    {
        self.execute(cancel, endpoint, request, decode_payload::<Resp>)
            .await
    }

    /// Calls `endpoint` without decoding the result payload.
    pub async fn send<Req>(
        &self,
        cancel: &CancellationToken,
        endpoint: &str,
        request: Option<&Req>,
    ) -> CommandResult<()>
    where
        Req: Serialize + ?Sized,
    {
        self.execute(cancel, endpoint, request, |_| Ok(())).await
    }

    /// Calls a catalogued command. See [`call`](Self::call).
    pub async fn call_command<Req, Resp>(
        &self,
        cancel: &CancellationToken,
        command: Command,
        request: Option<&Req>,
    ) -> CommandResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned + Default,
    {
        self.call(cancel, command.as_str(), request).await
    }

    async fn execute<Req, T>(
        &self,
        cancel: &CancellationToken,
        endpoint: &str,
        request: Option<&Req>,
        finish: fn(Option<HttpResult>) -> CommandResult<T>,
    ) -> CommandResult<T>
    where
        Req: Serialize + ?Sized,
    {
        let url = self.endpoint_url(endpoint)?;
        let body = match request {
            Some(request) => {
                serde_json::to_vec(request).map_err(|e| CommandError::Serialize(e.to_string()))?
            }
            None => EMPTY_BODY.to_vec(),
        };

        let max_attempts = self.retry.max_attempts();
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CommandError::Cancelled),
                outcome = self.attempt(&url, endpoint, &body) => outcome.and_then(finish),
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(e) => e,
            };

            if attempt >= max_attempts {
                error!(endpoint, attempts = attempt, error = %err, "Command failed, giving up");
                return Err(CommandError::MaxRetriesExceeded {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            let delay = self.retry.delay(attempt, self.jitter());
            debug!(endpoint, attempt, delay = ?delay, error = %err, "Command attempt failed, retrying");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CommandError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Performs one attempt. `None` means the gateway sent no content.
    async fn attempt(
        &self,
        url: &Url,
        endpoint: &str,
        body: &[u8],
    ) -> CommandResult<Option<HttpResult>> {
        let mut req = self
            .client
            .post(url.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body.to_vec());
        if let Some(token) = &self.access_token {
            req = req.bearer_auth(token);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| CommandError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CommandError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if status == StatusCode::NO_CONTENT {
            trace!(endpoint, "Command returned no content");
            return Ok(None);
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| CommandError::Request(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(None);
        }

        let result: HttpResult =
            serde_json::from_slice(&bytes).map_err(|e| CommandError::Decode(e.to_string()))?;
        if !result.is_ok() {
            warn!(
                endpoint,
                retcode = result.code,
                status = %result.status,
                message = result.message.as_deref().unwrap_or(""),
                "Gateway reported a failed command"
            );
        }
        Ok(Some(result))
    }

    fn jitter(&self) -> Duration {
        let max = u64::try_from(self.retry.max_jitter.as_nanos()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::rng().random_range(0..max))
    }
}

fn decode_payload<Resp>(result: Option<HttpResult>) -> CommandResult<Resp>
where
    Resp: DeserializeOwned + Default,
{
    match result.and_then(|r| r.data) {
        Some(data) if data.get() != "null" => {
            serde_json::from_str(data.get()).map_err(|e| CommandError::Decode(e.to_string()))
        }
        _ => Ok(Resp::default()),
    }
}

/// Parses the base address so that relative joins append to its path.
fn parse_base_url(api_url: &str) -> TransportResult<Url> {
    let mut url = Url::parse(api_url)
        .map_err(|e| TransportError::InvalidConfig(format!("invalid API URL '{api_url}': {e}")))?;
    if url.cannot_be_a_base() {
        return Err(TransportError::InvalidConfig(format!(
            "API URL '{api_url}' cannot be a base"
        )));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Instant;

    use serde::Deserialize;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct LoginInfo {
        id: i64,
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            max_jitter: Duration::ZERO,
        }
    }

    fn client(server: &MockServer, retry: RetryPolicy) -> CommandClient {
        CommandClient::new(
            CommandClientConfig::new(format!("{}/api", server.uri())).with_retry(retry),
        )
        .unwrap()
    }

    fn ok(data: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "status": "ok",
            "retcode": 0,
            "data": data,
        }))
    }

    #[test]
    fn test_endpoint_join() {
        for base in ["http://localhost:3000/api", "http://localhost:3000/api/"] {
            let client = CommandClient::new(CommandClientConfig::new(base)).unwrap();
            for endpoint in ["get_login_info", "/get_login_info"] {
                assert_eq!(
                    client.endpoint_url(endpoint).unwrap().as_str(),
                    "http://localhost:3000/api/get_login_info"
                );
            }
        }
    }

    #[test]
    fn test_invalid_base_url() {
        let err = CommandClient::new(CommandClientConfig::new("not a url")).unwrap_err();
        assert!(matches!(err, TransportError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_call_decodes_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/get_login_info"))
            .and(body_json(json!({})))
            .respond_with(ok(json!({ "id": 123 })))
            .expect(1)
            .mount(&server)
            .await;

        let info: LoginInfo = client(&server, fast_retry(0))
            .call(&CancellationToken::new(), "get_login_info", None::<&()>)
            .await
            .unwrap();
        assert_eq!(info.id, 123);
    }

    #[tokio::test]
    async fn test_bearer_token_is_attached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret"))
            .respond_with(ok(json!({ "id": 1 })))
            .expect(1)
            .mount(&server)
            .await;

        let client = CommandClient::new(
            CommandClientConfig::new(server.uri())
                .with_access_token("secret")
                .with_retry(fast_retry(0)),
        )
        .unwrap();

        let info: LoginInfo = client
            .call(&CancellationToken::new(), "get_login_info", None::<&()>)
            .await
            .unwrap();
        assert_eq!(info.id, 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ok(json!({ "id": 7 })))
            .expect(1)
            .mount(&server)
            .await;

        let info: LoginInfo = client(&server, fast_retry(5))
            .call(&CancellationToken::new(), "get_login_info", None::<&()>)
            .await
            .unwrap();
        assert_eq!(info.id, 7);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries_plus_one() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(4)
            .mount(&server)
            .await;

        let err = client(&server, fast_retry(3))
            .call::<_, LoginInfo>(&CancellationToken::new(), "get_login_info", None::<&()>)
            .await
            .unwrap_err();

        match err {
            CommandError::MaxRetriesExceeded { attempts, last } => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, CommandError::Status { status: 500, ref body } if body == "boom"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_jitter_stays_below_max() {
        let retry = RetryPolicy {
            max_jitter: Duration::from_millis(10),
            ..RetryPolicy::default()
        };
        let client = CommandClient::new(
            CommandClientConfig::new("http://localhost/api").with_retry(retry),
        )
        .unwrap();
        for _ in 0..1000 {
            assert!(client.jitter() < Duration::from_millis(10));
        }

        let client = client.with_retry(RetryPolicy {
            max_jitter: Duration::ZERO,
            ..retry
        });
        assert_eq!(client.jitter(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retry_waits_backoff_plus_jitter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(4)
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(10),
            max_jitter: Duration::from_millis(100),
        };
        let backoff = Duration::from_millis(50 + 100 + 200);
        let jitter = retry.max_jitter * 3;

        let started = Instant::now();
        let err = client(&server, retry)
            .send(&CancellationToken::new(), "set_bio", None::<&()>)
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, CommandError::MaxRetriesExceeded { attempts: 4, .. }));
        assert!(elapsed >= backoff, "waited {elapsed:?}");
        // Loopback round trips get a generous allowance on top of the jitter.
        assert!(
            elapsed < backoff + jitter + Duration::from_millis(500),
            "waited {elapsed:?}"
        );
    }

    #[tokio::test]
    async fn test_cancel_during_backoff() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let retry = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_secs(30),
            max_delay: Duration::from_secs(30),
            max_jitter: Duration::ZERO,
        };
        let client = client(&server, retry);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            client.call::<_, LoginInfo>(&cancel, "get_login_info", None::<&()>),
        )
        .await
        .unwrap();
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_no_content_and_null_data_yield_default() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/set_bio"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/set_nickname"))
            .respond_with(ok(serde_json::Value::Null))
            .mount(&server)
            .await;

        let client = client(&server, fast_retry(0));
        let cancel = CancellationToken::new();

        let a: LoginInfo = client.call(&cancel, "set_bio", None::<&()>).await.unwrap();
        let b: LoginInfo = client.call(&cancel, "set_nickname", None::<&()>).await.unwrap();
        assert_eq!(a.id, 0);
        assert_eq!(b.id, 0);
    }

    #[tokio::test]
    async fn test_nonzero_retcode_still_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "failed",
                "retcode": 10,
                "data": { "id": 5 },
            })))
            .expect(1)
            .mount(&server)
            .await;

        let info: LoginInfo = client(&server, fast_retry(3))
            .call(&CancellationToken::new(), "get_login_info", None::<&()>)
            .await
            .unwrap();
        assert_eq!(info.id, 5);
    }

    #[tokio::test]
    async fn test_undecodable_payload_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ok(json!({ "id": "not a number" })))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server, fast_retry(1))
            .call::<_, LoginInfo>(&CancellationToken::new(), "get_login_info", None::<&()>)
            .await
            .unwrap_err();
        match err {
            CommandError::MaxRetriesExceeded { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, CommandError::Decode(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_serialize_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ok(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let mut bad = HashMap::new();
        bad.insert((1u8, 2u8), 3u8);

        let err = client(&server, fast_retry(3))
            .send(&CancellationToken::new(), "set_bio", Some(&bad))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Serialize(_)));
    }

    #[tokio::test]
    async fn test_send_posts_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/set_bio"))
            .and(body_json(json!({ "new_bio": "hello" })))
            .respond_with(ok(serde_json::Value::Null))
            .expect(1)
            .mount(&server)
            .await;

        client(&server, fast_retry(0))
            .send(
                &CancellationToken::new(),
                "set_bio",
                Some(&json!({ "new_bio": "hello" })),
            )
            .await
            .unwrap();
    }
}
