//! Shared HTTP plumbing for remote providers: status classification and retry

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{Error, ProviderErrorKind, Result};

/// How a request authenticates
#[derive(Debug, Clone, Copy)]
pub enum Auth<'a> {
    /// No credentials (local services)
    None,
    /// `Authorization: Bearer <token>`
    Bearer(&'a str),
    /// Credentials in a named header
    Header(&'static str, &'a str),
}

/// Map a non-success HTTP status to a provider failure class
pub fn classify_status(status: StatusCode) -> ProviderErrorKind {
    match status {
        StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::RateLimited,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderErrorKind::AuthFailed,
        StatusCode::REQUEST_TIMEOUT => ProviderErrorKind::NetworkFailed,
        s if s.is_server_error() => ProviderErrorKind::NetworkFailed,
        _ => ProviderErrorKind::InvalidResponse,
    }
}

/// Map a reqwest failure to a provider failure class
pub fn classify_transport(err: &reqwest::Error) -> ProviderErrorKind {
    if err.is_decode() {
        ProviderErrorKind::InvalidResponse
    } else if let Some(status) = err.status() {
        classify_status(status)
    } else {
        ProviderErrorKind::NetworkFailed
    }
}

/// JSON-over-HTTP client for one provider, with retry on transient failures
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    provider: &'static str,
    max_retries: u32,
    base_delay: Duration,
}

impl HttpClient {
    /// Create a client with a per-request timeout
    pub fn new(provider: &'static str, timeout_secs: u64, max_retries: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            provider,
            max_retries,
            base_delay: Duration::from_secs(1),
        })
    }

    /// Build a provider error
    pub fn error(&self, kind: ProviderErrorKind, message: impl Into<String>) -> Error {
        Error::provider(self.provider, kind, message)
    }

    /// POST a JSON body and decode a JSON response, retrying transient failures
    pub async fn post_json<Req, Resp>(&self, url: &str, auth: Auth<'_>, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized + Sync,
        Resp: DeserializeOwned,
    {
        with_retries(self.provider, self.max_retries, self.base_delay, || {
            self.post_once(url, auth, body)
        })
        .await
    }

    async fn post_once<Req, Resp>(&self, url: &str, auth: Auth<'_>, body: &Req) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let mut request = self.client.post(url).json(body);
        request = match auth {
            Auth::None => request,
            Auth::Bearer(token) => request.bearer_auth(token),
            Auth::Header(name, value) => request.header(name, value),
        };

        let response = request
            .send()
            .await
            .map_err(|e| self.error(classify_transport(&e), format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.error(
                classify_status(status),
                format!("HTTP {}: {}", status, truncate(&body, 300)),
            ));
        }

        response.json::<Resp>().await.map_err(|e| {
            self.error(
                ProviderErrorKind::InvalidResponse,
                format!("failed to decode response: {}", e),
            )
        })
    }
}

/// Run `operation`, retrying rate-limited and network failures with exponential backoff
pub async fn with_retries<F, Fut, T>(
    provider: &str,
    max_retries: u32,
    base_delay: Duration,
    operation: F,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(Error::Provider { kind, .. }) if kind.is_transient() && attempt < max_retries => {
                let delay = base_delay * 2u32.pow(attempt);
                tracing::warn!(
                    "{} request {} (attempt {}/{}), retrying in {:?}",
                    provider,
                    kind,
                    attempt + 1,
                    max_retries + 1,
                    delay
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::TOO_MANY_REQUESTS), ProviderErrorKind::RateLimited);
        assert_eq!(classify_status(StatusCode::UNAUTHORIZED), ProviderErrorKind::AuthFailed);
        assert_eq!(classify_status(StatusCode::FORBIDDEN), ProviderErrorKind::AuthFailed);
        assert_eq!(classify_status(StatusCode::BAD_GATEWAY), ProviderErrorKind::NetworkFailed);
        assert_eq!(classify_status(StatusCode::SERVICE_UNAVAILABLE), ProviderErrorKind::NetworkFailed);
        assert_eq!(classify_status(StatusCode::BAD_REQUEST), ProviderErrorKind::InvalidResponse);
        assert_eq!(classify_status(StatusCode::NOT_FOUND), ProviderErrorKind::InvalidResponse);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("héllo", 2), "hé");
        assert_eq!(truncate("hi", 10), "hi");
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result = with_retries("test", 2, Duration::ZERO, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(Error::provider("test", ProviderErrorKind::RateLimited, "429"))
            } else {
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retries("test", 1, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::provider("test", ProviderErrorKind::NetworkFailed, "reset"))
        })
        .await;

        assert!(matches!(
            result,
            Err(Error::Provider { kind: ProviderErrorKind::NetworkFailed, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_auth_failure_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = with_retries("test", 3, Duration::ZERO, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::provider("test", ProviderErrorKind::AuthFailed, "401"))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_failure() {
        let client = HttpClient::new("test", 2, 0).unwrap();
        // Port 9 (discard) on localhost is closed in test environments
        let result: Result<serde_json::Value> = client
            .post_json("http://127.0.0.1:9/never", Auth::None, &serde_json::json!({}))
            .await;

        assert!(matches!(
            result,
            Err(Error::Provider { kind: ProviderErrorKind::NetworkFailed, .. })
        ));
    }
}
