//! JSON-over-HTTP client shared by the aggregator and LLM crates.
//!
//! - Per-request options: headers, [`Auth`], timeout, retry override
//! - Bounded retry of 429/5xx/transport failures with exponential backoff,
//!   `Retry-After` support, and a floor on rate-limit delays
//! - A spent retry budget on 429 surfaces as [`HttpError::RateLimited`]
//!   rather than looping forever
//! - Logs never include credential values; raw request/response logging is
//!   opt-in via `THREADLINE_HTTP_RAW=1` (target `http.raw`)

use std::env;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::time::sleep;

const RAW_ENV: &str = "THREADLINE_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024;
const SNIPPET_MAX: usize = 500;

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(0);

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("rate limited, retries exhausted after {attempts} attempts")]
    RateLimited { attempts: usize },
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        message: String,
        request_id: String,
    },
}

/// Authentication strategies supported by the client.
#[derive(Clone, Debug)]
pub enum Auth<'a> {
    /// `Authorization: Bearer <token>`
    Bearer(&'a str),
    /// Custom header, e.g. an aggregator token passed verbatim in
    /// `Authorization` without a scheme prefix.
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    None,
}

/// Per-request tuning knobs.
#[derive(Clone, Debug, Default)]
pub struct RequestOpts<'a> {
    pub timeout: Option<Duration>,
    pub retry: Option<RetryPolicy>,
    pub auth: Option<Auth<'a>>,
    pub headers: Option<HeaderMap>,
}

/// Bounded retry behavior for transient failures.
///
/// `max_retries` counts retries, not attempts: a request may be sent at most
/// `max_retries + 1` times. Delays grow as `base_delay * 2^n`, with 429
/// responses never retried sooner than `rate_limit_floor` unless the server
/// sent a `Retry-After` header.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub rate_limit_floor: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
            rate_limit_floor: Duration::from_millis(1100),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, retry_no: usize, status: Option<StatusCode>, headers: &HeaderMap) -> Duration {
        if let Some(secs) = retry_after_secs(headers) {
            return Duration::from_secs(secs);
        }
        let shift = retry_no.saturating_sub(1).min(16) as u32;
        let exp = self.base_delay.saturating_mul(1u32 << shift);
        if status == Some(StatusCode::TOO_MANY_REQUESTS) {
            exp.max(self.rate_limit_floor)
        } else {
            exp
        }
    }
}

#[derive(Clone)]
pub struct HttpClient {
    base: Url,
    inner: Client,
    pub default_timeout: Duration,
    pub retry: RetryPolicy,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        let inner = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self {
            base,
            inner,
            default_timeout: Duration::from_secs(15),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_timeout(mut self, dur: Duration) -> Self {
        self.default_timeout = dur;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// POST JSON with optional Bearer auth.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let opts = RequestOpts {
            auth: bearer.map(Auth::Bearer),
            ..Default::default()
        };
        self.request_json(Method::POST, path, Some(body), opts).await
    }

    /// GET JSON with per-request options.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts<'_>) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json::<(), T>(Method::GET, path, None, opts)
            .await
    }

    /// POST JSON with per-request options (headers/auth/timeout/retry).
    pub async fn post_json_opts<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, Some(body), opts).await
    }

    async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts<'_>,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self
            .base
            .join(path)
            .map_err(|e| HttpError::Url(e.to_string()))?;

        let retry = opts.retry.unwrap_or(self.retry);
        let timeout = opts.timeout.unwrap_or(self.default_timeout);

        let body_bytes = match body {
            Some(b) => {
                Some(serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?)
            }
            None => None,
        };

        let req_id = format!("r{}", REQUEST_SEQ.fetch_add(1, Ordering::Relaxed));
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            let mut rb = self
                .inner
                .request(method.clone(), url.clone())
                .timeout(timeout);

            if let Some(bytes) = &body_bytes {
                rb = rb
                    .header(reqwest::header::CONTENT_TYPE, "application/json")
                    .body(bytes.clone());
            }

            if let Some(hdrs) = &opts.headers {
                rb = rb.headers(hdrs.clone());
            }

            let auth_kind = match &opts.auth {
                Some(Auth::Bearer(tok)) => {
                    let tok = sanitize_api_key(tok)?;
                    rb = rb.bearer_auth(tok);
                    "bearer"
                }
                Some(Auth::Header { name, value }) => {
                    rb = rb.header(name, value);
                    "header"
                }
                Some(Auth::None) | None => "none",
            };

            tracing::debug!(
                req_id = %req_id,
                attempt,
                max_retries = retry.max_retries,
                method = %method,
                host_path = %format!("{}{}", url.domain().unwrap_or("-"), url.path()),
                timeout_ms = timeout.as_millis() as u64,
                auth_kind,
                has_body = body_bytes.is_some(),
                "http.request.start"
            );

            if raw_enabled() {
                let body_text = body_bytes
                    .as_deref()
                    .map(|b| String::from_utf8_lossy(&b[..b.len().min(RAW_MAX_BODY)]).into_owned())
                    .unwrap_or_default();
                tracing::debug!(target: "http.raw", %req_id, %method, url = %url, body = %body_text, "request");
            }

            let started = std::time::Instant::now();
            let sent = rb.send().await;

            let (status, headers, bytes) = match read_response(sent).await {
                Ok(parts) => parts,
                Err(message) => {
                    if attempt <= retry.max_retries {
                        let delay = retry.delay_for(attempt, None, &HeaderMap::new());
                        tracing::warn!(
                            req_id = %req_id,
                            attempt,
                            backoff_ms = delay.as_millis() as u64,
                            message = %message,
                            "http.retrying.network"
                        );
                        sleep(delay).await;
                        continue;
                    }
                    tracing::warn!(req_id = %req_id, attempt, message = %message, "http.network_error");
                    return Err(HttpError::Network(message));
                }
            };

            let duration_ms = started.elapsed().as_millis() as u64;
            let request_id = headers
                .get("x-request-id")
                .or_else(|| headers.get("x-correlation-id"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-")
                .to_string();

            tracing::debug!(
                req_id = %req_id,
                %status,
                duration_ms,
                body_len = bytes.len(),
                upstream_request_id = %request_id,
                "http.response"
            );

            if raw_enabled() {
                let cut = bytes.len().min(RAW_MAX_BODY);
                tracing::info!(
                    target: "http.raw",
                    %req_id,
                    %status,
                    duration_ms,
                    headers = ?redact_headers(&headers),
                    body = %String::from_utf8_lossy(&bytes[..cut]),
                    truncated = cut < bytes.len(),
                );
            }

            let snippet = snip_body(&bytes);

            if status.is_success() {
                return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                    tracing::warn!(
                        req_id = %req_id,
                        serde_err = %e,
                        body_snippet = %snippet,
                        "http.response.decode_error"
                    );
                    HttpError::Decode(e.to_string(), snippet)
                });
            }

            let is_rate_limited = status == StatusCode::TOO_MANY_REQUESTS;
            if (is_rate_limited || status.is_server_error()) && attempt <= retry.max_retries {
                let delay = retry.delay_for(attempt, Some(status), &headers);
                tracing::warn!(
                    req_id = %req_id,
                    %status,
                    attempt,
                    max_retries = retry.max_retries,
                    backoff_ms = delay.as_millis() as u64,
                    retry_after_secs = ?retry_after_secs(&headers),
                    body_snippet = %snippet,
                    "http.retrying"
                );
                sleep(delay).await;
                continue;
            }

            if is_rate_limited {
                tracing::warn!(req_id = %req_id, attempt, "http.rate_limited.exhausted");
                return Err(HttpError::RateLimited { attempts: attempt });
            }

            let message = extract_error_message(&bytes, &snippet);
            tracing::warn!(
                req_id = %req_id,
                %status,
                message = %message,
                upstream_request_id = %request_id,
                "http.error"
            );
            return Err(HttpError::Api {
                status,
                message,
                request_id,
            });
        }
    }
}

async fn read_response(
    sent: Result<reqwest::Response, reqwest::Error>,
) -> Result<(StatusCode, HeaderMap, Vec<u8>), String> {
    let resp = sent.map_err(|e| e.to_string())?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = resp.bytes().await.map_err(|e| e.to_string())?;
    Ok((status, headers, bytes.to_vec()))
}

/// Pull a human-readable message out of common error envelopes.
fn extract_error_message(body: &[u8], fallback: &str) -> String {
    let Ok(v) = serde_json::from_slice::<serde_json::Value>(body) else {
        return fallback.to_string();
    };

    // OpenAI style: {"error": {"message": "..."}}
    if let Some(msg) = v
        .get("error")
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
    {
        return msg.to_string();
    }

    // Generic: {"message": "..."} / {"detail": "..."} / {"error": "..."}
    for key in ["message", "detail", "error"] {
        if let Some(msg) = v.get(key).and_then(|m| m.as_str()) {
            if !msg.is_empty() {
                return msg.to_string();
            }
        }
    }

    fallback.to_string()
}

fn retry_after_secs(h: &HeaderMap) -> Option<u64> {
    h.get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?
        .parse()
        .ok()
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).to_string();
    if snip.len() > SNIPPET_MAX {
        snip.truncate(SNIPPET_MAX);
        snip.push_str("...");
    }
    snip
}

fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if key.eq_ignore_ascii_case("authorization") {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

/// Strip whitespace/quotes from a configured key and reject values that
/// cannot form a valid `Authorization` header.
fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();
    s.retain(|ch| !ch.is_ascii_whitespace());

    if !s.is_ascii() || s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains non-ASCII or control characters".into(),
        ));
    }

    HeaderValue::from_str(&format!("Bearer {}", s))
        .map_err(|e| HttpError::Build(format!("invalid Authorization header: {e}")))?;
    Ok(s)
}
