//! HTTP client for the aggregator's search endpoint.
//!
//! Shapes the POST payload, sends the raw account token in `Authorization`
//! (the aggregator does not use a `Bearer` scheme), and delegates transport
//! concerns (bounded 429/5xx retry, timeouts, redacted logging) to the
//! shared HTTP client. Failures stay typed all the way up so callers can
//! tell "nothing matched" from "the fetch failed".

use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::Serialize;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::aggregator::query::{self, AggregatorQuery};
use crate::aggregator::types::{Post, SearchResponse};
use threadline_http::{Auth, HttpClient, HttpError, RequestOpts};

const SORT_ORDER: &str = "Top";
const LANGUAGE: &str = "en";

#[derive(Clone)]
pub struct AggregatorClient {
    http: HttpClient,
    auth: HeaderValue,
}

/// Search request body. Field set and names are owned by the aggregator.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPayload {
    pub query: String,
    pub sort: &'static str,
    pub start_date: String,
    pub end_date: String,
    pub lang: &'static str,
    pub verified: bool,
    pub blue_verified: bool,
    pub is_quote: bool,
    pub is_video: bool,
    pub is_image: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_likes: Option<u64>,
}

impl SearchPayload {
    fn new(q: &AggregatorQuery, min_likes: Option<u64>) -> Self {
        Self {
            query: q.query.clone(),
            sort: SORT_ORDER,
            start_date: rfc3339(q.window.start),
            end_date: rfc3339(q.window.end),
            lang: LANGUAGE,
            verified: false,
            blue_verified: false,
            is_quote: false,
            is_video: false,
            is_image: false,
            min_likes,
        }
    }
}

impl AggregatorClient {
    /// `endpoint` is the full search URL; `auth_token` is sent verbatim.
    pub fn new(endpoint: &str, auth_token: &str) -> Result<Self, HttpError> {
        let http = HttpClient::new(endpoint)?;
        let auth = HeaderValue::from_str(auth_token.trim())
            .map_err(|e| HttpError::Build(format!("invalid aggregator token: {e}")))?;
        Ok(Self { http, auth })
    }

    pub fn with_timeout(mut self, dur: std::time::Duration) -> Self {
        self.http = self.http.with_timeout(dur);
        self
    }

    pub fn with_retry_policy(mut self, retry: threadline_http::RetryPolicy) -> Self {
        self.http = self.http.with_retry_policy(retry);
        self
    }

    /// Recent original posts by `account` in the trailing search window.
    pub async fn recent_posts_for(
        &self,
        account: &str,
        now: OffsetDateTime,
    ) -> Result<Vec<Post>, HttpError> {
        self.search(&query::recent_posts(account, now), None).await
    }

    /// Popular replies to `parent`: replies in its conversation with at
    /// least half the parent's likes (minimum one). Parents without an id
    /// cannot anchor a conversation query and yield no replies.
    pub async fn popular_replies_for(
        &self,
        parent: &Post,
        now: OffsetDateTime,
    ) -> Result<Vec<Post>, HttpError> {
        let Some(conversation_id) = parent.id.as_deref() else {
            tracing::warn!("post has no id to anchor a replies query, skipping");
            return Ok(Vec::new());
        };

        let threshold = query::reply_like_threshold(parent.like_count);
        let q = query::popular_replies(conversation_id, threshold, now);
        self.search(&q, Some(threshold)).await
    }

    async fn search(
        &self,
        q: &AggregatorQuery,
        min_likes: Option<u64>,
    ) -> Result<Vec<Post>, HttpError> {
        let payload = SearchPayload::new(q, min_likes);
        tracing::debug!(query = %payload.query, ?min_likes, "aggregator.search");

        let opts = RequestOpts {
            auth: Some(Auth::Header {
                name: AUTHORIZATION,
                value: self.auth.clone(),
            }),
            ..Default::default()
        };
        let resp: SearchResponse = self.http.post_json_opts("", &payload, opts).await?;

        tracing::debug!(count = resp.results.len(), "aggregator.search.results");
        Ok(resp.results)
    }
}

fn rfc3339(instant: OffsetDateTime) -> String {
    // Rfc3339 formatting only fails outside year range 0..=9999.
    instant.format(&Rfc3339).unwrap()
}
