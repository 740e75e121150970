//! Wire types for aggregator search responses.
//!
//! The schema is externally owned: every field the aggregator may omit is
//! defaulted so schema drift deserializes instead of erroring. Timestamps
//! are kept as the aggregator's own strings; their format is lexicographically
//! ordered, so callers sort on the raw value.

use serde::{Deserialize, Serialize};

/// Grouping key used when a post carries neither a conversation id nor an
/// id of its own.
pub const NO_CONVERSATION_ID: &str = "NO_CONVERSATION_ID";

/// Search response envelope. `results` is the canonical field; `data` is
/// the legacy name some aggregator deployments still emit and maps to the
/// same list.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SearchResponse {
    #[serde(default, alias = "data")]
    pub results: Vec<Post>,
}

/// One fetched post. Immutable once deserialized.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Post {
    #[serde(default)]
    pub id: Option<String>,
    /// Id of the thread's root post; absent on roots from some deployments.
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub text: String,
    /// Aggregator timestamp, kept verbatim.
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub like_count: u64,
}

impl Post {
    /// Conversation grouping key: the conversation id, else the post's own
    /// id, else [`NO_CONVERSATION_ID`].
    pub fn thread_key(&self) -> &str {
        self.conversation_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or(NO_CONVERSATION_ID)
    }

    /// Sort key for chronological ordering; missing timestamps sort first.
    pub fn timestamp_or_empty(&self) -> &str {
        self.created_at.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_results_field_deserializes() {
        let body = r#"{"results": [{"id": "1", "text": "hi", "like_count": 4}]}"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.results[0].id.as_deref(), Some("1"));
        assert_eq!(resp.results[0].like_count, 4);
    }

    #[test]
    fn legacy_data_field_is_an_alias() {
        let body = r#"{"data": [{"id": "2", "text": "legacy"}]}"#;
        let resp: SearchResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.results.len(), 1);
        assert_eq!(resp.results[0].text, "legacy");
    }

    #[test]
    fn missing_fields_default() {
        let resp: SearchResponse = serde_json::from_str(r#"{"results": [{}]}"#).unwrap();
        let post = &resp.results[0];
        assert_eq!(post.id, None);
        assert_eq!(post.text, "");
        assert_eq!(post.like_count, 0);
        assert_eq!(post.timestamp_or_empty(), "");
    }

    #[test]
    fn thread_key_falls_back_from_conversation_to_id_to_sentinel() {
        let with_conv = Post {
            id: Some("9".into()),
            conversation_id: Some("5".into()),
            ..Default::default()
        };
        assert_eq!(with_conv.thread_key(), "5");

        let id_only = Post {
            id: Some("9".into()),
            ..Default::default()
        };
        assert_eq!(id_only.thread_key(), "9");

        assert_eq!(Post::default().thread_key(), NO_CONVERSATION_ID);
    }
}
