//! Advanced-search query strings with trailing time windows.
//!
//! Every query covers the ten minutes before the supplied instant. Callers
//! pass "now" explicitly so tests stay deterministic; in production two
//! consecutive calls see slightly different windows, which is accepted
//! query-to-query skew for a polling fetcher.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Duration, OffsetDateTime, UtcOffset};

/// How far back each search reaches.
pub const SEARCH_WINDOW: Duration = Duration::minutes(10);

/// The aggregator's advanced-search timestamp syntax.
const WINDOW_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]_[hour]:[minute]:[second]_UTC");

/// Inclusive UTC bounds of one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: OffsetDateTime,
    pub end: OffsetDateTime,
}

impl QueryWindow {
    /// The trailing [`SEARCH_WINDOW`] ending at `now`, normalised to UTC.
    pub fn trailing(now: OffsetDateTime) -> Self {
        let end = now.to_offset(UtcOffset::UTC);
        Self {
            start: end - SEARCH_WINDOW,
            end,
        }
    }
}

/// A query string plus the window it was built for.
#[derive(Debug, Clone)]
pub struct AggregatorQuery {
    pub query: String,
    pub window: QueryWindow,
}

/// Original (non-reply, non-repost) posts authored by `account` within the
/// trailing window.
pub fn recent_posts(account: &str, now: OffsetDateTime) -> AggregatorQuery {
    let window = QueryWindow::trailing(now);
    let query = format!(
        "from:{account} -filter:replies -filter:nativeretweets since:{} until:{}",
        window_timestamp(window.start),
        window_timestamp(window.end),
    );
    AggregatorQuery { query, window }
}

/// Replies in `conversation_id` with at least `min_likes` likes within the
/// trailing window.
pub fn popular_replies(conversation_id: &str, min_likes: u64, now: OffsetDateTime) -> AggregatorQuery {
    let window = QueryWindow::trailing(now);
    let query = format!(
        "conversation_id:{conversation_id} filter:replies min_faves:{min_likes} since:{} until:{}",
        window_timestamp(window.start),
        window_timestamp(window.end),
    );
    AggregatorQuery { query, window }
}

/// Like threshold a reply must clear to count as popular: half the parent's
/// likes, rounded down, but never below one.
pub fn reply_like_threshold(parent_likes: u64) -> u64 {
    (parent_likes / 2).max(1)
}

fn window_timestamp(instant: OffsetDateTime) -> String {
    // The format names every component it renders, so this cannot fail.
    instant.format(&WINDOW_FORMAT).unwrap()
}
