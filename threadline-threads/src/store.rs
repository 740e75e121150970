//! Durable, human-readable conversation records.
//!
//! One file per conversation, named `{account}_{key}.txt`. Reruns overwrite
//! the whole file; nothing is ever appended in place.

use std::fs;
use std::path::{Path, PathBuf};

use threadline_common::Result;
use threadline_social::aggregator::types::Post;

use crate::assemble::ConversationThread;

const UNKNOWN: &str = "UNKNOWN";

pub struct ThreadStore {
    dir: PathBuf,
}

impl ThreadStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write every thread, returning the paths in thread order.
    pub fn write_all(
        &self,
        account: &str,
        threads: &[ConversationThread],
    ) -> Result<Vec<PathBuf>> {
        let mut paths = Vec::with_capacity(threads.len());
        for thread in threads {
            paths.push(self.write_thread(account, thread)?);
        }
        tracing::debug!(account, files = paths.len(), "wrote conversation records");
        Ok(paths)
    }

    /// Render one thread, chronologically ordered, and overwrite its file.
    pub fn write_thread(&self, account: &str, thread: &ConversationThread) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(format!("{}_{}.txt", account, thread.key));
        fs::write(&path, render_thread(&thread.posts))?;
        Ok(path)
    }
}

/// Fixed block layout per post, posts sorted ascending by timestamp string.
/// The sort is stable and missing timestamps order first.
fn render_thread(posts: &[Post]) -> String {
    let mut ordered: Vec<&Post> = posts.iter().collect();
    ordered.sort_by(|a, b| a.timestamp_or_empty().cmp(b.timestamp_or_empty()));

    let mut out = String::new();
    for post in ordered {
        out.push_str(&format!("TweetID: {}\n", post.id.as_deref().unwrap_or(UNKNOWN)));
        out.push_str(&format!("Author: {}\n", post.author.as_deref().unwrap_or(UNKNOWN)));
        out.push_str(&format!("Time: {}\n", post.timestamp_or_empty()));
        out.push_str(&format!("Likes: {}\n", post.like_count));
        out.push_str(&post.text);
        out.push_str("\n\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, created_at: Option<&str>, text: &str) -> Post {
        Post {
            id: Some(id.into()),
            conversation_id: Some("1".into()),
            author: Some("alice".into()),
            text: text.into(),
            created_at: created_at.map(Into::into),
            like_count: 2,
        }
    }

    fn thread(posts: Vec<Post>) -> ConversationThread {
        ConversationThread {
            key: "1".into(),
            posts,
        }
    }

    #[test]
    fn renders_the_fixed_block_layout_in_timestamp_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(dir.path());

        let t = thread(vec![
            post("2", Some("2025-02-07T12:26:00Z"), "reply"),
            post("1", Some("2025-02-07T12:25:00Z"), "root"),
        ]);
        let path = store.write_thread("alice", &t).unwrap();

        assert_eq!(path.file_name().unwrap(), "alice_1.txt");
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "TweetID: 1\nAuthor: alice\nTime: 2025-02-07T12:25:00Z\nLikes: 2\nroot\n\n\
             TweetID: 2\nAuthor: alice\nTime: 2025-02-07T12:26:00Z\nLikes: 2\nreply\n\n"
        );
    }

    #[test]
    fn missing_timestamps_sort_first_and_fields_default_to_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(dir.path());

        let undated = Post {
            conversation_id: Some("1".into()),
            text: "undated".into(),
            ..Default::default()
        };
        let t = thread(vec![post("1", Some("2025-02-07T12:25:00Z"), "dated"), undated]);
        let content = fs::read_to_string(store.write_thread("alice", &t).unwrap()).unwrap();

        assert!(content.starts_with("TweetID: UNKNOWN\nAuthor: UNKNOWN\nTime: \nLikes: 0\nundated\n\n"));
        assert!(content.ends_with("dated\n\n"));
    }

    #[test]
    fn rewriting_a_thread_overwrites_the_previous_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(dir.path());

        let first = thread(vec![post("1", Some("t1"), "old body")]);
        let second = thread(vec![post("1", Some("t1"), "new body")]);

        store.write_thread("alice", &first).unwrap();
        let path = store.write_thread("alice", &second).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("new body"));
        assert!(!content.contains("old body"), "no stale or appended content");
    }

    #[test]
    fn write_all_returns_paths_in_thread_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThreadStore::new(dir.path());

        let threads = vec![
            ConversationThread {
                key: "A".into(),
                posts: vec![post("1", Some("t1"), "a")],
            },
            ConversationThread {
                key: "B".into(),
                posts: vec![post("2", Some("t2"), "b")],
            },
        ];
        let paths = store.write_all("alice", &threads).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["alice_A.txt", "alice_B.txt"]);
    }
}
