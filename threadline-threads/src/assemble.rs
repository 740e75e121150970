//! Grouping of fetched posts into conversation threads.

use std::collections::HashMap;

use threadline_social::aggregator::types::Post;

/// One conversation: the grouping key plus its posts in input order.
#[derive(Debug, Clone)]
pub struct ConversationThread {
    pub key: String,
    pub posts: Vec<Post>,
}

/// Group posts by their conversation key.
///
/// Threads come back in first-seen key order and each thread keeps its
/// posts in input order. Nothing is deduplicated: an aggregator response
/// that returns the same post as both a root and a "reply" to itself
/// contributes it twice, and the record will show it twice.
pub fn assemble(posts: Vec<Post>) -> Vec<ConversationThread> {
    let mut threads: Vec<ConversationThread> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for post in posts {
        let key = post.thread_key().to_string();
        match by_key.get(&key) {
            Some(&slot) => threads[slot].posts.push(post),
            None => {
                by_key.insert(key.clone(), threads.len());
                threads.push(ConversationThread {
                    key,
                    posts: vec![post],
                });
            }
        }
    }

    tracing::debug!(threads = threads.len(), "assembled conversation threads");
    threads
}

#[cfg(test)]
mod tests {
    use super::*;
    use threadline_social::aggregator::types::NO_CONVERSATION_ID;

    fn post(id: &str, conversation_id: Option<&str>) -> Post {
        Post {
            id: Some(id.into()),
            conversation_id: conversation_id.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn groups_preserve_input_order_within_and_across_threads() {
        let threads = assemble(vec![
            post("1", Some("A")),
            post("2", Some("B")),
            post("3", Some("A")),
        ]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].key, "A");
        assert_eq!(
            threads[0]
                .posts
                .iter()
                .map(|p| p.id.as_deref().unwrap())
                .collect::<Vec<_>>(),
            ["1", "3"]
        );
        assert_eq!(threads[1].key, "B");
        assert_eq!(threads[1].posts[0].id.as_deref(), Some("2"));
    }

    #[test]
    fn missing_conversation_id_falls_back_to_post_id() {
        let threads = assemble(vec![post("42", None)]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].key, "42");
    }

    #[test]
    fn posts_with_no_ids_share_the_sentinel_thread() {
        let threads = assemble(vec![Post::default(), Post::default()]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].key, NO_CONVERSATION_ID);
        assert_eq!(threads[0].posts.len(), 2);
    }

    #[test]
    fn duplicate_posts_are_kept() {
        let twice = post("1", Some("A"));
        let threads = assemble(vec![twice.clone(), twice]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].posts.len(), 2);
    }
}
