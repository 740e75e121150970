//! The per-account batch loop: fetch, expand, group, persist, summarize.
//!
//! Strictly sequential: accounts, posts, and API calls are processed one
//! at a time in order. Aggregator and LLM failures are contained here and
//! logged; filesystem failures (and anything else unexpected) propagate and
//! abort the whole batch, since there is no per-account isolation boundary.

use std::fs;

use time::OffsetDateTime;

use threadline_llm::summarizer::Summarizer;
use threadline_social::aggregator::AggregatorClient;
use threadline_social::aggregator::types::Post;
use threadline_threads::{ThreadStore, assemble};

pub struct Pipeline {
    aggregator: AggregatorClient,
    summarizer: Summarizer,
    store: ThreadStore,
}

impl Pipeline {
    pub fn new(aggregator: AggregatorClient, summarizer: Summarizer, store: ThreadStore) -> Self {
        Self {
            aggregator,
            summarizer,
            store,
        }
    }

    /// Run the batch over every account, in order.
    pub async fn run(&self, accounts: &[String]) -> anyhow::Result<()> {
        for account in accounts {
            tracing::info!(account, "processing account");
            self.process_account(account).await?;
        }
        Ok(())
    }

    async fn process_account(&self, account: &str) -> anyhow::Result<()> {
        let roots = match self
            .aggregator
            .recent_posts_for(account, OffsetDateTime::now_utc())
            .await
        {
            Ok(roots) => roots,
            Err(err) => {
                tracing::warn!(account, error = %err, "fetching recent posts failed, skipping account");
                return Ok(());
            }
        };

        if roots.is_empty() {
            tracing::info!(account, "no recent posts, skipping");
            return Ok(());
        }
        tracing::info!(account, roots = roots.len(), "found recent posts");

        // Each root is immediately followed by its own replies; replies
        // across different roots stay interleaved in fetch order.
        let mut combined: Vec<Post> = Vec::new();
        for root in roots {
            let replies = match self
                .aggregator
                .popular_replies_for(&root, OffsetDateTime::now_utc())
                .await
            {
                Ok(replies) => replies,
                Err(err) => {
                    tracing::warn!(
                        account,
                        post_id = root.id.as_deref().unwrap_or("-"),
                        error = %err,
                        "fetching replies failed, keeping the root alone"
                    );
                    Vec::new()
                }
            };
            combined.push(root);
            combined.extend(replies);
        }

        let threads = assemble(combined);
        let paths = self.store.write_all(account, &threads)?;

        for path in paths {
            let text = fs::read_to_string(&path)?;
            let summary = self.summarizer.summarize(&text).await;
            tracing::info!(
                account,
                file = %path.display(),
                model = self.summarizer.model_name(),
                summary = %summary,
                "conversation summary"
            );
        }

        Ok(())
    }
}
