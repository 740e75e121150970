use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use threadline_app::accounts::read_accounts;
use threadline_app::pipeline::Pipeline;
use threadline_common::LlmConfig;
use threadline_common::observability::{LogConfig, init_logging};
use threadline_config::{ConfigLoader, LlmSettings, ThreadlineConfig};
use threadline_http::RetryPolicy;
use threadline_llm::summarizer::Summarizer;
use threadline_social::aggregator::AggregatorClient;
use threadline_threads::ThreadStore;

#[derive(Parser, Debug)]
#[command(name = "threadline", about = "Harvest conversation threads and summarize them")]
struct Cli {
    /// Path to the configuration file.
    #[arg(long, default_value = "threadline.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg: ThreadlineConfig = ConfigLoader::new().with_file(&cli.config).load()?;

    let log_path = init_logging(LogConfig {
        emit_stderr: true,
        ..LogConfig::default()
    })?;
    tracing::info!(log = %log_path.display(), "threadline starting");

    let retry = RetryPolicy {
        max_retries: cfg.http.max_retries,
        rate_limit_floor: Duration::from_secs(cfg.http.rate_limit_backoff_secs),
        ..RetryPolicy::default()
    };
    let aggregator = AggregatorClient::new(&cfg.aggregator.endpoint, &cfg.aggregator.auth_token)?
        .with_timeout(Duration::from_secs(cfg.http.timeout_secs))
        .with_retry_policy(retry);

    let LlmSettings::Openai {
        model,
        auth_token,
        endpoint,
    } = cfg.llm;
    let llm = threadline_llm::ensure_llm_ready(&LlmConfig::OpenAi {
        api_key: auth_token,
        model,
        base_url: Some(endpoint),
    })?;
    let summarizer = Summarizer::new(llm);

    let store = ThreadStore::new(&cfg.output_dir);
    let accounts = read_accounts(&cfg.accounts_file)?;
    if accounts.is_empty() {
        tracing::warn!(file = %cfg.accounts_file, "no accounts configured, nothing to do");
        return Ok(());
    }
    tracing::info!(accounts = accounts.len(), "starting batch run");

    Pipeline::new(aggregator, summarizer, store)
        .run(&accounts)
        .await
}
