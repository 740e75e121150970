//! Loading configuration from an on-disk YAML file.

use threadline_config::{ConfigLoader, LlmSettings};

#[test]
fn loads_a_complete_yaml_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("threadline.yaml");
    std::fs::write(
        &path,
        r#"
version: "1"
aggregator:
  endpoint: "https://agg.example.com/search"
  auth_token: "file-token"
llm:
  provider: "openai"
  model: "gpt-4o-mini"
  auth_token: "sk-file"
  endpoint: "https://gateway.example.com/v1"
accounts_file: "watchlist.txt"
output_dir: "records"
http:
  timeout_secs: 30
"#,
    )
    .unwrap();

    let cfg = ConfigLoader::new().with_file(&path).load().unwrap();

    assert_eq!(cfg.version.as_deref(), Some("1"));
    assert_eq!(cfg.aggregator.auth_token, "file-token");
    assert_eq!(cfg.accounts_file, "watchlist.txt");
    assert_eq!(cfg.output_dir, "records");
    assert_eq!(cfg.http.timeout_secs, 30);
    assert_eq!(cfg.http.max_retries, 2);

    let LlmSettings::Openai { endpoint, model, .. } = cfg.llm;
    assert_eq!(endpoint, "https://gateway.example.com/v1");
    assert_eq!(model, "gpt-4o-mini");
}

#[test]
fn a_missing_file_is_an_error() {
    let err = ConfigLoader::new()
        .with_file("definitely/not/here.yaml")
        .load()
        .unwrap_err();
    assert!(!err.to_string().is_empty());
}
