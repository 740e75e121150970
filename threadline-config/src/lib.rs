//! Loader for Threadline's runtime configuration.
//!
//! Configuration comes from a YAML file (`threadline.yaml` by default)
//! merged with `THREADLINE`-prefixed environment variables (nested keys
//! separated by `__`), and every string value supports recursive `${VAR}`
//! expansion. The result is one strongly typed [`ThreadlineConfig`] built at
//! process start and passed into components; nothing reads the environment
//! at use time.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct ThreadlineConfig {
    pub version: Option<String>,
    pub aggregator: AggregatorSettings,
    pub llm: LlmSettings,
    #[serde(default = "default_accounts_file")]
    pub accounts_file: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default)]
    pub http: HttpSettings,
}

/// Where and how to reach the social-data aggregator.
#[derive(Debug, Deserialize)]
pub struct AggregatorSettings {
    /// Full search endpoint URL.
    pub endpoint: String,
    /// Token sent verbatim in the `Authorization` header.
    pub auth_token: String,
}

/// The tag is `provider`; only OpenAI-compatible backends are supported.
#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmSettings {
    Openai {
        model: String,
        auth_token: String,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
    },
}

/// Transport tuning shared by every outbound call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    /// Retry budget for transient aggregator failures (429/5xx/transport).
    pub max_retries: usize,
    /// Minimum pause before retrying a rate-limited request.
    pub rate_limit_backoff_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_retries: 2,
            rate_limit_backoff_secs: 60,
        }
    }
}

fn default_accounts_file() -> String {
    "accounts.txt".into()
}
fn default_output_dir() -> String {
    "threads".into()
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hiding the `config` crate wiring (YAML + env overrides).
pub struct ConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Start with the defaults: `THREADLINE` env overrides, files added by
    /// the caller.
    pub fn new() -> Self {
        let builder =
            Config::builder().add_source(Environment::with_prefix("THREADLINE").separator("__"));
        Self { builder }
    }

    /// Attach a config file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Merge an inline YAML snippet (tests and CLI overrides).
    ///
    /// ```
    /// use threadline_config::{ConfigLoader, LlmSettings};
    ///
    /// let cfg = ConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// version: "1"
    /// aggregator:
    ///   endpoint: "https://agg.example.com/search"
    ///   auth_token: "token"
    /// llm:
    ///   provider: "openai"
    ///   model: "gpt-4o-mini"
    ///   auth_token: "sk-demo"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(cfg.accounts_file, "accounts.txt");
    /// assert_eq!(cfg.output_dir, "threads");
    /// let LlmSettings::Openai { endpoint, .. } = cfg.llm;
    /// assert_eq!(endpoint, "https://api.openai.com/v1");
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Merge all sources, expand `${VAR}` placeholders, and deserialize.
    pub fn load(self) -> Result<ThreadlineConfig, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const MINIMAL_YAML: &str = r#"
aggregator:
  endpoint: "https://agg.example.com/search"
  auth_token: "${AGG_TOKEN}"
llm:
  provider: "openai"
  model: "gpt-4o-mini"
  auth_token: "sk-demo"
"#;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!(["hello-$CITY", { "loc": "${CITY}-${STATE}" }, 42, true, null]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles_and_leaves_value_reasonable() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            // Only terminates thanks to the depth cap; the cycle stays
            // visibly unresolved.
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn loads_minimal_yaml_with_defaults_and_expansion() {
        temp_env::with_var("AGG_TOKEN", Some("secret-token"), || {
            let cfg = ConfigLoader::new()
                .with_yaml_str(MINIMAL_YAML)
                .load()
                .expect("valid configuration");

            assert_eq!(cfg.aggregator.endpoint, "https://agg.example.com/search");
            assert_eq!(cfg.aggregator.auth_token, "secret-token");
            assert_eq!(cfg.accounts_file, "accounts.txt");
            assert_eq!(cfg.output_dir, "threads");
            assert_eq!(cfg.http.timeout_secs, 15);
            assert_eq!(cfg.http.max_retries, 2);
            assert_eq!(cfg.http.rate_limit_backoff_secs, 60);

            let LlmSettings::Openai {
                model, auth_token, ..
            } = cfg.llm;
            assert_eq!(model, "gpt-4o-mini");
            assert_eq!(auth_token, "sk-demo");
        });
    }

    #[test]
    fn http_section_overrides_defaults() {
        let yaml = format!("{MINIMAL_YAML}\nhttp:\n  timeout_secs: 3\n  max_retries: 5\n");
        temp_env::with_var("AGG_TOKEN", Some("t"), || {
            let cfg = ConfigLoader::new().with_yaml_str(&yaml).load().unwrap();
            assert_eq!(cfg.http.timeout_secs, 3);
            assert_eq!(cfg.http.max_retries, 5);
            // unspecified values keep their defaults
            assert_eq!(cfg.http.rate_limit_backoff_secs, 60);
        });
    }
}
