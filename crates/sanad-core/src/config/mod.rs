//! Configuration
//!
//! Environment-driven settings for a verification run. Every key has a
//! default; `validate` checks what cannot be defaulted (the input file and,
//! for OpenAI, the API key).
//!
//! | Variable              | Default                           |
//! |-----------------------|-----------------------------------|
//! | `MODEL_PROVIDER`      | `openai`                          |
//! | `OLLAMA_MODEL`        | `gemma3:1b-it-fp16`               |
//! | `OLLAMA_TEMPERATURE`  | `0.0`                             |
//! | `OLLAMA_BASE_URL`     | `http://localhost:11434`          |
//! | `OPENAI_MODEL`        | `gpt-4o`                          |
//! | `OPENAI_API_KEY`      | unset                             |
//! | `OPENAI_TEMPERATURE`  | `0.0`                             |
//! | `OPENAI_MAX_TOKENS`   | `4000`                            |
//! | `OPENAI_BASE_URL`     | `https://api.openai.com`          |
//! | `INPUT_FILE`          | `dataset/dev_top20_matches.json`  |
//! | `OUTPUT_FILE`         | `final.json`                      |
//! | `REMOVE_DIACRITICS`   | `true`                            |
//! | `RESULTS_DIR`         | `results`                         |
//! | `VERIFY_TIMEOUT_SECS` | `60`                              |
//! | `VERIFY_MAX_ATTEMPTS` | `3`                               |
//! | `MERGE_POLICY`        | `exact-ayah`                      |
//! | `KEEP_STEP_SNAPSHOTS` | `false`                           |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::orchestrator::{MergePolicy, OrchestratorConfig};
use crate::verifier::RetryPolicy;

// ============================================================================
// CONSTANTS
// ============================================================================

pub const DEFAULT_OLLAMA_MODEL: &str = "gemma3:1b-it-fp16";
pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_MAX_TOKENS: u32 = 4000;
pub const DEFAULT_INPUT_FILE: &str = "dataset/dev_top20_matches.json";
pub const DEFAULT_OUTPUT_FILE: &str = "final.json";
pub const DEFAULT_RESULTS_DIR: &str = "results";

/// Input locations tried after `INPUT_FILE`
const INPUT_FALLBACKS: [&str; 2] = ["dev_top20_matches.json", "dataset/dev_top20_matches.json"];

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Configuration errors; all of them are fatal for a run
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Unsupported model provider: {0}. Use 'ollama' or 'openai'")]
    UnknownProvider(String),
    #[error("Input file not found in any of these locations: {0:?}")]
    MissingInput(Vec<PathBuf>),
    #[error("OPENAI_API_KEY environment variable is required when using OpenAI models")]
    MissingApiKey,
}

// ============================================================================
// PROVIDER
// ============================================================================

/// Chat model backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Provider {
    #[default]
    OpenAi,
    Ollama,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAi => "openai",
            Provider::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            _ => Err(ConfigError::UnknownProvider(s.to_string())),
        }
    }
}

/// Known-good models per provider
pub fn supported_models(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::Ollama => &["gemma3:1b-it-fp16", "llama3.1:8b", "llama3.1:70b", "qwen2.5:7b"],
        Provider::OpenAi => &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"],
    }
}

// ============================================================================
// CONFIG
// ============================================================================

/// Settings for one verification run
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub provider: Provider,

    pub ollama_model: String,
    pub ollama_temperature: f32,
    pub ollama_base_url: String,

    pub openai_model: String,
    pub openai_api_key: Option<String>,
    pub openai_temperature: f32,
    pub openai_max_tokens: u32,
    pub openai_base_url: String,

    pub input_file: PathBuf,
    pub output_file: String,
    pub results_dir: PathBuf,

    /// Strip tashkeel from query and candidate before verification
    pub remove_diacritics: bool,
    pub merge_policy: MergePolicy,
    /// Write a timestamped copy of the results after every query
    pub keep_step_snapshots: bool,

    pub verify_timeout: Duration,
    pub verify_max_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAi,
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            ollama_temperature: 0.0,
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
            openai_api_key: None,
            openai_temperature: 0.0,
            openai_max_tokens: DEFAULT_OPENAI_MAX_TOKENS,
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            input_file: PathBuf::from(DEFAULT_INPUT_FILE),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            remove_diacritics: true,
            merge_policy: MergePolicy::default(),
            keep_step_snapshots: false,
            verify_timeout: RetryPolicy::default().timeout,
            verify_max_attempts: RetryPolicy::default().max_attempts,
        }
    }
}

impl Config {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match get("MODEL_PROVIDER") {
            Some(value) => value.parse()?,
            None => defaults.provider,
        };
        let merge_policy = match get("MERGE_POLICY") {
            Some(value) => value.parse()?,
            None => defaults.merge_policy,
        };

        let timeout_secs: u64 = parse_or(
            get("VERIFY_TIMEOUT_SECS"),
            "VERIFY_TIMEOUT_SECS",
            defaults.verify_timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "VERIFY_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        let verify_timeout = Duration::from_secs(timeout_secs);

        Ok(Self {
            provider,
            ollama_model: get("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            ollama_temperature: parse_or(get("OLLAMA_TEMPERATURE"), "OLLAMA_TEMPERATURE", 0.0)?,
            ollama_base_url: get("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            openai_model: get("OPENAI_MODEL").unwrap_or(defaults.openai_model),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_temperature: parse_or(get("OPENAI_TEMPERATURE"), "OPENAI_TEMPERATURE", 0.0)?,
            openai_max_tokens: parse_or(
                get("OPENAI_MAX_TOKENS"),
                "OPENAI_MAX_TOKENS",
                DEFAULT_OPENAI_MAX_TOKENS,
            )?,
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.openai_base_url),
            input_file: get("INPUT_FILE").map(PathBuf::from).unwrap_or(defaults.input_file),
            output_file: get("OUTPUT_FILE").unwrap_or(defaults.output_file),
            results_dir: get("RESULTS_DIR").map(PathBuf::from).unwrap_or(defaults.results_dir),
            remove_diacritics: get("REMOVE_DIACRITICS")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.remove_diacritics),
            merge_policy,
            keep_step_snapshots: get("KEEP_STEP_SNAPSHOTS")
                .map(|v| v.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.keep_step_snapshots),
            verify_timeout,
            verify_max_attempts: parse_or(
                get("VERIFY_MAX_ATTEMPTS"),
                "VERIFY_MAX_ATTEMPTS",
                defaults.verify_max_attempts,
            )?,
        })
    }

    /// Resolve the input file and check provider credentials.
    ///
    /// On success `input_file` points at the first existing candidate path.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let candidates: Vec<PathBuf> = std::iter::once(self.input_file.clone())
            .chain(INPUT_FALLBACKS.iter().map(PathBuf::from))
            .collect();

        let found = candidates.iter().find(|p| p.exists()).cloned();
        match found {
            Some(path) => {
                tracing::info!(path = %path.display(), "Found input file");
                self.input_file = path;
            }
            None => return Err(ConfigError::MissingInput(candidates)),
        }

        if self.provider == Provider::OpenAi && self.openai_api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        tracing::info!(provider = %self.provider, model = self.model_name(), "Configuration validated");
        Ok(())
    }

    /// Model of the active provider
    pub fn model_name(&self) -> &str {
        match self.provider {
            Provider::OpenAi => &self.openai_model,
            Provider::Ollama => &self.ollama_model,
        }
    }

    /// Temperature of the active provider
    pub fn temperature(&self) -> f32 {
        match self.provider {
            Provider::OpenAi => self.openai_temperature,
            Provider::Ollama => self.ollama_temperature,
        }
    }

    /// Base URL of the active provider
    pub fn base_url(&self) -> &str {
        match self.provider {
            Provider::OpenAi => &self.openai_base_url,
            Provider::Ollama => &self.ollama_base_url,
        }
    }

    /// `{results_dir}/{provider}_{model}_{with|without}_diacritic`
    pub fn results_folder(&self) -> PathBuf {
        let model: String = self
            .model_name()
            .chars()
            .map(|c| if matches!(c, ':' | '/' | '-') { '_' } else { c })
            .collect();
        let suffix = if self.remove_diacritics {
            "with_diacritic"
        } else {
            "without_diacritic"
        };
        self.results_dir
            .join(format!("{}_{}_{}", self.provider, model, suffix))
    }

    /// Canonical checkpoint path inside the results folder
    pub fn output_path(&self) -> PathBuf {
        self.results_folder().join(&self.output_file)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.verify_max_attempts,
            timeout: self.verify_timeout,
            ..RetryPolicy::default()
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            merge_policy: self.merge_policy,
            remove_diacritics: self.remove_diacritics,
        }
    }
}

fn parse_or<T: FromStr>(
    value: Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(default),
    }
}

// ============================================================================
// TESTS
// ============================================================================
