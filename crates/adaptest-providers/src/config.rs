//! Provider configuration and factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use adaptest_core::generation::GenerationConfig;
use adaptest_core::model::BANK_SIZE;
use adaptest_core::traits::LlmProvider;

use crate::ollama::{OllamaProvider, DEFAULT_OLLAMA_URL};
use crate::openrouter::OpenRouterProvider;

/// File name searched for in the current directory.
pub const LOCAL_CONFIG_FILE: &str = "adaptest.toml";

/// Configuration for a single LLM provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenRouter {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::OpenRouter {
                api_key: _,
                base_url,
            } => f
                .debug_struct("OpenRouter")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Ollama { base_url } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

/// Top-level adaptest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaptestConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// Default provider to use.
    #[serde(default = "default_provider")]
    pub default_provider: String,
    /// Default model to use.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Sampling temperature for question generation.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Max retries on provider errors and malformed banks.
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Initial delay between retries in milliseconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Leading words of a document sent to the model.
    #[serde(default = "default_max_words")]
    pub max_words: usize,
    /// Questions requested per generated bank.
    #[serde(default = "default_question_count")]
    pub question_count: usize,
    /// Output directory for session reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_provider() -> String {
    "openrouter".to_string()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_retries() -> u32 {
    2
}
fn default_retry_delay() -> u64 {
    1000
}
fn default_max_words() -> usize {
    1000
}
fn default_question_count() -> usize {
    BANK_SIZE
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./adaptest-results")
}

impl Default for AdaptestConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            max_words: default_max_words(),
            question_count: default_question_count(),
            output_dir: default_output_dir(),
        }
    }
}

impl AdaptestConfig {
    /// Look up a provider by name, falling back to the default provider.
    pub fn provider(&self, name: Option<&str>) -> Result<(&str, &ProviderConfig)> {
        let name = name.unwrap_or(self.default_provider.as_str());
        let (key, config) = self.providers.get_key_value(name).with_context(|| {
            let mut known: Vec<&str> = self.providers.keys().map(String::as_str).collect();
            known.sort_unstable();
            format!(
                "provider '{name}' is not configured (configured: {}). \
                 Set OR_API_KEY or add it to {LOCAL_CONFIG_FILE}",
                if known.is_empty() {
                    "none".to_string()
                } else {
                    known.join(", ")
                }
            )
        })?;
        Ok((key.as_str(), config))
    }

    /// Generation settings derived from this config.
    pub fn generation_config(&self, model: Option<&str>) -> GenerationConfig {
        GenerationConfig {
            model: model.unwrap_or(self.default_model.as_str()).to_string(),
            question_count: self.question_count,
            max_words: self.max_words,
            temperature: self.temperature,
            max_retries: self.max_retries,
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            ..GenerationConfig::default()
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut cursor = 0;
    // Substituted values are not rescanned
    while let Some(offset) = result[cursor..].find("${") {
        let start = cursor + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..start],
            value,
            &result[start + end + 1..]
        );
        cursor = start + value.len();
    }
    result
}

/// Resolve env vars in a provider config.
fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    match config {
        ProviderConfig::OpenRouter { api_key, base_url } => ProviderConfig::OpenRouter {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ProviderConfig::Ollama { base_url } => ProviderConfig::Ollama {
            base_url: resolve_env_vars(base_url),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `adaptest.toml` in the current directory
/// 2. `~/.config/adaptest/config.toml`
///
/// Environment variable overrides: `OR_API_KEY` / `ADAPTEST_OPENROUTER_KEY`,
/// `ADAPTEST_OPENAI_KEY`.
pub fn load_config() -> Result<AdaptestConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AdaptestConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|dir| dir.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<AdaptestConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AdaptestConfig::default(),
    };

    Ok(apply_env_overrides(config))
}

fn apply_env_overrides(mut config: AdaptestConfig) -> AdaptestConfig {
    let openrouter_key = std::env::var("ADAPTEST_OPENROUTER_KEY")
        .or_else(|_| std::env::var("OR_API_KEY"))
        .ok()
        .filter(|k| !k.is_empty());
    if let Some(key) = openrouter_key {
        let entry = config
            .providers
            .entry("openrouter".into())
            .or_insert(ProviderConfig::OpenRouter {
                api_key: String::new(),
                base_url: None,
            });
        if let ProviderConfig::OpenRouter { api_key, .. } = entry {
            *api_key = key;
        }
    }

    if let Some(key) = std::env::var("ADAPTEST_OPENAI_KEY")
        .ok()
        .filter(|k| !k.is_empty())
    {
        let entry = config
            .providers
            .entry("openai".into())
            .or_insert(ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            });
        if let ProviderConfig::OpenAI { api_key, .. } = entry {
            *api_key = key;
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    config
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("adaptest"))
}

/// Create a provider instance from its configuration.
pub fn create_provider(name: &str, config: &ProviderConfig) -> Result<Box<dyn LlmProvider>> {
    match config {
        ProviderConfig::OpenRouter { api_key, base_url } => {
            ensure_key(name, api_key, "OR_API_KEY")?;
            Ok(Box::new(OpenRouterProvider::new(api_key, base_url.clone())))
        }
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => {
            ensure_key(name, api_key, "ADAPTEST_OPENAI_KEY")?;
            Ok(Box::new(OpenRouterProvider::openai(
                api_key,
                base_url.clone(),
                org_id.clone(),
            )))
        }
        ProviderConfig::Ollama { base_url } => Ok(Box::new(OllamaProvider::new(base_url))),
    }
}

fn ensure_key(name: &str, api_key: &str, env_var: &str) -> Result<()> {
    anyhow::ensure!(
        !api_key.trim().is_empty(),
        "provider '{name}' has no API key; set {env_var} or api_key in {LOCAL_CONFIG_FILE}"
    );
    Ok(())
}
