use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "CareQueue";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_BIND: &str = "127.0.0.1:8787";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_OLLAMA_MODEL: &str = "medgemma:latest";
const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "carequeue_lib=info,carequeue=info,tower_http=warn"
}

/// Get the application data directory.
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database location
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("carequeue.db")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

/// Which upstream generative-language provider analyses symptoms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Gemini,
    Ollama,
}

impl LlmProvider {
    fn parse(value: &str) -> Result<Self, ConfigError> {
        match value.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "CAREQUEUE_PROVIDER",
                value: value.into(),
            }),
        }
    }
}

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: SocketAddr,
    pub db_path: PathBuf,
    pub provider: LlmProvider,
    pub model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub ollama_url: String,
    pub llm_timeout_secs: u64,
    /// Honour the `FAIL_API` description that forces the fallback path.
    pub failure_sentinel: bool,
}

impl Settings {
    /// Load settings from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (tests inject a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("CAREQUEUE_BIND").unwrap_or_else(|| DEFAULT_BIND.into());
        let bind_addr = bind_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "CAREQUEUE_BIND",
            value: bind_raw.clone(),
        })?;

        let provider = match get("CAREQUEUE_PROVIDER") {
            Some(p) => LlmProvider::parse(&p)?,
            None => LlmProvider::Gemini,
        };

        let model = get("CAREQUEUE_MODEL").unwrap_or_else(|| match provider {
            LlmProvider::Gemini => DEFAULT_GEMINI_MODEL.into(),
            LlmProvider::Ollama => DEFAULT_OLLAMA_MODEL.into(),
        });

        let gemini_api_key = get("GEMINI_API_KEY");
        if provider == LlmProvider::Gemini && gemini_api_key.is_none() {
            return Err(ConfigError::Missing("GEMINI_API_KEY"));
        }

        let llm_timeout_secs = match get("CAREQUEUE_LLM_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "CAREQUEUE_LLM_TIMEOUT_SECS",
                value: raw,
            })?,
            None => DEFAULT_LLM_TIMEOUT_SECS,
        };

        let failure_sentinel = match get("CAREQUEUE_FAILURE_SENTINEL") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidValue {
                key: "CAREQUEUE_FAILURE_SENTINEL",
                value: raw,
            })?,
            None => true,
        };

        Ok(Self {
            bind_addr,
            db_path: get("CAREQUEUE_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            provider,
            model,
            gemini_api_key,
            gemini_base_url: get("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.into()),
            ollama_url: get("OLLAMA_URL").unwrap_or_else(|| DEFAULT_OLLAMA_URL.into()),
            llm_timeout_secs,
            failure_sentinel,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
