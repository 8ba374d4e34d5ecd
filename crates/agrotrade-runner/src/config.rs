//! Configuration types for the negotiation runner.
//!
//! The runner reads its settings from environment variables: where the
//! scenario file and prompt templates live, which LLM backend to call and
//! how, and where to write the transcript. Defaults target a local
//! OpenAI-compatible server such as LM Studio.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::RunnerError;

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Scenario YAML file. `None` runs the built-in commodity scenario.
    pub scenario_path: Option<PathBuf>,
    /// LLM backend configuration.
    pub backend: LlmBackendConfig,
    /// Per-turn timeout override in milliseconds.
    pub turn_timeout_ms: Option<u64>,
    /// Path to the templates directory.
    pub templates_dir: String,
    /// File that receives the transcript, if any.
    pub transcript_path: Option<PathBuf>,
    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,
}

/// Configuration for a single LLM backend.
#[derive(Debug, Clone)]
pub struct LlmBackendConfig {
    /// The backend type (openai, anthropic).
    pub backend_type: BackendType,
    /// Base API URL (e.g. `http://localhost:1234/v1`).
    pub api_url: String,
    /// API key for authentication.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on generated tokens per reply.
    pub max_tokens: u32,
}

/// Supported LLM backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible API (works with `OpenAI`, LM Studio, Ollama).
    OpenAi,
    /// Anthropic Messages API (different request format).
    Anthropic,
}

impl FromStr for BackendType {
    type Err = RunnerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "lmstudio" | "lm-studio" | "ollama" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            other => Err(RunnerError::Config(format!("unknown backend type: {other}"))),
        }
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `SCENARIO_CONFIG` -- scenario YAML path (default: built-in scenario)
    /// - `LLM_BACKEND` -- backend type (default `openai`)
    /// - `LLM_API_URL` -- API base URL (default `http://localhost:1234/v1`)
    /// - `LLM_API_KEY` -- API key (default `lm-studio`)
    /// - `LLM_MODEL` -- model name (default `local-model`)
    /// - `LLM_TEMPERATURE` -- sampling temperature (default `0.7`)
    /// - `LLM_MAX_TOKENS` -- reply token limit (default `1024`)
    /// - `TURN_TIMEOUT_MS` -- overrides the scenario's per-turn timeout
    /// - `TEMPLATES_DIR` -- prompt templates (default `templates`)
    /// - `TRANSCRIPT_PATH` -- file receiving the transcript
    /// - `LOG_FORMAT` -- `json` for JSON logs (default text)
    pub fn from_env() -> Result<Self, RunnerError> {
        let backend = LlmBackendConfig {
            backend_type: env_or("LLM_BACKEND", "openai").parse()?,
            api_url: env_or("LLM_API_URL", "http://localhost:1234/v1"),
            api_key: env_or("LLM_API_KEY", "lm-studio"),
            model: env_or("LLM_MODEL", "local-model"),
            temperature: parse_env("LLM_TEMPERATURE", 0.7)?,
            max_tokens: parse_env("LLM_MAX_TOKENS", 1024)?,
        };

        let turn_timeout_ms = match std::env::var("TURN_TIMEOUT_MS") {
            Ok(raw) => Some(
                raw.parse()
                    .map_err(|e| RunnerError::Config(format!("invalid TURN_TIMEOUT_MS: {e}")))?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            scenario_path: std::env::var("SCENARIO_CONFIG").ok().map(PathBuf::from),
            backend,
            turn_timeout_ms,
            templates_dir: env_or("TEMPLATES_DIR", "templates"),
            transcript_path: std::env::var("TRANSCRIPT_PATH").ok().map(PathBuf::from),
            json_logs: env_or("LOG_FORMAT", "text").eq_ignore_ascii_case("json"),
        })
    }
}

/// Read an environment variable, falling back to `default`.
fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(name: &str, default: T) -> Result<T, RunnerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(name).map_or(Ok(default), |raw| {
        raw.parse()
            .map_err(|e| RunnerError::Config(format!("invalid {name}: {e}")))
    })
}
