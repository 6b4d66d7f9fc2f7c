//! Runtime configuration.
//!
//! Everything is read from environment variables, with an optional `.env`
//! file in the working directory filling in whatever the environment does
//! not set. Unset variables take their defaults; malformed ones are errors.

use crate::errors::ConfigError;
use crate::gateway::RetryConfig;
use crate::pipeline::PipelineOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Chat completion endpoint settings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Bearer credential. Without one the gateway reports unavailable.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Endpoint root; `/v1/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Completion token limit.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Retries after the first attempt for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.groq.com/openai".to_string()
}

fn default_model() -> String {
    "llama-3.2-90b-vision-preview".to_string()
}

const fn default_temperature() -> f32 {
    0.7
}

const fn default_max_tokens() -> u32 {
    8192
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl GatewayConfig {
    /// Sets the credential.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the endpoint root.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Returns the retry policy: `max_retries + 1` attempts in total.
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new().with_max_attempts(self.max_retries as usize + 1)
    }
}

/// Artifact directory and retention settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory holding the artifacts.
    #[serde(default = "default_artifact_dir")]
    pub dir: PathBuf,
    /// Seconds an artifact stays readable.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
    /// Seconds between sweeps.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_artifact_dir() -> PathBuf {
    PathBuf::from("downloads")
}

const fn default_retention_secs() -> u64 {
    600
}

const fn default_sweep_interval_secs() -> u64 {
    60
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            dir: default_artifact_dir(),
            retention_secs: default_retention_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl ArtifactConfig {
    /// Sets the directory.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Returns the retention window.
    #[must_use]
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }

    /// Returns the sweep interval.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ForgeflowConfig {
    /// Model gateway settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
    /// Artifact store settings.
    #[serde(default)]
    pub artifacts: ArtifactConfig,
    /// Optional stage switches.
    #[serde(default)]
    pub pipeline: PipelineOptions,
    /// Server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Seconds before a pipeline run is abandoned; 0 disables the limit.
    #[serde(default = "default_pipeline_timeout_secs")]
    pub pipeline_timeout_secs: u64,
}

const fn default_pipeline_timeout_secs() -> u64 {
    900
}

impl ForgeflowConfig {
    /// Sets the artifact settings.
    #[must_use]
    pub fn with_artifacts(mut self, artifacts: ArtifactConfig) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Returns the pipeline timeout, if any.
    #[must_use]
    pub fn pipeline_timeout(&self) -> Option<Duration> {
        (self.pipeline_timeout_secs > 0).then(|| Duration::from_secs(self.pipeline_timeout_secs))
    }

    /// Loads configuration from the environment and `./.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let dotenv = std::fs::read_to_string(".env")
            .map(|contents| parse_dotenv(&contents))
            .unwrap_or_default();
        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// Loads configuration through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Lookup(&lookup);
        let defaults = Self::default();

        let gateway = GatewayConfig {
            api_key: env.get("GROQ_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: env.string("FORGEFLOW_BASE_URL", defaults.gateway.base_url),
            model: env.string("FORGEFLOW_MODEL", defaults.gateway.model),
            temperature: env.parse("FORGEFLOW_TEMPERATURE", defaults.gateway.temperature)?,
            max_tokens: env.parse("FORGEFLOW_MAX_TOKENS", defaults.gateway.max_tokens)?,
            max_retries: env.parse("FORGEFLOW_MAX_RETRIES", defaults.gateway.max_retries)?,
            request_timeout_secs: env.parse(
                "FORGEFLOW_REQUEST_TIMEOUT_SECS",
                defaults.gateway.request_timeout_secs,
            )?,
        };

        let artifacts = ArtifactConfig {
            dir: env
                .get("FORGEFLOW_ARTIFACT_DIR")
                .map_or(defaults.artifacts.dir, PathBuf::from),
            retention_secs: env.parse("FORGEFLOW_RETENTION_SECS", defaults.artifacts.retention_secs)?,
            sweep_interval_secs: env.parse(
                "FORGEFLOW_SWEEP_INTERVAL_SECS",
                defaults.artifacts.sweep_interval_secs,
            )?,
        };
        if artifacts.sweep_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "FORGEFLOW_SWEEP_INTERVAL_SECS",
                "0",
                "must be greater than zero",
            ));
        }

        let pipeline = PipelineOptions {
            merge: env.flag("FORGEFLOW_MERGE", defaults.pipeline.merge)?,
            validate: env.flag("FORGEFLOW_VALIDATE", defaults.pipeline.validate)?,
            deployment_instructions: env.flag(
                "FORGEFLOW_DEPLOY",
                defaults.pipeline.deployment_instructions,
            )?,
        };

        Ok(Self {
            gateway,
            artifacts,
            pipeline,
            server: ServerConfig {
                bind: env.string("FORGEFLOW_BIND", defaults.server.bind),
            },
            pipeline_timeout_secs: env.parse(
                "FORGEFLOW_PIPELINE_TIMEOUT_SECS",
                defaults.pipeline_timeout_secs,
            )?,
        })
    }
}

struct Lookup<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|v| v.trim().to_string())
    }

    fn string(&self, key: &str, default: String) -> String {
        self.get(key).filter(|v| !v.is_empty()).unwrap_or(default)
    }

    fn parse<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(key).filter(|v| !v.is_empty()) {
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| ConfigError::invalid(key, raw.as_str(), e.to_string())),
            None => Ok(default),
        }
    }

    fn flag(&self, key: &str, default: bool) -> Result<bool, ConfigError> {
        let Some(raw) = self.get(key).filter(|v| !v.is_empty()) else {
            return Ok(default);
        };
        match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::invalid(key, raw.as_str(), "expected a boolean")),
        }
    }
}

fn parse_dotenv(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.strip_prefix("export ").unwrap_or(line).split_once('='))
        .map(|(k, v)| {
            let v = v.trim();
            let v = v
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| v.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(v);
            (k.trim().to_string(), v.to_string())
        })
        .collect()
}
