//! Configuration loading.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! command line flags (applied by the caller). API keys never live in the file.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::{Error, Provider};

/// LLM provider settings (`[llm]`).
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Provider,
    /// Overrides the provider's default model.
    pub model: Option<String>,
    /// Overrides the provider's default API base URL.
    pub api_base: Option<String>,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

/// HTTP server settings (`[server]`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Include error details in 500 responses.
    pub debug: bool,
}

/// Query pipeline settings (`[agent]`).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// How many prior chat messages are sent along with a question.
    pub history_limit: usize,
    /// Rows returned per answer; extra rows are dropped.
    pub max_rows: usize,
    /// Ask the LLM to phrase the answer instead of listing rows.
    pub summarize: bool,
}

/// Sample data settings (`[seed]`).
#[derive(Debug, Clone)]
pub struct SeedConfig {
    /// Seed the properties table when the server starts.
    pub enabled: bool,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub agent: AgentConfig,
    pub seed: SeedConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            llm: LlmConfig {
                provider: Provider::OpenAi,
                model: None,
                api_base: None,
                temperature: 0.0,
                timeout_seconds: 60,
                max_retries: 2,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                debug: false,
            },
            agent: AgentConfig {
                history_limit: 10,
                max_rows: 100,
                summarize: true,
            },
            seed: SeedConfig {
                enabled: true,
                rows: 5000,
            },
        }
    }
}

#[derive(Deserialize, Default)]
struct RawConfig {
    log_level: Option<String>,
    #[serde(default)]
    llm: RawLlm,
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    agent: RawAgent,
    #[serde(default)]
    seed: RawSeed,
}

#[derive(Deserialize, Default)]
struct RawLlm {
    provider: Option<Provider>,
    model: Option<String>,
    api_base: Option<String>,
    temperature: Option<f32>,
    timeout_seconds: Option<u64>,
    max_retries: Option<u32>,
}

#[derive(Deserialize, Default)]
struct RawServer {
    host: Option<String>,
    port: Option<u16>,
    debug: Option<bool>,
}

#[derive(Deserialize, Default)]
struct RawAgent {
    history_limit: Option<usize>,
    max_rows: Option<usize>,
    summarize: Option<bool>,
}

#[derive(Deserialize, Default)]
struct RawSeed {
    enabled: Option<bool>,
    rows: Option<usize>,
}

impl Config {
    /// Load defaults, overlaid with `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml(text: &str) -> Result<Self, Error> {
        let raw: RawConfig = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        let mut config = Self::default();

        if let Some(level) = raw.log_level {
            config.log_level = level;
        }

        let llm = &mut config.llm;
        if let Some(p) = raw.llm.provider {
            llm.provider = p;
        }
        llm.model = raw.llm.model.or(llm.model.take());
        llm.api_base = raw.llm.api_base.or(llm.api_base.take());
        if let Some(t) = raw.llm.temperature {
            llm.temperature = t;
        }
        if let Some(t) = raw.llm.timeout_seconds {
            llm.timeout_seconds = t;
        }
        if let Some(r) = raw.llm.max_retries {
            llm.max_retries = r;
        }

        let server = &mut config.server;
        if let Some(h) = raw.server.host {
            server.host = h;
        }
        if let Some(p) = raw.server.port {
            server.port = p;
        }
        if let Some(d) = raw.server.debug {
            server.debug = d;
        }

        let agent = &mut config.agent;
        if let Some(n) = raw.agent.history_limit {
            agent.history_limit = n;
        }
        if let Some(n) = raw.agent.max_rows {
            if n == 0 {
                return Err(Error::Config("agent.max_rows must be at least 1".into()));
            }
            agent.max_rows = n;
        }
        if let Some(s) = raw.agent.summarize {
            agent.summarize = s;
        }

        if let Some(e) = raw.seed.enabled {
            config.seed.enabled = e;
        }
        if let Some(r) = raw.seed.rows {
            config.seed.rows = r;
        }

        Ok(config)
    }
}
