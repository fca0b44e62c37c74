use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_MAX_ROUNDS: u32 = 3;
pub const MAX_ROUNDS_LIMIT: u32 = 20;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub tools: ToolsConfig,
    pub agent: AgentConfig,
    pub audit: AuditConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: Option<SecretString>,
    pub base_url: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub temperature: f32,
}

/// Where the three lookup operations live.
#[derive(Clone, Debug)]
pub struct ToolsConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub openapi_catalog: bool,
}

#[derive(Clone, Debug)]
pub struct AgentConfig {
    pub max_rounds: u32,
}

#[derive(Clone, Debug)]
pub struct AuditConfig {
    pub enabled: bool,
    pub path: PathBuf,
}

/// Settings for the bundled lookup service.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub request_log_path: PathBuf,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    #[serde(rename = "openai")]
    OpenAi,
    Ollama,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub llm_provider: Option<LlmProvider>,
    pub llm_model: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub tools_base_url: Option<String>,
    pub max_rounds: Option<u32>,
    pub audit_enabled: Option<bool>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: LlmProvider::Ollama,
                api_key: None,
                base_url: Some("http://localhost:11434/v1".to_string()),
                model: "llama3.1".to_string(),
                timeout_secs: 60,
                max_retries: 1,
                temperature: 0.0,
            },
            tools: ToolsConfig {
                base_url: "http://localhost:9000".to_string(),
                timeout_secs: 10,
                openapi_catalog: true,
            },
            agent: AgentConfig { max_rounds: DEFAULT_MAX_ROUNDS },
            audit: AuditConfig { enabled: false, path: PathBuf::from("runs.jsonl") },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 9000,
                request_log_path: PathBuf::from("tool_calls.jsonl"),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::Validation(format!(
                "unsupported llm provider `{other}` (expected openai|ollama)"
            ))),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("shipquote.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(llm) = patch.llm {
            if let Some(provider) = llm.provider {
                self.llm.provider = provider;
            }
            if let Some(llm_api_key_value) = llm.api_key {
                self.llm.api_key = Some(secret_value(llm_api_key_value));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = Some(base_url);
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
            if let Some(max_retries) = llm.max_retries {
                self.llm.max_retries = max_retries;
            }
            if let Some(temperature) = llm.temperature {
                self.llm.temperature = temperature;
            }
        }

        if let Some(tools) = patch.tools {
            if let Some(base_url) = tools.base_url {
                self.tools.base_url = base_url;
            }
            if let Some(timeout_secs) = tools.timeout_secs {
                self.tools.timeout_secs = timeout_secs;
            }
            if let Some(openapi_catalog) = tools.openapi_catalog {
                self.tools.openapi_catalog = openapi_catalog;
            }
        }

        if let Some(agent) = patch.agent {
            if let Some(max_rounds) = agent.max_rounds {
                self.agent.max_rounds = max_rounds;
            }
        }

        if let Some(audit) = patch.audit {
            if let Some(enabled) = audit.enabled {
                self.audit.enabled = enabled;
            }
            if let Some(path) = audit.path {
                self.audit.path = path;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(request_log_path) = server.request_log_path {
                self.server.request_log_path = request_log_path;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SHIPQUOTE_LLM_PROVIDER") {
            self.llm.provider = value.parse()?;
        }
        if let Some(value) = read_env("SHIPQUOTE_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("SHIPQUOTE_LLM_BASE_URL") {
            self.llm.base_url = Some(value);
        }
        if let Some(value) = read_env("SHIPQUOTE_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("SHIPQUOTE_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("SHIPQUOTE_LLM_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SHIPQUOTE_LLM_MAX_RETRIES") {
            self.llm.max_retries = parse_u32("SHIPQUOTE_LLM_MAX_RETRIES", &value)?;
        }
        if let Some(value) = read_env("SHIPQUOTE_LLM_TEMPERATURE") {
            self.llm.temperature = parse_f32("SHIPQUOTE_LLM_TEMPERATURE", &value)?;
        }

        if let Some(value) = read_env("SHIPQUOTE_TOOLS_BASE_URL") {
            self.tools.base_url = value;
        }
        if let Some(value) = read_env("SHIPQUOTE_TOOLS_TIMEOUT_SECS") {
            self.tools.timeout_secs = parse_u64("SHIPQUOTE_TOOLS_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("SHIPQUOTE_TOOLS_OPENAPI_CATALOG") {
            self.tools.openapi_catalog = parse_bool("SHIPQUOTE_TOOLS_OPENAPI_CATALOG", &value)?;
        }

        if let Some(value) = read_env("SHIPQUOTE_AGENT_MAX_ROUNDS") {
            self.agent.max_rounds = parse_u32("SHIPQUOTE_AGENT_MAX_ROUNDS", &value)?;
        }

        if let Some(value) = read_env("SHIPQUOTE_AUDIT_ENABLED") {
            self.audit.enabled = parse_bool("SHIPQUOTE_AUDIT_ENABLED", &value)?;
        }
        if let Some(value) = read_env("SHIPQUOTE_AUDIT_PATH") {
            self.audit.path = PathBuf::from(value);
        }

        if let Some(value) = read_env("SHIPQUOTE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SHIPQUOTE_SERVER_PORT") {
            self.server.port = parse_u16("SHIPQUOTE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("SHIPQUOTE_SERVER_REQUEST_LOG_PATH") {
            self.server.request_log_path = PathBuf::from(value);
        }

        let log_level =
            read_env("SHIPQUOTE_LOGGING_LEVEL").or_else(|| read_env("SHIPQUOTE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SHIPQUOTE_LOGGING_FORMAT").or_else(|| read_env("SHIPQUOTE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(llm_provider) = overrides.llm_provider {
            self.llm.provider = llm_provider;
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
        if let Some(llm_base_url) = overrides.llm_base_url {
            self.llm.base_url = Some(llm_base_url);
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(tools_base_url) = overrides.tools_base_url {
            self.tools.base_url = tools_base_url;
        }
        if let Some(max_rounds) = overrides.max_rounds {
            self.agent.max_rounds = max_rounds;
        }
        if let Some(audit_enabled) = overrides.audit_enabled {
            self.audit.enabled = audit_enabled;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_llm(&self.llm)?;
        validate_tools(&self.tools)?;
        validate_agent(&self.agent)?;
        validate_audit(&self.audit)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("shipquote.toml"), PathBuf::from("config/shipquote.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn is_http_url(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("http://") || value.starts_with("https://")
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    if !(0.0..=2.0).contains(&llm.temperature) {
        return Err(ConfigError::Validation(
            "llm.temperature must be in range 0.0..=2.0".to_string(),
        ));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    match llm.provider {
        LlmProvider::OpenAi => {
            let missing = llm
                .api_key
                .as_ref()
                .map(|value| value.expose_secret().trim().is_empty())
                .unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.api_key is required for the openai provider (any non-empty value for local OpenAI-compatible servers)".to_string(),
                ));
            }
        }
        LlmProvider::Ollama => {
            let missing =
                llm.base_url.as_ref().map(|value| value.trim().is_empty()).unwrap_or(true);
            if missing {
                return Err(ConfigError::Validation(
                    "llm.base_url is required for ollama provider".to_string(),
                ));
            }
        }
    }

    if let Some(base_url) = &llm.base_url {
        if !is_http_url(base_url) {
            return Err(ConfigError::Validation(
                "llm.base_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_tools(tools: &ToolsConfig) -> Result<(), ConfigError> {
    if !is_http_url(&tools.base_url) {
        return Err(ConfigError::Validation(
            "tools.base_url must start with http:// or https://".to_string(),
        ));
    }

    if tools.timeout_secs == 0 || tools.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "tools.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_agent(agent: &AgentConfig) -> Result<(), ConfigError> {
    if agent.max_rounds == 0 || agent.max_rounds > MAX_ROUNDS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "agent.max_rounds must be in range 1..={MAX_ROUNDS_LIMIT}"
        )));
    }

    Ok(())
}

fn validate_audit(audit: &AuditConfig) -> Result<(), ConfigError> {
    if audit.enabled && audit.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "audit.path is required when audit.enabled is true".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_f32(key: &str, value: &str) -> Result<f32, ConfigError> {
    value.parse::<f32>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| invalid_override(key, value))
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    llm: Option<LlmPatch>,
    tools: Option<ToolsPatch>,
    agent: Option<AgentPatch>,
    audit: Option<AuditPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    provider: Option<LlmProvider>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    temperature: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct ToolsPatch {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    openapi_catalog: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct AgentPatch {
    max_rounds: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct AuditPatch {
    enabled: Option<bool>,
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    request_log_path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
