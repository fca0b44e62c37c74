use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::ExposeSecret;
use shipquote_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let api_key = match &config.llm.api_key {
        Some(api_key) => redact_token(api_key.expose_secret()),
        None => "<unset>".to_string(),
    };

    let fields: Vec<(&str, String, &str)> = vec![
        ("llm.provider", format!("{:?}", config.llm.provider), "SHIPQUOTE_LLM_PROVIDER"),
        ("llm.model", config.llm.model.clone(), "SHIPQUOTE_LLM_MODEL"),
        (
            "llm.base_url",
            config.llm.base_url.clone().unwrap_or_else(|| "<unset>".to_string()),
            "SHIPQUOTE_LLM_BASE_URL",
        ),
        ("llm.api_key", api_key, "SHIPQUOTE_LLM_API_KEY"),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), "SHIPQUOTE_LLM_TIMEOUT_SECS"),
        ("llm.max_retries", config.llm.max_retries.to_string(), "SHIPQUOTE_LLM_MAX_RETRIES"),
        ("llm.temperature", config.llm.temperature.to_string(), "SHIPQUOTE_LLM_TEMPERATURE"),
        ("tools.base_url", config.tools.base_url.clone(), "SHIPQUOTE_TOOLS_BASE_URL"),
        (
            "tools.timeout_secs",
            config.tools.timeout_secs.to_string(),
            "SHIPQUOTE_TOOLS_TIMEOUT_SECS",
        ),
        (
            "tools.openapi_catalog",
            config.tools.openapi_catalog.to_string(),
            "SHIPQUOTE_TOOLS_OPENAPI_CATALOG",
        ),
        ("agent.max_rounds", config.agent.max_rounds.to_string(), "SHIPQUOTE_AGENT_MAX_ROUNDS"),
        ("audit.enabled", config.audit.enabled.to_string(), "SHIPQUOTE_AUDIT_ENABLED"),
        ("audit.path", config.audit.path.display().to_string(), "SHIPQUOTE_AUDIT_PATH"),
        (
            "server.bind_address",
            config.server.bind_address.clone(),
            "SHIPQUOTE_SERVER_BIND_ADDRESS",
        ),
        ("server.port", config.server.port.to_string(), "SHIPQUOTE_SERVER_PORT"),
        (
            "server.request_log_path",
            config.server.request_log_path.display().to_string(),
            "SHIPQUOTE_SERVER_REQUEST_LOG_PATH",
        ),
        (
            "logging.level",
            config.logging.level.clone(),
            "SHIPQUOTE_LOGGING_LEVEL",
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format),
            "SHIPQUOTE_LOGGING_FORMAT",
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    lines.extend(fields.into_iter().map(|(key, value, env_key)| {
        let source =
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref());
        render_line(key, &value, source)
    }));

    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    ["shipquote.toml", "config/shipquote.toml"]
        .into_iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let candidates = [Some(env_key), short_alias(env_key)];
    if let Some(env_key) = candidates.into_iter().flatten().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

/// `SHIPQUOTE_LOG_*` is accepted alongside `SHIPQUOTE_LOGGING_*`.
fn short_alias(env_key: &str) -> Option<&'static str> {
    match env_key {
        "SHIPQUOTE_LOGGING_LEVEL" => Some("SHIPQUOTE_LOG_LEVEL"),
        "SHIPQUOTE_LOGGING_FORMAT" => Some("SHIPQUOTE_LOG_FORMAT"),
        _ => None,
    }
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

/// Keeps a vendor prefix such as `sk-` and hides the rest.
fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}

#[cfg(test)]
mod tests {
    use super::{contains_path, redact_token};

    #[test]
    fn tokens_keep_only_their_prefix() {
        assert_eq!(redact_token("sk-proj-abcdef"), "sk-***");
        assert_eq!(redact_token("local"), "<redacted>");
        assert_eq!(redact_token("  "), "<empty>");
    }

    #[test]
    fn dotted_paths_are_looked_up_in_nested_tables() {
        let doc = "[llm]\nmodel = \"llama3.1\"\n".parse::<toml::Value>().expect("toml");
        assert!(contains_path(&doc, "llm.model"));
        assert!(!contains_path(&doc, "llm.base_url"));
        assert!(!contains_path(&doc, "tools.base_url"));
    }
}
