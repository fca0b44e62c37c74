pub mod config;
pub mod demo;
pub mod run;
pub mod session;
pub mod tools;

use serde::Serialize;
use shipquote_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use shipquote_core::ApplicationError;
use tokio::runtime::Runtime;

/// Exit code for a run that finished without a complete set of quotes.
pub const NO_QUOTE_EXIT_CODE: u8 = 3;

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub fn from_error(command: &str, error: &ApplicationError) -> Self {
        Self::failure(
            command,
            error.error_class(),
            format!("{} ({error})", error.user_message()),
            error.exit_code(),
        )
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(overrides: ConfigOverrides) -> Result<AppConfig, ApplicationError> {
    Ok(AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() })?)
}

pub(crate) fn current_thread_runtime() -> Result<Runtime, ApplicationError> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        ApplicationError::Integration(format!("failed to initialize async runtime: {error}"))
    })
}

/// Installs the stderr subscriber once; later calls keep the first one.
pub fn init_logging(config: &AppConfig) {
    use shipquote_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        Compact => builder.compact().try_init(),
        Pretty => builder.pretty().try_init(),
        Json => builder.json().try_init(),
    };
}
