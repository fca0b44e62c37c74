use thiserror::Error;

use crate::config::ConfigError;

/// Failures outside the round loop: configuration and wiring.
/// Nothing inside a run maps to this type; runs always produce a result,
/// and audit write failures are logged by the orchestrator.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("integration failure: {0}")]
    Integration(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "config_validation",
            Self::Integration(_) => "integration",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Integration(_) => 4,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Configuration(_) => {
                "Configuration is invalid. Check shipquote.toml and SHIPQUOTE_* variables."
            }
            Self::Integration(_) => {
                "A remote dependency could not be set up. Please retry shortly."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ConfigError;
    use crate::errors::ApplicationError;

    #[test]
    fn configuration_error_maps_to_config_validation_class() {
        let error = ApplicationError::from(ConfigError::Validation(
            "agent.max_rounds must be in range 1..=20".to_owned(),
        ));

        assert_eq!(error.error_class(), "config_validation");
        assert_eq!(error.exit_code(), 2);
        assert!(error.to_string().contains("agent.max_rounds"));
    }

    #[test]
    fn integration_error_has_user_safe_message() {
        let error = ApplicationError::Integration("http client build failed".to_owned());
        assert_eq!(error.exit_code(), 4);
        assert_eq!(
            error.user_message(),
            "A remote dependency could not be set up. Please retry shortly."
        );
    }
}
