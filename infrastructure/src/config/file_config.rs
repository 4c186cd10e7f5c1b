//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use domain types where appropriate.

use crate::providers::chat_completions::DEFAULT_API_URL;
use council_application::CouncilConfig;
use council_domain::{Model, OutputFormat};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("backend.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("storage.pool_size cannot be 0")]
    InvalidPoolSize,

    #[error("{0}: model name cannot be empty")]
    EmptyModelName(String),

    #[error("council.models cannot be empty")]
    EmptyCouncil,
}

/// Raw council configuration from TOML
///
/// ```toml
/// [council]
/// models = ["llama-3.3-70b-versatile", "openai/gpt-oss-120b"]
/// chairman = "llama-3.3-70b-versatile"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Models queried in parallel
    pub models: Vec<Model>,
    /// Model that writes the final synthesis
    pub chairman: Model,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            models: Model::default_council(),
            chairman: Model::default_chairman(),
        }
    }
}

/// Raw backend configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// OpenAI-compatible chat completions endpoint
    pub api_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline API key; takes precedence over `api_key_env`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Timeout in seconds for a single backend call
    pub timeout_seconds: u64,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            api_key: None,
            timeout_seconds: 120,
        }
    }
}

impl FileBackendConfig {
    /// Inline key first, then the named environment variable.
    ///
    /// Blank values count as missing.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Raw storage configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// Maximum number of open connections
    pub pool_size: usize,
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("llm-council.db"),
            pool_size: 10,
        }
    }
}

/// Raw output configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Output format (uses domain type)
    pub format: Option<OutputFormat>,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub council: FileCouncilConfig,
    pub backend: FileBackendConfig,
    pub storage: FileStorageConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Validate the configuration, reporting the first problem found
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.backend.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if self.storage.pool_size == 0 {
            return Err(ConfigValidationError::InvalidPoolSize);
        }
        if self.council.models.is_empty() {
            return Err(ConfigValidationError::EmptyCouncil);
        }
        if self.council.models.iter().any(Model::is_blank) {
            return Err(ConfigValidationError::EmptyModelName(
                "council.models".to_string(),
            ));
        }
        if self.council.chairman.is_blank() {
            return Err(ConfigValidationError::EmptyModelName(
                "council.chairman".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the application-level council configuration
    pub fn to_council_config(&self) -> CouncilConfig {
        CouncilConfig::new(self.council.models.clone(), self.council.chairman.clone())
            .with_timeout_seconds(self.backend.timeout_seconds)
    }

    /// Copy safe to print: the inline API key is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if config.backend.api_key.is_some() {
            config.backend.api_key = Some("********".to_string());
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[council]
models = ["model-a", "model-b"]
chairman = "model-a"

[backend]
api_url = "http://localhost:8080/v1/chat/completions"
api_key_env = "MY_KEY"
timeout_seconds = 30

[storage]
database_path = "/tmp/council.db"
pool_size = 4

[output]
format = "full"
color = false
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.council.models,
            vec![Model::new("model-a"), Model::new("model-b")]
        );
        assert_eq!(config.council.chairman, Model::new("model-a"));
        assert_eq!(config.backend.api_key_env, "MY_KEY");
        assert_eq!(config.backend.timeout(), Duration::from_secs(30));
        assert_eq!(config.storage.pool_size, 4);
        assert_eq!(config.output.format, Some(OutputFormat::Full));
        assert!(!config.output.color);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[backend]
timeout_seconds = 15
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.backend.timeout_seconds, 15);
        // Defaults should apply
        assert_eq!(config.council.models, Model::default_council());
        assert_eq!(config.backend.api_url, DEFAULT_API_URL);
        assert_eq!(config.storage.database_path, PathBuf::from("llm-council.db"));
        assert!(config.output.color);
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.api_key_env, "GROQ_API_KEY");
        assert_eq!(config.storage.pool_size, 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = FileConfig::default();
        config.backend.timeout_seconds = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidTimeout));

        let mut config = FileConfig::default();
        config.storage.pool_size = 0;
        assert_eq!(config.validate(), Err(ConfigValidationError::InvalidPoolSize));

        let mut config = FileConfig::default();
        config.council.models.clear();
        assert_eq!(config.validate(), Err(ConfigValidationError::EmptyCouncil));

        let mut config = FileConfig::default();
        config.council.models.push(Model::new("  "));
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyModelName(_))
        ));
    }

    #[test]
    fn test_inline_api_key_wins() {
        let backend = FileBackendConfig {
            api_key: Some("inline-key".to_string()),
            api_key_env: "LLM_COUNCIL_TEST_UNSET_VARIABLE".to_string(),
            ..Default::default()
        };
        assert_eq!(backend.resolve_api_key(), Some("inline-key".to_string()));

        let backend = FileBackendConfig {
            api_key: Some("   ".to_string()),
            api_key_env: "LLM_COUNCIL_TEST_UNSET_VARIABLE".to_string(),
            ..Default::default()
        };
        assert_eq!(backend.resolve_api_key(), None);
    }

    #[test]
    fn test_to_council_config() {
        let mut config = FileConfig::default();
        config.backend.timeout_seconds = 42;
        let council = config.to_council_config();
        assert_eq!(council.models, Model::default_council());
        assert_eq!(council.timeout, Duration::from_secs(42));
    }

    #[test]
    fn test_redacted_masks_inline_key() {
        let mut config = FileConfig::default();
        config.backend.api_key = Some("secret".to_string());
        let shown = toml::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("secret"));
    }
}
