use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub engine: EngineConfig,
    pub llm: LlmClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings for workflow runs
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Each run writes downloads into `<download_root>/<instance id>`
    pub download_root: PathBuf,
    /// Binary used for headless Word to PDF conversion
    pub libreoffice_binary: String,
}

/// HTTP client settings for LLM sources
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmClientConfig {
    pub timeout_secs: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            download_root: PathBuf::from("downloads"),
            libreoffice_binary: "soffice".to_string(),
        }
    }
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 120 }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("DOCWEAVE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.logging.level, "info");
        assert!(matches!(config.logging.format, LogFormat::Pretty));
        assert_eq!(config.engine.download_root, PathBuf::from("downloads"));
        assert_eq!(config.engine.libreoffice_binary, "soffice");
        assert_eq!(config.llm.timeout_secs, 120);
    }

    #[test]
    fn test_partial_sections_fall_back_to_defaults() {
        let config: AppConfig = serde_json::from_str(
            r#"{"engine": {"download_root": "/srv/docweave"}, "logging": {"format": "json"}}"#,
        )
        .unwrap();

        assert_eq!(config.engine.download_root, PathBuf::from("/srv/docweave"));
        assert_eq!(config.engine.libreoffice_binary, "soffice");
        assert!(matches!(config.logging.format, LogFormat::Json));
        assert_eq!(config.logging.level, "info");
    }
}
