mod app_config;

pub use app_config::{AppConfig, EngineConfig, LlmClientConfig, LogFormat, LoggingConfig};
