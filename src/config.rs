use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::retry::RetryConfig;

/// Main configuration structure for verigate
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VerigateConfig {
    /// Backend API settings
    pub api: ApiConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    /// GraphQL endpoint of the application backend
    pub endpoint: String,
    /// Session token sent as a bearer credential (can be set via env var)
    pub session_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
    /// Client-side rate limiting
    pub rate_limit: RateLimitConfig,
    /// Read-query response cache
    pub cache: CacheConfig,
    /// Retry policy for idempotent read queries
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    /// Requests per second limit
    pub requests_per_second: u32,
    /// Burst capacity
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum cached query responses
    pub max_entries: u64,
    /// Time-to-live for cached responses in seconds
    pub ttl_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Emit structured JSON logs instead of plain text
    pub json_logs: bool,
    /// Log level when RUST_LOG is not set
    pub log_level: String,
}

impl Default for VerigateConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                endpoint: "http://localhost:5678/graphql".to_string(),
                session_token: None, // Read from env var or .verigate-rc
                timeout_seconds: 30,
                rate_limit: RateLimitConfig {
                    requests_per_second: 5,
                    burst_capacity: 10,
                },
                cache: CacheConfig {
                    max_entries: 1000,
                    ttl_seconds: 300,
                },
                retry: RetryConfig::default(),
            },
            observability: ObservabilityConfig {
                json_logs: true,
                log_level: "info".to_string(),
            },
        }
    }
}

impl VerigateConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (verigate.toml, .verigate-rc)
    /// 3. Environment variables (prefixed with VERIGATE_)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("verigate.toml").exists() {
            builder = builder.add_source(File::with_name("verigate"));
        }

        if Path::new(".verigate-rc").exists() {
            builder = builder.add_source(File::with_name(".verigate-rc"));
        }

        builder = builder.add_source(
            Environment::with_prefix("VERIGATE")
                .separator("_")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let mut verigate_config: VerigateConfig = config.try_deserialize()?;

        // The session token nests awkwardly under the env separator, so it is
        // honored from a dedicated variable as well.
        if verigate_config.api.session_token.is_none() {
            if let Ok(token) = std::env::var("VERIGATE_SESSION_TOKEN") {
                verigate_config.api.session_token = Some(token);
            }
        }

        Ok(verigate_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<VerigateConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = VerigateConfig::load_env_file();
        VerigateConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static VerigateConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("verigate.toml");

        let config = VerigateConfig::default();
        config.save_to_file(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: VerigateConfig = toml::from_str(&written).unwrap();

        assert_eq!(parsed.api.endpoint, config.api.endpoint);
        assert_eq!(parsed.api.timeout_seconds, 30);
        assert_eq!(parsed.api.rate_limit.requests_per_second, 5);
        assert_eq!(parsed.api.cache.ttl_seconds, 300);
        assert_eq!(parsed.observability.log_level, "info");
    }

    #[test]
    fn default_session_token_is_unset() {
        let config = VerigateConfig::default();
        assert!(config.api.session_token.is_none());
    }
}
