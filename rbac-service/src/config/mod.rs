use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_opt, get_env_parsed, Environment};
use service_core::error::AppError;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct RbacConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub grpc_health_port: u16,
    /// Deadline for a whole HTTP request, handler included.
    pub request_timeout_ms: u64,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub enriched_role_ttl_seconds: u64,
    /// Role given to new users whose creation event names none.
    pub default_role: Option<String>,
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

impl RbacConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = Environment::from_env()?;
        let is_prod = environment.is_prod();

        let config = RbacConfig {
            common,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("rbac-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: get_env_opt("OTLP_ENDPOINT"),
            request_timeout_ms: get_env_parsed("REQUEST_TIMEOUT_MS", Some("10000"), is_prod)?,
            grpc_health_port: get_env_parsed("GRPC_HEALTH_PORT", Some("50052"), is_prod)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env_parsed("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: get_env_parsed("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", Some("redis://127.0.0.1:6379"), is_prod)?,
            },
            enriched_role_ttl_seconds: get_env_parsed(
                "ENRICHED_ROLE_TTL_SECONDS",
                Some("300"),
                is_prod,
            )?,
            default_role: get_env_opt("DEFAULT_ROLE").filter(|r| !r.trim().is_empty()),
            allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn enriched_role_ttl(&self) -> Duration {
        Duration::from_secs(self.enriched_role_ttl_seconds)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.request_timeout_ms == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "REQUEST_TIMEOUT_MS must be positive"
            )));
        }

        if self.enriched_role_ttl_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "ENRICHED_ROLE_TTL_SECONDS must be positive"
            )));
        }

        if self.environment == Environment::Prod && self.allowed_origins.iter().any(|o| o == "*")
        {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Wildcard CORS origin not allowed in production"
            )));
        }

        Ok(())
    }
}
