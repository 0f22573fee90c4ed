use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_env_opt, get_env_parsed, Environment};
use service_core::error::AppError;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct IamConfig {
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
    pub session: SessionConfig,
    pub rbac: RbacConfig,
    pub rate_limit: RateLimitConfig,
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

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub ttl_seconds: i64,
    /// Send the session cookie with the `Secure` attribute.
    pub secure_cookie: bool,
}

impl SessionConfig {
    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RbacConfig {
    pub url: String,
    pub timeout_ms: u64,
}

impl RbacConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub login_attempts: u32,
    pub login_window_seconds: u64,
}

impl IamConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let environment = Environment::from_env()?;
        let is_prod = environment.is_prod();

        let config = IamConfig {
            common,
            environment: environment.clone(),
            service_name: get_env("SERVICE_NAME", Some("iam-service"), is_prod)?,
            service_version: get_env(
                "SERVICE_VERSION",
                Some(env!("CARGO_PKG_VERSION")),
                is_prod,
            )?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            otlp_endpoint: get_env_opt("OTLP_ENDPOINT"),
            request_timeout_ms: get_env_parsed("REQUEST_TIMEOUT_MS", Some("10000"), is_prod)?,
            grpc_health_port: get_env_parsed("GRPC_HEALTH_PORT", Some("50051"), is_prod)?,
            database: DatabaseConfig {
                url: get_env("DATABASE_URL", None, is_prod)?,
                max_connections: get_env_parsed("DATABASE_MAX_CONNECTIONS", Some("10"), is_prod)?,
                min_connections: get_env_parsed("DATABASE_MIN_CONNECTIONS", Some("1"), is_prod)?,
            },
            redis: RedisConfig {
                url: get_env("REDIS_URL", Some("redis://127.0.0.1:6379"), is_prod)?,
            },
            session: SessionConfig {
                ttl_seconds: get_env_parsed("SESSION_TTL_SECONDS", Some("86400"), is_prod)?,
                secure_cookie: get_env_parsed("SESSION_SECURE_COOKIE", Some("false"), is_prod)?,
            },
            rbac: RbacConfig {
                url: get_env("RBAC_SERVICE_URL", Some("http://127.0.0.1:8081"), is_prod)?,
                timeout_ms: get_env_parsed("RBAC_TIMEOUT_MS", Some("500"), is_prod)?,
            },
            rate_limit: RateLimitConfig {
                login_attempts: get_env_parsed("RATE_LIMIT_LOGIN_ATTEMPTS", Some("5"), is_prod)?,
                login_window_seconds: get_env_parsed(
                    "RATE_LIMIT_LOGIN_WINDOW_SECONDS",
                    Some("900"),
                    is_prod,
                )?,
            },
            allowed_origins: get_env("ALLOWED_ORIGINS", Some("http://localhost:3000"), is_prod)?
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        config.validate()?;
        Ok(config)
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

        if self.session.ttl_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "SESSION_TTL_SECONDS must be positive"
            )));
        }

        if self.rbac.timeout_ms == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "RBAC_TIMEOUT_MS must be positive"
            )));
        }

        if self.environment == Environment::Prod {
            if self.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
            if !self.session.secure_cookie {
                tracing::warn!("Session cookie is sent without the Secure attribute in production");
            }
        }

        Ok(())
    }
}
