use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub security: SecurityConfig,
    pub pagination: PaginationConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Built frontend served in production mode
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub uri: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base host, possibly the web console host (`console-<service>...`)
    pub endpoint: String,
    pub use_ssl: bool,
    pub port: String,
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    #[serde(skip_serializing)]
    pub secret_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub max_limit: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env` but reading from a map (tests, CLI overrides)
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").or_else(|| lookup("NODE_ENV")).as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            _ => Environment::Development,
        };

        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let base = match environment {
            Environment::Production => Self::production(),
            Environment::Development => Self::development(),
        };

        let mut config = Self {
            database: DatabaseConfig {
                uri: required("MONGODB_URI")?,
                ..base.database
            },
            storage: StorageConfig {
                access_key: required("MINIO_ACCESS_KEY")?,
                secret_key: required("MINIO_SECRET_KEY")?,
                ..base.storage
            },
            security: SecurityConfig {
                jwt_secret: required("JWT_SECRET")?,
                ..base.security
            },
            ..base
        };

        config.apply_overrides(&lookup);
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F)
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server overrides
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("STATIC_DIR") {
            self.server.static_dir = PathBuf::from(v);
        }

        // Database overrides
        if let Some(v) = lookup("MONGODB_DATABASE") {
            self.database.name = v;
        }

        // Object store overrides
        if let Some(v) = lookup("MINIO_ENDPOINT") {
            self.storage.endpoint = v;
        }
        if let Some(v) = lookup("MINIO_USE_SSL") {
            self.storage.use_ssl = v != "false";
        }
        if let Some(v) = lookup("MINIO_PORT") {
            self.storage.port = v;
        }
        if let Some(v) = lookup("MINIO_REGION") {
            self.storage.region = v;
        }
        if let Some(v) = lookup("MINIO_BUCKET") {
            self.storage.bucket = v;
        }

        // Security overrides
        if let Some(v) = lookup("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        if let Some(v) = lookup("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = v.parse().unwrap_or(self.pagination.max_limit);
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3001,
                static_dir: PathBuf::from("public"),
            },
            database: DatabaseConfig {
                uri: String::new(),
                name: "atendimentos".to_string(),
            },
            storage: StorageConfig {
                endpoint: "localhost".to_string(),
                use_ssl: true,
                port: "443".to_string(),
                region: "us-east-1".to_string(),
                bucket: "primazzo".to_string(),
                access_key: String::new(),
                secret_key: String::new(),
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            pagination: PaginationConfig { max_limit: 1000 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            pagination: PaginationConfig { max_limit: 500 },
            ..Self::development()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required_vars() -> HashMap<String, String> {
        [
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("MINIO_ACCESS_KEY", "access"),
            ("MINIO_SECRET_KEY", "secret"),
            ("JWT_SECRET", "jwt-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_defaults_with_required_vars() {
        let config = AppConfig::from_map(&required_vars()).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.database.name, "atendimentos");
        assert_eq!(config.storage.bucket, "primazzo");
        assert_eq!(config.storage.region, "us-east-1");
        assert!(config.storage.use_ssl);
        assert_eq!(config.security.jwt_expiry_hours, 24);
    }

    #[test]
    fn test_missing_secret_is_an_error() {
        let mut vars = required_vars();
        vars.remove("JWT_SECRET");
        let err = AppConfig::from_map(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn test_blank_connection_string_is_missing() {
        let mut vars = required_vars();
        vars.insert("MONGODB_URI".into(), "  ".into());
        assert!(matches!(
            AppConfig::from_map(&vars),
            Err(ConfigError::Missing("MONGODB_URI"))
        ));
    }

    #[test]
    fn test_overrides() {
        let mut vars = required_vars();
        vars.insert("NODE_ENV".into(), "production".into());
        vars.insert("PORT".into(), "8080".into());
        vars.insert("MINIO_USE_SSL".into(), "false".into());
        vars.insert("JWT_EXPIRY_HOURS".into(), "not-a-number".into());

        let config = AppConfig::from_map(&vars).unwrap();
        assert!(config.is_production());
        assert_eq!(config.server.port, 8080);
        assert!(!config.storage.use_ssl);
        assert_eq!(config.security.jwt_expiry_hours, 24);
        assert_eq!(config.pagination.max_limit, 500);
    }
}
