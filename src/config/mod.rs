use anyhow::{anyhow, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Placeholder secret written into freshly generated config files
pub const PLACEHOLDER_SECRET: &str = "change_me_in_production";

/// Deployment environment. Controls the `Secure` flag on session cookies.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }

    pub fn is_production(&self) -> bool {
        *self == Environment::Production
    }
}

/// HTTP server configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the server binds to, e.g. `127.0.0.1:8080`
    pub bind_address: String,
    /// Number of worker threads (0 = one per core)
    pub workers: usize,
}

/// Database configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Maximum number of connections in the connection pool
    pub max_connections: u32,
}

/// Security configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    /// Secret used to sign session tokens (HS256)
    pub jwt_secret: String,
    /// Session token validity in minutes
    pub token_validity: i64,
    /// Issuer claim stamped into every session token
    pub token_issuer: String,
    /// Argon2 memory cost in kibibytes
    pub password_memory_kib: u32,
    /// Optional server-side pepper mixed into every password hash
    #[serde(default)]
    pub password_pepper: Option<String>,
}

/// Session cookie and route protection configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionConfig {
    /// Name of the cookie carrying the session token
    pub cookie_name: String,
    /// Path prefixes that require a valid session
    pub protected_prefixes: Vec<String>,
    /// Where unauthenticated requests to protected paths are redirected
    pub sign_in_path: String,
}

/// External OTP service configuration (client side)
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OtpConfig {
    /// Base URL of the OTP / identity API, e.g. `https://api.example.com`
    pub api_base_url: String,
    /// Request timeout in seconds
    pub request_timeout_secs: u64,
    /// Verification attempts allowed per challenge
    pub max_attempts: u32,
    /// Seconds between resend requests
    pub resend_cooldown_secs: i64,
    /// Number of digits in a code
    pub code_length: usize,
}

/// Global application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Application name
    pub app_name: String,
    /// Deployment environment
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub session: SessionConfig,
    pub otp: OtpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Sabjaano".to_string(),
            environment: Environment::Development,
            server: ServerConfig {
                bind_address: "127.0.0.1:8080".to_string(),
                workers: 0,
            },
            database: DatabaseConfig {
                path: "data/sabjaano.db".to_string(),
                max_connections: 10,
            },
            security: SecurityConfig {
                jwt_secret: PLACEHOLDER_SECRET.to_string(),
                token_validity: 120, // 2 hours
                token_issuer: "sabjaano".to_string(),
                password_memory_kib: 19456,
                password_pepper: None,
            },
            session: SessionConfig {
                cookie_name: "token".to_string(),
                protected_prefixes: vec![
                    "/dashboard".to_string(),
                    "/locations".to_string(),
                    "/api/secure".to_string(),
                ],
                sign_in_path: "/signin".to_string(),
            },
            otp: OtpConfig {
                api_base_url: "http://localhost:5000/api".to_string(),
                request_timeout_secs: 15,
                max_attempts: 5,
                resend_cooldown_secs: 30,
                code_length: 6,
            },
        }
    }
}

impl Config {
    /// Apply environment variable overrides on top of the file values
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(secret) = env::var("JWT_SECRET") {
            debug!("Using JWT secret from environment");
            self.security.jwt_secret = secret;
        }
        if let Ok(path) = env::var("DATABASE_PATH") {
            self.database.path = path;
        }
        if let Ok(addr) = env::var("BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Ok(url) = env::var("OTP_API_BASE_URL") {
            self.otp.api_base_url = url;
        }
        if let Ok(app_env) = env::var("APP_ENV") {
            self.environment = Environment::from_str(&app_env).map_err(|e| anyhow!(e))?;
        }
        Ok(())
    }

    /// Reject configurations the server must not start with
    pub fn validate(&self) -> Result<()> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err(anyhow!("security.jwt_secret must not be empty"));
        }
        if self.security.jwt_secret == PLACEHOLDER_SECRET {
            if self.environment.is_production() {
                return Err(anyhow!(
                    "security.jwt_secret still holds the placeholder value; set JWT_SECRET"
                ));
            }
            warn!("Using the placeholder JWT secret; do not run like this in production");
        }
        if self.security.token_validity <= 0 {
            return Err(anyhow!("security.token_validity must be positive"));
        }
        if self.otp.max_attempts == 0 {
            return Err(anyhow!("otp.max_attempts must be at least 1"));
        }
        for prefix in &self.session.protected_prefixes {
            if !prefix.starts_with('/') {
                return Err(anyhow!("Protected prefix must start with '/': {}", prefix));
            }
        }
        Ok(())
    }
}

/// Load configuration from file, creating a default one if it does not exist
pub fn load_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        let default_config = Config::default();
        save_config(path, &default_config)?;
        return Ok(default_config);
    }

    let mut file = File::open(path).context(format!("Failed to open config file: {}", path))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents).context("Failed to read config file")?;

    let config: Config = match path.ends_with(".toml") {
        true => toml::from_str(&contents).context("Failed to parse TOML config")?,
        false => serde_json::from_str(&contents).context("Failed to parse JSON config")?,
    };

    Ok(config)
}

/// Save configuration to file
pub fn save_config(path: &str, config: &Config) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
    }

    let serialized = match path.ends_with(".toml") {
        true => toml::to_string_pretty(config).context("Failed to serialize config to TOML")?,
        false => serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")?,
    };

    std::fs::write(path, serialized).context(format!("Failed to write config to file: {}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.app_name, "Sabjaano");
        assert_eq!(config.security.token_validity, 120);
        assert_eq!(config.session.cookie_name, "token");
        assert_eq!(config.otp.max_attempts, 5);
        assert_eq!(config.otp.resend_cooldown_secs, 30);
        assert!(config.session.protected_prefixes.contains(&"/dashboard".to_string()));
    }

    #[test]
    fn test_load_save_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("test_config.toml");
        let config_path_str = config_path.to_str().unwrap();

        let mut config = Config::default();
        config.environment = Environment::Production;
        config.security.jwt_secret = "file-secret".to_string();
        save_config(config_path_str, &config).unwrap();

        let loaded = load_config(config_path_str).unwrap();

        assert_eq!(loaded.app_name, config.app_name);
        assert_eq!(loaded.environment, Environment::Production);
        assert_eq!(loaded.security.jwt_secret, "file-secret");
        assert_eq!(loaded.session.protected_prefixes, config.session.protected_prefixes);
    }

    #[test]
    fn test_missing_file_writes_default() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nested").join("config.json");
        let config_path_str = config_path.to_str().unwrap();

        let loaded = load_config(config_path_str).unwrap();
        assert!(config_path.exists());
        assert_eq!(loaded.database.max_connections, 10);
    }

    #[test]
    fn test_placeholder_secret_rejected_in_production() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.environment = Environment::Production;
        assert!(config.validate().is_err());

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());

        config.security.jwt_secret = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!(Environment::from_str("PRODUCTION").unwrap(), Environment::Production);
        assert_eq!(Environment::from_str("dev").unwrap(), Environment::Development);
        assert!(Environment::from_str("staging").is_err());
    }
}
