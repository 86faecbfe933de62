//! Server configuration.
//!
//! Layered with the `config` crate, later layers winning:
//!
//! 1. built-in defaults
//! 2. `orderdesk.toml` in the working directory (optional)
//! 3. `ORDERDESK_*` environment variables (a `.env` file is loaded first)
//!
//! ```text
//! ORDERDESK_PORT=8080
//! ORDERDESK_JWT_SECRET=0123456789abcdef0123456789abcdef
//! ORDERDESK_RECEIPT_STORAGE_PATH=/var/lib/orderdesk/receipts
//! ```

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const CONFIG_FILE: &str = "orderdesk";
const ENV_PREFIX: &str = "ORDERDESK";

/// Minimum length of the token signing secret.
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// Prefix of every business route, without slashes (`api/v1`)
    pub api_prefix: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Secret for signing bearer tokens
    pub jwt_secret: String,

    /// Token lifetime: `90s`, `15m`, `24h`, `7d` or plain seconds
    pub jwt_expires_in: String,

    /// Static `x-api-key`; unset or empty disables the check
    pub api_key: Option<String>,

    /// Directory of rendered receipt PDFs
    pub receipt_storage_path: PathBuf,

    /// Public base URL used in `pdf_url`
    pub receipt_base_url: String,

    /// Live receipts kept before the oldest are pruned
    pub receipt_retention_limit: usize,

    /// Directory of the company settings file and logo
    pub settings_path: PathBuf,

    /// Comma-separated allowed CORS origins
    pub cors_origins: String,

    /// Largest accepted request body in bytes (default: 10MB)
    pub body_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            api_prefix: "api/v1".to_string(),
            database_path: PathBuf::from("./orderdesk.db"),
            jwt_secret: String::new(),
            jwt_expires_in: "24h".to_string(),
            api_key: None,
            receipt_storage_path: PathBuf::from("./receipts"),
            receipt_base_url: "http://localhost:3000".to_string(),
            receipt_retention_limit: orderdesk_core::receipt::DEFAULT_RETENTION_LIMIT,
            settings_path: PathBuf::from("./settings"),
            cors_origins: "http://localhost:5173,http://localhost:3000".to_string(),
            body_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    /// Loads defaults, the optional config file and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Self::from_builder(builder)
    }

    /// The defaults as the bottom configuration layer.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let d = AppConfig::default();
        let builder = config::Config::builder()
            .set_default("host", d.host)?
            .set_default("port", i64::from(d.port))?
            .set_default("api_prefix", d.api_prefix)?
            .set_default("database_path", d.database_path.display().to_string())?
            .set_default("jwt_secret", d.jwt_secret)?
            .set_default("jwt_expires_in", d.jwt_expires_in)?
            .set_default("receipt_storage_path", d.receipt_storage_path.display().to_string())?
            .set_default("receipt_base_url", d.receipt_base_url)?
            .set_default("receipt_retention_limit", d.receipt_retention_limit as i64)?
            .set_default("settings_path", d.settings_path.display().to_string())?
            .set_default("cors_origins", d.cors_origins)?
            .set_default("body_limit_bytes", d.body_limit_bytes as i64)?;

        Ok(builder)
    }

    /// Builds, deserializes and validates.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values the type system cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingRequired("jwt_secret".to_string()));
        }
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                key: "jwt_secret".to_string(),
                reason: format!("must be at least {MIN_JWT_SECRET_LEN} characters"),
            });
        }
        self.jwt_lifetime_secs()?;
        if self.receipt_retention_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "receipt_retention_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Token lifetime in seconds.
    pub fn jwt_lifetime_secs(&self) -> Result<i64, ConfigError> {
        parse_duration_secs(&self.jwt_expires_in).ok_or_else(|| ConfigError::InvalidValue {
            key: "jwt_expires_in".to_string(),
            reason: format!("'{}' is not a duration", self.jwt_expires_in),
        })
    }

    /// The API key, if one is configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// `/{api_prefix}`, normalized.
    pub fn route_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    /// Parsed CORS origins.
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parses `90`, `90s`, `15m`, `24h` or `7d` into seconds.
pub fn parse_duration_secs(value: &str) -> Option<i64> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&value[..i], c),
        _ => (value, 's'),
    };

    let amount: i64 = digits.trim().parse().ok().filter(|n: &i64| *n > 0)?;
    let factor = match unit {
        's' => 1,
        'm' => 60,
        'h' => 3600,
        'd' => 86_400,
        _ => return None,
    };

    amount.checked_mul(factor)
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error(transparent)]
    Source(#[from] config::ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration_secs("90"), Some(90));
        assert_eq!(parse_duration_secs("90s"), Some(90));
        assert_eq!(parse_duration_secs("15m"), Some(900));
        assert_eq!(parse_duration_secs("24h"), Some(86_400));
        assert_eq!(parse_duration_secs("7d"), Some(604_800));
        assert_eq!(parse_duration_secs("0h"), None);
        assert_eq!(parse_duration_secs("h"), None);
        assert_eq!(parse_duration_secs("3w"), None);
        assert_eq!(parse_duration_secs(""), None);
    }

    #[test]
    fn test_layers_override_defaults() {
        let toml = format!(
            r#"
            port = 8080
            jwt_secret = "{SECRET}"
            api_prefix = "/api/v2/"
            cors_origins = "https://a.example, https://b.example"
            "#
        );
        let builder = AppConfig::defaults()
            .unwrap()
            .add_source(File::from_str(&toml, FileFormat::Toml));
        let config = AppConfig::from_builder(builder).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.receipt_retention_limit, 10);
        assert_eq!(config.route_prefix(), "/api/v2");
        assert_eq!(
            config.cors_origin_list(),
            vec!["https://a.example", "https://b.example"]
        );
        assert_eq!(config.jwt_lifetime_secs().unwrap(), 86_400);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_secret_required() {
        let err = AppConfig::from_builder(AppConfig::defaults().unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));

        let short = AppConfig {
            jwt_secret: "short".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(short.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_bad_lifetime_rejected() {
        let config = AppConfig {
            jwt_secret: SECRET.to_string(),
            jwt_expires_in: "forever".to_string(),
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
