//! Server configuration loaded from environment variables, once at startup.
//!
//! # Environment Variables
//!
//! - `APP_ENV` - `development` (default), `production` or `test`
//! - `DATABASE_URL` - `PostgreSQL` connection string (default: `postgres://localhost/yelpcamp`)
//! - `JWT_SECRET` - token signing secret, required in production
//! - `MAPBOX_TOKEN` - geocoding access token
//! - `CLOUDINARY_CLOUD_NAME`, `CLOUDINARY_KEY`, `CLOUDINARY_SECRET` - image store credentials
//! - `FRONTEND_URL` - allowed CORS origin; the request origin is reflected when unset
//! - `PORT` - listen port (default: 3000)
//! - `FRONTEND_DIR` - static frontend build served at `/`

use anyhow::{Context, bail};
use external_services::CloudinaryCredentials;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/yelpcamp";
const DEFAULT_PORT: u16 = 3000;
const DEVELOPMENT_JWT_SECRET: &str = "thisshouldbeabettersecret!";

/// Reads `.env` into the process environment unless `APP_ENV` is
/// `production`. Runs before logging is set up so `RUST_LOG` can come from
/// the file.
pub fn load_dotenv() {
    let production = std::env::var("APP_ENV")
        .is_ok_and(|env| env.trim().eq_ignore_ascii_case("production"));
    if !production {
        dotenvy::dotenv().ok();
    }
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Local development, error bodies carry details
    Development,
    /// Deployed
    Production,
    /// Automated tests
    Test,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => bail!("APP_ENV must be development, production or test, got {other:?}"),
        }
    }

    /// Name reported by the health check
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// Application configuration
#[derive(Clone)]
pub struct AppConfig {
    /// Running environment
    pub environment: Environment,
    /// `PostgreSQL` connection URL
    pub database_url: String,
    /// Token signing secret
    pub jwt_secret: String,
    /// Mapbox access token
    pub mapbox_token: String,
    /// Cloudinary account
    pub cloudinary: CloudinaryCredentials,
    /// Allowed CORS origin
    pub frontend_url: Option<String>,
    /// Listen port
    pub port: u16,
    /// Static frontend build
    pub frontend_dir: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("environment", &self.environment)
            .field("database_url", &"[REDACTED]")
            .field("jwt_secret", &"[REDACTED]")
            .field("mapbox_token", &"[REDACTED]")
            .field("cloudinary_cloud_name", &self.cloudinary.cloud_name)
            .field("frontend_url", &self.frontend_url)
            .field("port", &self.port)
            .field("frontend_dir", &self.frontend_dir)
            .finish()
    }
}

impl AppConfig {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = Environment::parse(&var("APP_ENV").unwrap_or_default())?;

        let jwt_secret = match (var("JWT_SECRET"), environment) {
            (Some(secret), _) => secret,
            (None, Environment::Production) => bail!("JWT_SECRET must be set in production"),
            (None, _) => {
                log::warn!("JWT_SECRET is not set, using the development secret");
                DEVELOPMENT_JWT_SECRET.to_string()
            }
        };

        let port = match var("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT must be a port number, got {port:?}"))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            environment,
            database_url: var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            jwt_secret,
            mapbox_token: var("MAPBOX_TOKEN").unwrap_or_default(),
            cloudinary: CloudinaryCredentials {
                cloud_name: var("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
                api_key: var("CLOUDINARY_KEY").unwrap_or_default(),
                api_secret: var("CLOUDINARY_SECRET").unwrap_or_default(),
            },
            frontend_url: var("FRONTEND_URL"),
            port,
            frontend_dir: var("FRONTEND_DIR"),
        })
    }

    /// Whether error bodies carry debugging details
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.jwt_secret, DEVELOPMENT_JWT_SECRET);
        assert!(config.frontend_url.is_none());
        assert!(config.is_development());
    }

    #[test]
    fn test_production_requires_secret() {
        let err = load(&[("APP_ENV", "production")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let config = load(&[("APP_ENV", "production"), ("JWT_SECRET", "s3cr3t")]).unwrap();
        assert_eq!(config.jwt_secret, "s3cr3t");
        assert!(!config.is_development());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(load(&[("PORT", "eighty")]).is_err());
        assert!(load(&[("APP_ENV", "staging")]).is_err());
    }

    #[test]
    fn test_blank_values_count_as_unset() {
        let config = load(&[("FRONTEND_URL", "  "), ("PORT", "8080")]).unwrap();
        assert!(config.frontend_url.is_none());
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load(&[("JWT_SECRET", "hunter22"), ("MAPBOX_TOKEN", "pk.abc")]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter22"));
        assert!(!debug.contains("pk.abc"));
    }
}
