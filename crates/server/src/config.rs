//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_API_KEY` - Shared secret for the admin API (`x-admin-key` header)
//! - `SHOPIFY_WEBHOOK_SECRET` - Shared secret for webhook HMAC verification
//!
//! ## Optional
//! - `APP_ENV` - Environment name (default: dev)
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8000)
//! - `SHOPIFY_SHOP_DOMAIN` - Our shop's myshopify domain (webhook fallback)
//! - `SHOPIFY_ADMIN_ACCESS_TOKEN` - Admin API token for the external platform
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// OMS application configuration.
#[derive(Clone)]
pub struct Config {
    /// Environment name (e.g., "dev", "production")
    pub app_env: String,
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shared secret required in the `x-admin-key` header
    pub admin_api_key: SecretString,
    /// Shopify integration configuration
    pub shopify: ShopifyConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("app_env", &self.app_env)
            .field("database_url", &"[REDACTED]")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("admin_api_key", &"[REDACTED]")
            .field("shopify", &self.shopify)
            .field("sentry_dsn", &self.sentry_dsn)
            .finish()
    }
}

/// Shopify integration configuration.
///
/// Implements `Debug` manually to redact the credentials.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shop domain (e.g., your-store.myshopify.com). Used as the fallback
    /// shop domain when a webhook omits the `X-Shopify-Shop-Domain` header.
    pub shop_domain: String,
    /// Admin API access token for the external platform
    pub admin_access_token: Option<SecretString>,
    /// Shared secret for webhook HMAC-SHA256 verification
    pub webhook_secret: SecretString,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("shop_domain", &self.shop_domain)
            .field("admin_access_token", &"[REDACTED]")
            .field("webhook_secret", &"[REDACTED]")
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Callers are expected to run `dotenvy::dotenv()` beforehand if a `.env`
    /// file should be honored.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        Ok(Self {
            app_env: get_env_or_default("APP_ENV", "dev"),
            database_url,
            host,
            port,
            admin_api_key: get_required_secret("ADMIN_API_KEY")?,
            shopify: ShopifyConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            shop_domain: get_env_or_default("SHOPIFY_SHOP_DOMAIN", ""),
            admin_access_token: get_optional_env("SHOPIFY_ADMIN_ACCESS_TOKEN")
                .map(SecretString::from),
            webhook_secret: get_required_secret("SHOPIFY_WEBHOOK_SECRET")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr_combines_host_and_port() {
        let config = Config {
            app_env: "test".to_string(),
            database_url: SecretString::from("postgres://localhost/test"),
            host: "0.0.0.0".parse().expect("valid addr"),
            port: 9000,
            admin_api_key: SecretString::from("key"),
            shopify: ShopifyConfig {
                shop_domain: "test.myshopify.com".to_string(),
                admin_access_token: None,
                webhook_secret: SecretString::from("secret"),
            },
            sentry_dsn: None,
        };
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ShopifyConfig {
            shop_domain: "test.myshopify.com".to_string(),
            admin_access_token: Some(SecretString::from("shpat_abc123")),
            webhook_secret: SecretString::from("hush"),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("shpat_abc123"));
        assert!(!rendered.contains("hush"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
