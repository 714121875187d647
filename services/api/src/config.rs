//! Application configuration
//!
//! Built once at startup from the environment. Every variable is prefixed
//! with `YTNOTES_` and nested sections are separated by `__`, for example
//! `YTNOTES_DATABASE__URL` or `YTNOTES_OAUTH__CLIENT_ID`.

use auth::{JwtConfig, OAuthConfig};
use axum_extra::extract::cookie::SameSite;
use common::DatabaseConfig;
use config::{Config, ConfigError, Environment, builder::DefaultState};
use media::StorageConfig;
use serde::Deserialize;

use crate::{rate_limiter::RateLimitConfig, youtube::YoutubeConfig};

const ENV_PREFIX: &str = "YTNOTES";

/// Complete service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub oauth: OAuthConfig,
    pub youtube: YoutubeConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// The single origin allowed to call the API with credentials
    pub client_origin: String,
    pub cookie_secure: bool,
    pub cookie_same_site: CookieSameSite,
    /// Maximum request body accepted by the upload route
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
            client_origin: "http://localhost:5173".to_string(),
            cookie_secure: false,
            cookie_same_site: CookieSameSite::Lax,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

/// `SameSite` attribute of the refresh cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CookieSameSite {
    Strict,
    Lax,
    /// Requires `cookie_secure`
    None,
}

impl From<CookieSameSite> for SameSite {
    fn from(value: CookieSameSite) -> Self {
        match value {
            CookieSameSite::Strict => SameSite::Strict,
            CookieSameSite::Lax => SameSite::Lax,
            CookieSameSite::None => SameSite::None,
        }
    }
}

impl AppConfig {
    /// Load the configuration from `YTNOTES_*` environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_builder(Config::builder())
    }

    /// Overlay the environment on a prepared builder and deserialize
    pub fn from_builder(
        builder: config::ConfigBuilder<DefaultState>,
    ) -> Result<Self, ConfigError> {
        let config: AppConfig = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.trim().is_empty() {
            return Err(ConfigError::Message("jwt.secret must be set".to_string()));
        }
        if self.youtube.api_key.trim().is_empty() {
            return Err(ConfigError::Message("youtube.api_key must be set".to_string()));
        }
        if self.server.cookie_same_site == CookieSameSite::None && !self.server.cookie_secure {
            return Err(ConfigError::Message(
                "server.cookie_same_site = none requires server.cookie_secure".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn required() -> config::ConfigBuilder<DefaultState> {
        Config::builder()
            .set_override("jwt.secret", "test-secret")
            .unwrap()
            .set_override("oauth.client_id", "client")
            .unwrap()
            .set_override("oauth.client_secret", "secret")
            .unwrap()
            .set_override("oauth.redirect_url_login", "http://localhost:5173/login")
            .unwrap()
            .set_override("oauth.redirect_url_signup", "http://localhost:5173/signup")
            .unwrap()
            .set_override("youtube.api_key", "yt-key")
            .unwrap()
            .set_override("storage.public_base_url", "http://localhost:9000/editor-images")
            .unwrap()
    }

    #[test]
    #[serial]
    fn test_defaults_fill_optional_sections() {
        let config = AppConfig::from_builder(required()).unwrap();

        assert_eq!(config.server.bind_address, "0.0.0.0:3000");
        assert_eq!(config.server.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.jwt.access_token_expiry, 86_400);
        assert_eq!(config.jwt.refresh_token_expiry, 259_200);
        assert_eq!(config.youtube.page_size, 50);
        assert_eq!(config.youtube.max_entries, 150);
        assert_eq!(config.storage.bucket, "editor-images");
        assert_eq!(config.rate_limit.playlist.max_requests, 30);
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        unsafe {
            std::env::set_var("YTNOTES_SERVER__COOKIE_SECURE", "true");
            std::env::set_var("YTNOTES_SERVER__COOKIE_SAME_SITE", "none");
            std::env::set_var("YTNOTES_RATE_LIMIT__NOTES__MAX_REQUESTS", "7");
            std::env::set_var("YTNOTES_JWT__SECRET", "from-env");
        }

        let config = AppConfig::from_builder(required());

        unsafe {
            std::env::remove_var("YTNOTES_SERVER__COOKIE_SECURE");
            std::env::remove_var("YTNOTES_SERVER__COOKIE_SAME_SITE");
            std::env::remove_var("YTNOTES_RATE_LIMIT__NOTES__MAX_REQUESTS");
            std::env::remove_var("YTNOTES_JWT__SECRET");
        }

        let config = config.unwrap();
        assert!(config.server.cookie_secure);
        assert_eq!(config.server.cookie_same_site, CookieSameSite::None);
        assert_eq!(config.rate_limit.notes.max_requests, 7);
        assert_eq!(config.rate_limit.notes.window_seconds, 900);
        assert_eq!(config.jwt.secret, "test-secret");
    }

    #[test]
    #[serial]
    fn test_missing_secret_fails() {
        let result = AppConfig::from_builder(
            required().set_override("jwt.secret", "").unwrap(),
        );
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_same_site_none_requires_secure() {
        let result = AppConfig::from_builder(
            required()
                .set_override("server.cookie_same_site", "none")
                .unwrap(),
        );
        assert!(result.is_err());
    }
}
