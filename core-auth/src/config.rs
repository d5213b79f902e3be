//! Per-platform authorization configuration.
//!
//! Each platform carries its own OAuth client id, authorization endpoint,
//! redirect URI, and scope list. The registry resolves a [`Platform`] to its
//! configuration and validates entries on insertion so a malformed config is
//! rejected before any authorization attempt starts.

use crate::error::{AuthError, Result};
use crate::types::Platform;
use std::collections::HashMap;
use url::Url;

/// Authorization configuration for a single platform.
#[derive(Debug, Clone)]
pub struct PlatformAuthConfig {
    /// The platform this configuration belongs to.
    pub platform: Platform,
    /// OAuth client identifier registered with the platform.
    pub client_id: String,
    /// Authorization endpoint the external user agent is sent to.
    pub auth_endpoint: String,
    /// Redirect URI the platform calls back with the authorization code.
    pub redirect_uri: String,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,
}

impl PlatformAuthConfig {
    /// Check that the configuration is usable for an authorization attempt.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] when the client id is empty or
    /// either URL fails to parse.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(AuthError::InvalidConfig {
                platform: self.platform.to_string(),
                reason: "client_id is empty".to_string(),
            });
        }
        Url::parse(&self.auth_endpoint).map_err(|e| AuthError::InvalidConfig {
            platform: self.platform.to_string(),
            reason: format!("invalid auth_endpoint '{}': {}", self.auth_endpoint, e),
        })?;
        Url::parse(&self.redirect_uri).map_err(|e| AuthError::InvalidConfig {
            platform: self.platform.to_string(),
            reason: format!("invalid redirect_uri '{}': {}", self.redirect_uri, e),
        })?;
        Ok(())
    }

    /// Build the full authorization URL for this platform.
    ///
    /// Appends the standard authorization-code query parameters plus the
    /// caller-supplied CSRF `state` value. Scopes are joined with spaces.
    pub fn authorization_url(&self, state: &str) -> Result<String> {
        let mut url = Url::parse(&self.auth_endpoint).map_err(|e| AuthError::InvalidConfig {
            platform: self.platform.to_string(),
            reason: format!("invalid auth_endpoint '{}': {}", self.auth_endpoint, e),
        })?;

        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &self.scopes.join(" "))
            .append_pair("state", state);

        Ok(url.to_string())
    }
}

/// Registry mapping each platform to its authorization configuration.
#[derive(Debug, Clone, Default)]
pub struct AuthConfigRegistry {
    configs: HashMap<Platform, PlatformAuthConfig>,
}

impl AuthConfigRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry preloaded with every supported platform.
    ///
    /// Client ids are read from `TUNELINK_<PLATFORM>_CLIENT_ID` environment
    /// variables, falling back to a placeholder for local development.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.configs.insert(
            Platform::Spotify,
            PlatformAuthConfig {
                platform: Platform::Spotify,
                client_id: env_client_id("TUNELINK_SPOTIFY_CLIENT_ID"),
                auth_endpoint: "https://accounts.spotify.com/authorize".to_string(),
                redirect_uri: default_redirect_uri(),
                scopes: vec![
                    "playlist-read-private".to_string(),
                    "playlist-modify-private".to_string(),
                    "user-library-read".to_string(),
                ],
            },
        );
        registry.configs.insert(
            Platform::AppleMusic,
            PlatformAuthConfig {
                platform: Platform::AppleMusic,
                client_id: env_client_id("TUNELINK_APPLE_MUSIC_CLIENT_ID"),
                auth_endpoint: "https://appleid.apple.com/auth/authorize".to_string(),
                redirect_uri: default_redirect_uri(),
                scopes: vec!["media-library".to_string()],
            },
        );
        registry.configs.insert(
            Platform::YoutubeMusic,
            PlatformAuthConfig {
                platform: Platform::YoutubeMusic,
                client_id: env_client_id("TUNELINK_YOUTUBE_MUSIC_CLIENT_ID"),
                auth_endpoint: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
                redirect_uri: default_redirect_uri(),
                scopes: vec!["https://www.googleapis.com/auth/youtube.readonly".to_string()],
            },
        );
        registry.configs.insert(
            Platform::Melon,
            PlatformAuthConfig {
                platform: Platform::Melon,
                client_id: env_client_id("TUNELINK_MELON_CLIENT_ID"),
                auth_endpoint: "https://auth.melon.com/oauth/authorize".to_string(),
                redirect_uri: default_redirect_uri(),
                scopes: vec!["playlist".to_string()],
            },
        );
        registry
    }

    /// Insert or replace a platform configuration after validating it.
    pub fn insert(&mut self, config: PlatformAuthConfig) -> Result<()> {
        config.validate()?;
        self.configs.insert(config.platform, config);
        Ok(())
    }

    /// Look up the configuration for a platform.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidConfig`] when no configuration has been
    /// registered for the platform.
    pub fn get(&self, platform: Platform) -> Result<&PlatformAuthConfig> {
        self.configs
            .get(&platform)
            .ok_or_else(|| AuthError::InvalidConfig {
                platform: platform.to_string(),
                reason: "no authorization config registered".to_string(),
            })
    }
}

fn env_client_id(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| "placeholder_client_id".to_string())
}

fn default_redirect_uri() -> String {
    std::env::var("TUNELINK_REDIRECT_URI").unwrap_or_else(|_| "tunelink://callback".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> PlatformAuthConfig {
        PlatformAuthConfig {
            platform: Platform::Spotify,
            client_id: "test_client".to_string(),
            auth_endpoint: "https://accounts.spotify.com/authorize".to_string(),
            redirect_uri: "tunelink://callback".to_string(),
            scopes: vec!["playlist-read-private".to_string(), "user-library-read".to_string()],
        }
    }

    #[test]
    fn test_validate_accepts_good_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_client_id() {
        let mut config = valid_config();
        config.client_id = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, AuthError::InvalidConfig { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let mut config = valid_config();
        config.auth_endpoint = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_authorization_url_parameters() {
        let url_str = valid_config().authorization_url("abc123").unwrap();
        let url = Url::parse(&url_str).unwrap();
        let params: HashMap<String, String> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(params.get("client_id").map(String::as_str), Some("test_client"));
        assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(
            params.get("redirect_uri").map(String::as_str),
            Some("tunelink://callback")
        );
        assert_eq!(
            params.get("scope").map(String::as_str),
            Some("playlist-read-private user-library-read")
        );
        assert_eq!(params.get("state").map(String::as_str), Some("abc123"));
    }

    #[test]
    fn test_registry_defaults_cover_all_platforms() {
        let registry = AuthConfigRegistry::with_defaults();
        for platform in Platform::all() {
            let config = registry.get(platform).unwrap();
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_registry_missing_platform() {
        let registry = AuthConfigRegistry::new();
        assert!(registry.get(Platform::Melon).is_err());
    }

    #[test]
    fn test_registry_insert_validates() {
        let mut registry = AuthConfigRegistry::new();
        let mut config = valid_config();
        config.client_id = String::new();
        assert!(registry.insert(config).is_err());
        assert!(registry.get(Platform::Spotify).is_err());
    }
}
