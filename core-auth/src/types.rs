use crate::error::AuthError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported music-streaming platforms.
///
/// The enumeration is fixed for a given build; there is no runtime platform
/// registration. Identifiers are matched exactly (case-folded), never
/// fuzzily.
///
/// # Examples
///
/// ```
/// use core_auth::Platform;
///
/// let platform = Platform::parse("apple_music").unwrap();
/// assert_eq!(platform, Platform::AppleMusic);
/// assert!(Platform::parse("napster").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    /// Spotify
    Spotify,
    /// Apple Music
    AppleMusic,
    /// YouTube Music
    YoutubeMusic,
    /// Melon
    Melon,
}

impl Platform {
    /// Every platform known to this build, in declaration order.
    pub fn all() -> [Platform; 4] {
        [
            Platform::Spotify,
            Platform::AppleMusic,
            Platform::YoutubeMusic,
            Platform::Melon,
        ]
    }

    /// Get the human-readable display name for this platform.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Spotify => "Spotify",
            Platform::AppleMusic => "Apple Music",
            Platform::YoutubeMusic => "YouTube Music",
            Platform::Melon => "Melon",
        }
    }

    /// Get the canonical platform identifier string.
    ///
    /// Used for logging, events, and the remote RPC boundary.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Spotify => "spotify",
            Platform::AppleMusic => "apple_music",
            Platform::YoutubeMusic => "youtube_music",
            Platform::Melon => "melon",
        }
    }

    /// Resolve a platform identifier to exactly one enumeration member.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::UnknownPlatform`] for any identifier that is not
    /// an exact (case-insensitive) match. Partial matches never resolve.
    pub fn parse(s: &str) -> Result<Self, AuthError> {
        match s.to_lowercase().as_str() {
            "spotify" => Ok(Platform::Spotify),
            "apple_music" | "applemusic" => Ok(Platform::AppleMusic),
            "youtube_music" | "youtubemusic" => Ok(Platform::YoutubeMusic),
            "melon" => Ok(Platform::Melon),
            _ => Err(AuthError::UnknownPlatform(s.to_string())),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a successful authorization.
///
/// The credential material itself lives entirely on the remote backend;
/// this value only records that the link exists and whether the backend
/// reported it as valid. Each refresh or re-connect produces a new value,
/// superseding the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformAuth {
    /// The linked platform.
    pub platform: Platform,
    /// Validity flag reported by the remote backend.
    pub is_valid: bool,
    /// When the link (or refresh) was established (UTC).
    pub linked_at: chrono::DateTime<chrono::Utc>,
}

impl PlatformAuth {
    /// Record an authorization outcome stamped with the current time.
    pub fn new(platform: Platform, is_valid: bool) -> Self {
        Self {
            platform,
            is_valid,
            linked_at: chrono::Utc::now(),
        }
    }
}

/// A one-time authorization code captured from the OAuth redirect.
///
/// # Security
///
/// The code is short-lived but still sensitive; the `Debug` implementation
/// redacts it so it never reaches logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    /// Wrap a raw code string from the redirect callback.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The raw code, for forwarding to the remote backend exactly once.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AuthorizationCode")
            .field(&"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_all_is_complete() {
        let all = Platform::all();
        assert_eq!(all.len(), 4);
        for platform in all {
            // Every member round-trips through its canonical identifier
            assert_eq!(Platform::parse(platform.as_str()).unwrap(), platform);
        }
    }

    #[test]
    fn test_platform_parse_exact_only() {
        assert_eq!(Platform::parse("spotify").unwrap(), Platform::Spotify);
        assert_eq!(Platform::parse("Spotify").unwrap(), Platform::Spotify);
        assert_eq!(
            Platform::parse("apple_music").unwrap(),
            Platform::AppleMusic
        );
        assert_eq!(
            Platform::parse("youtube_music").unwrap(),
            Platform::YoutubeMusic
        );

        // No partial or fuzzy matches
        assert!(Platform::parse("spot").is_err());
        assert!(Platform::parse("apple").is_err());
        assert!(Platform::parse("").is_err());
    }

    #[test]
    fn test_platform_parse_unknown_error() {
        let err = Platform::parse("napster").unwrap_err();
        assert!(matches!(err, AuthError::UnknownPlatform(ref s) if s == "napster"));
    }

    #[test]
    fn test_platform_display() {
        assert_eq!(format!("{}", Platform::Spotify), "spotify");
        assert_eq!(Platform::AppleMusic.display_name(), "Apple Music");
    }

    #[test]
    fn test_platform_serialization() {
        let platform = Platform::Melon;
        let json = serde_json::to_string(&platform).unwrap();
        let deserialized: Platform = serde_json::from_str(&json).unwrap();
        assert_eq!(platform, deserialized);
    }

    #[test]
    fn test_platform_auth_supersedes() {
        let first = PlatformAuth::new(Platform::Spotify, true);
        let second = PlatformAuth::new(Platform::Spotify, true);
        assert!(second.linked_at >= first.linked_at);
    }

    #[test]
    fn test_authorization_code_debug_redacts() {
        let code = AuthorizationCode::new("super-secret-code");
        let debug = format!("{:?}", code);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret-code"));
        assert_eq!(code.as_str(), "super-secret-code");
    }
}
