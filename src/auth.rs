//! Bearer credentials for the query engine.
//!
//! The login flow itself happens elsewhere; this module only holds the
//! resulting token, knows when it expires, and can restore one from a
//! token file written by that flow.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{OpenDataError, Result};

/// Environment variable holding a raw access token.
pub const ACCESS_TOKEN_ENV: &str = "OPENDATA_ACCESS_TOKEN";

/// Lifetime assumed for tokens supplied without an expiry.
const ASSUMED_TOKEN_LIFETIME_SECS: i64 = 3600;

/// An opaque bearer credential plus the instant it stops being valid.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl AuthToken {
    /// Creates a token expiring at `expires_at`.
    pub fn new(access_token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Creates a token valid for `lifetime` from now.
    pub fn valid_for(access_token: impl Into<String>, lifetime: Duration) -> Self {
        Self::new(access_token, Utc::now() + lifetime)
    }

    /// The raw bearer string, for the `Authorization` header.
    pub fn secret(&self) -> &str {
        &self.access_token
    }

    /// When the token expires.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the token is expired at `now`.
    ///
    /// A token expiring exactly at `now` counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Returns true if the token is expired right now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns the token only if it is present, non-empty and unexpired.
    ///
    /// "Not logged in" and "logged in with an unusable token" are the same
    /// case for callers of the executor.
    pub fn usable(token: Option<&AuthToken>) -> Option<&AuthToken> {
        Self::usable_at(token, Utc::now())
    }

    /// Like [`AuthToken::usable`], evaluated at `now`.
    pub fn usable_at(token: Option<&AuthToken>, now: DateTime<Utc>) -> Option<&AuthToken> {
        token.filter(|t| !t.access_token.is_empty() && !t.is_expired_at(now))
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// On-disk token shape: the fields of the identity provider's login
/// response that matter here. `expires_at` is in Unix milliseconds.
#[derive(Debug, Deserialize)]
struct TokenFile {
    access_token: String,
    expires_at: i64,
}

/// Parses a token file's JSON contents.
fn parse_token_json(content: &str) -> Result<AuthToken> {
    let file: TokenFile = serde_json::from_str(content)
        .map_err(|e| OpenDataError::auth(format!("Invalid token file: {e}")))?;

    let expires_at = Utc
        .timestamp_millis_opt(file.expires_at)
        .single()
        .ok_or_else(|| {
            OpenDataError::auth(format!(
                "Invalid token expiry: {} is out of range",
                file.expires_at
            ))
        })?;

    Ok(AuthToken::new(file.access_token, expires_at))
}

/// Loads a token from a JSON token file.
///
/// Returns `Ok(None)` if the file does not exist or the stored token has
/// already expired, in which case the user needs to log in again.
pub fn load_token_file(path: &Path) -> Result<Option<AuthToken>> {
    if !path.exists() {
        debug!("No token file at {}", path.display());
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| OpenDataError::auth(format!("Failed to read token file: {e}")))?;
    let token = parse_token_json(&content)?;

    if token.is_expired() {
        info!(
            "Token in {} expired at {}; re-authentication required",
            path.display(),
            token.expires_at()
        );
        return Ok(None);
    }

    Ok(Some(token))
}

/// Reads a raw access token from `OPENDATA_ACCESS_TOKEN`.
///
/// The environment carries no expiry, so the token is assumed to be good
/// for the usual one-hour lifetime of an OAuth access token.
pub fn token_from_env() -> Option<AuthToken> {
    std::env::var(ACCESS_TOKEN_ENV)
        .ok()
        .filter(|t| !t.is_empty())
        .map(|t| AuthToken::valid_for(t, Duration::seconds(ASSUMED_TOKEN_LIFETIME_SECS)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_expiry_boundary() {
        let token = AuthToken::new("ya29.abc", at(1_000));
        assert!(!token.is_expired_at(at(999)));
        assert!(token.is_expired_at(at(1_000)));
        assert!(token.is_expired_at(at(1_001)));
    }

    #[test]
    fn test_usable_filters_missing_expired_and_empty() {
        let now = at(500);
        let good = AuthToken::new("ya29.abc", at(1_000));
        let expired = AuthToken::new("ya29.abc", at(100));
        let empty = AuthToken::new("", at(1_000));

        assert_eq!(AuthToken::usable_at(Some(&good), now), Some(&good));
        assert_eq!(AuthToken::usable_at(Some(&expired), now), None);
        assert_eq!(AuthToken::usable_at(Some(&empty), now), None);
        assert_eq!(AuthToken::usable_at(None, now), None);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let token = AuthToken::new("ya29.super-secret", at(1_000));
        let debug = format!("{:?}", token);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_parse_token_json() {
        let token =
            parse_token_json(r#"{"access_token":"ya29.abc","expires_at":1700000000000,"scope":"x"}"#)
                .unwrap();
        assert_eq!(token.secret(), "ya29.abc");
        assert_eq!(token.expires_at(), at(1_700_000_000));
    }

    #[test]
    fn test_parse_token_json_malformed() {
        let err = parse_token_json(r#"{"token":"ya29.abc"}"#).unwrap_err();
        assert_eq!(err.category(), "Auth Error");
    }

    #[test]
    fn test_load_token_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let token = load_token_file(&dir.path().join("token.json")).unwrap();
        assert!(token.is_none());
    }

    #[test]
    fn test_load_token_file_expired_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, r#"{"access_token":"ya29.old","expires_at":1000}"#).unwrap();

        assert!(load_token_file(&path).unwrap().is_none());
    }

    #[test]
    fn test_load_token_file_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        let expires = (Utc::now() + Duration::hours(1)).timestamp_millis();
        std::fs::write(
            &path,
            format!(r#"{{"access_token":"ya29.fresh","expires_at":{expires}}}"#),
        )
        .unwrap();

        let token = load_token_file(&path).unwrap().unwrap();
        assert_eq!(token.secret(), "ya29.fresh");
        assert!(!token.is_expired());
    }
}
