//! Signed-in session and its on-disk persistence.
//!
//! The CLI runs one command per process, so the bearer token and the cart
//! are written to a small JSON file between invocations. The token is never
//! logged; `Session` implements `Debug` by hand and keeps it in a
//! [`SecretString`].

use std::path::{Path, PathBuf};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::cart::CartSnapshot;
use crate::models::UserProfile;

/// Errors reading or writing the session file.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The file could not be read or written.
    #[error("session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but is not valid session JSON.
    #[error("session file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A signed-in user and the bearer token the backend issued for them.
pub struct Session {
    user: UserProfile,
    token: SecretString,
}

impl Session {
    #[must_use]
    pub fn new(user: UserProfile, token: String) -> Self {
        Self {
            user,
            token: SecretString::from(token),
        }
    }

    #[must_use]
    pub const fn user(&self) -> &UserProfile {
        &self.user
    }

    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Same token, refreshed profile (after a profile edit).
    #[must_use]
    pub fn with_user(&self, user: UserProfile) -> Self {
        Self::new(user, self.token.expose_secret().to_string())
    }

    /// The `exp` claim of the token, if it is a JWT that carries one.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        token_expiry(self.token.expose_secret())
    }

    /// Whether the token had expired at `now`.
    ///
    /// Tokens without a readable `exp` claim are left for the backend to judge.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl Clone for Session {
    fn clone(&self) -> Self {
        Self::new(self.user.clone(), self.token.expose_secret().to_string())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Deserialize)]
struct Claims {
    exp: Option<i64>,
}

fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    DateTime::from_timestamp(claims.exp?, 0)
}

/// Everything carried between CLI invocations.
#[derive(Debug, Default)]
pub struct PersistedState {
    pub session: Option<Session>,
    pub cart: CartSnapshot,
}

#[derive(Serialize, Deserialize)]
struct StoredState {
    #[serde(default)]
    session: Option<StoredSession>,
    #[serde(default)]
    cart: CartSnapshot,
}

#[derive(Serialize, Deserialize)]
struct StoredSession {
    user: UserProfile,
    token: String,
}

/// Reads and writes [`PersistedState`] as JSON at a fixed path.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved state. A missing file is an empty state.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<PersistedState, SessionError> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No saved session");
                return Ok(PersistedState::default());
            }
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let stored: StoredState =
            serde_json::from_slice(&raw).map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        Ok(PersistedState {
            session: stored.session.map(|s| Session::new(s.user, s.token)),
            cart: stored.cart,
        })
    }

    /// Write the state, replacing the previous file atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    #[instrument(skip(self, state), fields(path = %self.path.display()))]
    pub async fn save(&self, state: &PersistedState) -> Result<(), SessionError> {
        let stored = StoredState {
            session: state.session.as_ref().map(|s| StoredSession {
                user: s.user.clone(),
                token: s.token.expose_secret().to_string(),
            }),
            cart: state.cart.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored).map_err(|source| SessionError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        let io_error = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(io_error)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(io_error)?;
        }
        tokio::fs::rename(&tmp, &self.path).await.map_err(io_error)?;

        debug!(
            signed_in = state.session.is_some(),
            lines = state.cart.len(),
            "Saved session"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use nexuskart_core::{Email, UserId, UserRole};
    use serde_json::json;

    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new(3),
            email: Email::parse("ravi@example.com").unwrap(),
            name: "Ravi".to_string(),
            role: UserRole::User,
        }
    }

    fn jwt_with_exp(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(json!({"sub": "ravi@example.com", "exp": exp}).to_string());
        format!("{header}.{payload}.signature")
    }

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("nexuskart-session-{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn test_expiry_from_jwt() {
        let session = Session::new(profile(), jwt_with_exp(1_700_000_000));
        let exp = session.expires_at().unwrap();
        assert_eq!(exp.timestamp(), 1_700_000_000);
        assert!(session.is_expired_at(exp));
        assert!(!session.is_expired_at(DateTime::from_timestamp(1_600_000_000, 0).unwrap()));
    }

    #[test]
    fn test_opaque_token_never_expires_locally() {
        let session = Session::new(profile(), "opaque-token".to_string());
        assert!(session.expires_at().is_none());
        assert!(!session.is_expired());
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new(profile(), "super-secret".to_string());
        let debug = format!("{session:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_state() {
        let store = SessionStore::new(temp_path());
        let state = store.load().await.unwrap();
        assert!(state.session.is_none());
        assert!(state.cart.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load_keeps_session() {
        let path = temp_path();
        let store = SessionStore::new(&path);
        let state = PersistedState {
            session: Some(Session::new(profile(), "tok-123".to_string())),
            cart: CartSnapshot::default(),
        };
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap();
        let session = loaded.session.unwrap();
        assert_eq!(session.user(), &profile());
        assert_eq!(session.token().expose_secret(), "tok-123");

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();

        let err = SessionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, SessionError::Corrupt { .. }));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
