//! Account types returned by the identity endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

use nexuskart_core::{Email, UserId, UserRole};

/// The public profile of an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
}

impl UserProfile {
    /// Whether the account may use the admin back-office.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Response of `POST /auth/login`.
///
/// `Debug` is implemented manually to redact the bearer token.
#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub id: UserId,
    pub email: Email,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: UserRole,
    pub token: String,
}

impl LoginResponse {
    /// Split into the profile and the raw token.
    #[must_use]
    pub fn into_parts(self) -> (UserProfile, String) {
        (
            UserProfile {
                id: self.id,
                email: self.email,
                name: self.name,
                role: self.role,
            },
            self.token,
        )
    }
}

impl fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginResponse")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_login_response_debug_redacts_token() {
        let response: LoginResponse = serde_json::from_value(json!({
            "id": 4,
            "email": "asha@example.com",
            "name": "Asha",
            "role": "ADMIN",
            "token": "eyJhbGciOiJIUzI1NiJ9.secret-part.sig"
        }))
        .unwrap();

        let debug = format!("{response:?}");
        assert!(debug.contains("asha@example.com"));
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret-part"));

        let (profile, token) = response.into_parts();
        assert!(profile.is_admin());
        assert!(token.starts_with("eyJ"));
    }

    #[test]
    fn test_profile_ignores_entity_extras() {
        // Signup returns the full user entity, password hash included.
        let profile: UserProfile = serde_json::from_value(json!({
            "id": 9,
            "email": "new@shop.in",
            "name": "New",
            "password": "$2a$12$hash",
            "role": "USER",
            "imageDate": null
        }))
        .unwrap();
        assert_eq!(profile.id, UserId::new(9));
        assert!(!profile.is_admin());
    }
}
