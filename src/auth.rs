//! Login, bearer sessions, and per-tenant access checks.
//!
//! Sessions are opaque bearer tokens held in an in-memory TTL cache; a
//! token expires by idle-out or explicit logout. Passwords are stored as
//! sha-256 hex digests and compared in constant time.

use crate::errors::AppError;
use crate::models::UserProfile;
use crate::user_store::{UserStore, ROLE_ADMIN};
use axum::http::HeaderMap;
use moka::future::Cache;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::time::Duration;
use uuid::Uuid;

/// sha-256 hex digest of a plaintext password.
pub fn digest_password(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

// Timing-safe equality over the hex digests.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes()
        .iter()
        .zip(b.as_bytes().iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// An authenticated operator, as cached against the bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    /// Tenant slugs this session may open. Empty for admins, who bypass
    /// grants entirely.
    pub grants: Vec<String>,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn can_access(&self, slug: &str) -> bool {
        self.is_admin() || self.grants.iter().any(|g| g == slug)
    }
}

/// Successful login response: the token plus who logged in.
#[derive(Debug, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub session: Session,
}

pub struct AuthService {
    users: UserStore,
    sessions: Cache<String, Session>,
    /// Break-glass admin from the environment, independent of the
    /// `user_profiles` table. (email, password digest)
    env_admin: Option<(String, String)>,
}

impl AuthService {
    pub fn new(
        users: UserStore,
        session_ttl: Duration,
        env_admin: Option<(String, String)>,
    ) -> Self {
        let sessions = Cache::builder()
            .max_capacity(10_000)
            .time_to_idle(session_ttl)
            .build();
        Self {
            users,
            sessions,
            env_admin,
        }
    }

    /// Verifies credentials and mints a bearer token.
    ///
    /// A partner with zero tenant grants cannot log in: they would land
    /// on an empty picker with nothing to open, so it reads as a
    /// provisioning mistake and fails loudly instead.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let email = email.trim().to_lowercase();
        let digest = digest_password(password);

        if let Some((admin_email, admin_digest)) = &self.env_admin {
            if email == admin_email.to_lowercase() && constant_time_compare(&digest, admin_digest)
            {
                tracing::info!("Environment admin logged in");
                return Ok(self.mint(Session {
                    user_id: Uuid::nil(),
                    name: "Administrator".to_string(),
                    email,
                    role: ROLE_ADMIN.to_string(),
                    grants: Vec::new(),
                })
                .await);
            }
        }

        let user = match self.users.get_by_email(&email).await? {
            Some(u) => u,
            None => {
                tracing::warn!("Login failed: unknown email");
                return Err(AppError::Unauthorized("Invalid credentials".to_string()));
            }
        };
        if !user.is_active {
            tracing::warn!("Login failed: inactive account '{}'", user.email);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
        if !constant_time_compare(&digest, &user.password_digest) {
            tracing::warn!("Login failed: bad password for '{}'", user.email);
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }

        let grants = if user.role == ROLE_ADMIN {
            Vec::new()
        } else {
            let grants = self.users.grants_for(user.id).await?;
            if grants.is_empty() {
                tracing::warn!("Login refused: '{}' has no tenant grants", user.email);
                return Err(AppError::Unauthorized(
                    "Account has no dashboards assigned".to_string(),
                ));
            }
            grants
        };

        tracing::info!("User '{}' logged in as {}", user.email, user.role);
        Ok(self.mint(session_for(user, grants)).await)
    }

    async fn mint(&self, session: Session) -> LoginOutcome {
        let token = format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple());
        self.sessions.insert(token.clone(), session.clone()).await;
        LoginOutcome { token, session }
    }

    /// Resolves the `Authorization: Bearer` header to a live session.
    pub async fn authorize(&self, headers: &HeaderMap) -> Result<Session, AppError> {
        let token = bearer_token(headers)
            .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
        self.sessions
            .get(token)
            .await
            .ok_or_else(|| AppError::Unauthorized("Session expired".to_string()))
    }

    /// Like [`authorize`](Self::authorize) but also requires the admin role.
    pub async fn authorize_admin(&self, headers: &HeaderMap) -> Result<Session, AppError> {
        let session = self.authorize(headers).await?;
        if !session.is_admin() {
            tracing::warn!("Back-office access denied for '{}'", session.email);
            return Err(AppError::Unauthorized(
                "Administrator role required".to_string(),
            ));
        }
        Ok(session)
    }

    pub async fn logout(&self, headers: &HeaderMap) {
        if let Some(token) = bearer_token(headers) {
            self.sessions.invalidate(token).await;
        }
    }
}

fn session_for(user: UserProfile, grants: Vec<String>) -> Session {
    Session {
        user_id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        grants,
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        // sha256("secret")
        assert_eq!(
            digest_password("secret"),
            "2bb80d537b1da3e38bd30361aa855686bde0eacd7162fef6a25fe97bf527a25b"
        );
        assert_eq!(digest_password("").len(), 64);
    }

    #[test]
    fn comparison_rejects_unequal_lengths_and_contents() {
        assert!(constant_time_compare("abc123", "abc123"));
        assert!(!constant_time_compare("abc123", "abc124"));
        assert!(!constant_time_compare("abc123", "abc12"));
    }

    #[test]
    fn bearer_extraction_handles_malformed_headers() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer tok-123"),
        );
        assert_eq!(bearer_token(&headers), Some("tok-123"));

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcg=="),
        );
        assert!(bearer_token(&headers).is_none());

        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer "),
        );
        assert!(bearer_token(&headers).is_none());
    }

    #[test]
    fn admin_sessions_bypass_grants() {
        let admin = Session {
            user_id: Uuid::nil(),
            name: "A".to_string(),
            email: "a@x.mx".to_string(),
            role: "admin".to_string(),
            grants: Vec::new(),
        };
        assert!(admin.can_access("anything"));

        let partner = Session {
            role: "partner".to_string(),
            grants: vec!["acme".to_string()],
            ..admin
        };
        assert!(partner.can_access("acme"));
        assert!(!partner.can_access("other"));
    }
}
