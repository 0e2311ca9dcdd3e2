//! Operator accounts and per-tenant grants.
//!
//! Two tables: `user_profiles` holds the accounts, `user_client_access`
//! holds (user, tenant slug) grants. Grants are replaced wholesale on
//! every save, matching the back-office checkbox form.

use crate::auth::digest_password;
use crate::errors::{AppError, ResultExt};
use crate::models::{UserProfile, UserUpsert};
use rand::Rng;
use sqlx::PgPool;
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_PARTNER: &str = "partner";

/// Generates a password in the operator-friendly `Cef-XXXXXX-YYYY` shape:
/// six uppercase alphanumerics, then four digits.
pub fn generate_password() -> String {
    const ALPHANUM: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
    let mut rng = rand::thread_rng();
    let body: String = (0..6)
        .map(|_| ALPHANUM[rng.gen_range(0..ALPHANUM.len())] as char)
        .collect();
    let tail: u16 = rng.gen_range(1000..10000);
    format!("Cef-{}-{}", body, tail)
}

pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT id, name, email, password_digest, role, is_active \
             FROM user_profiles WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load user by email")
    }

    pub async fn list(&self) -> Result<Vec<UserProfile>, AppError> {
        sqlx::query_as::<_, UserProfile>(
            "SELECT id, name, email, password_digest, role, is_active \
             FROM user_profiles ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")
    }

    /// Tenant slugs this user may open. Admins bypass grants entirely, so
    /// callers only ask for partners.
    pub async fn grants_for(&self, user_id: Uuid) -> Result<Vec<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT client_slug FROM user_client_access \
             WHERE user_id = $1 ORDER BY client_slug",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to load user grants")?;
        Ok(rows.into_iter().map(|(slug,)| slug).collect())
    }

    /// Creates or updates an account and replaces its grants. An omitted
    /// password keeps the stored digest; it never means "blank password".
    pub async fn upsert(&self, body: UserUpsert) -> Result<UserProfile, AppError> {
        let email = body.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') || body.name.trim().is_empty() {
            return Err(AppError::BadRequest(
                "User name and email are required".to_string(),
            ));
        }
        if body.role != ROLE_ADMIN && body.role != ROLE_PARTNER {
            tracing::warn!("Rejected user save: unknown role '{}'", body.role);
            return Err(AppError::BadRequest(format!(
                "Unknown role '{}'",
                body.role
            )));
        }
        let digest = body.password.as_deref().map(digest_password);

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open transaction for user save")?;

        let saved = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO user_profiles (id, name, email, password_digest, role, is_active)
            VALUES ($1, $2, $3, COALESCE($4, ''), $5, $6)
            ON CONFLICT (email) DO UPDATE SET
                name = EXCLUDED.name,
                password_digest = COALESCE($4, user_profiles.password_digest),
                role = EXCLUDED.role,
                is_active = EXCLUDED.is_active
            RETURNING id, name, email, password_digest, role, is_active
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(body.name.trim())
        .bind(&email)
        .bind(&digest)
        .bind(&body.role)
        .bind(body.is_active.unwrap_or(true))
        .fetch_one(&mut *tx)
        .await
        .context("Failed to save user profile")?;

        sqlx::query("DELETE FROM user_client_access WHERE user_id = $1")
            .bind(saved.id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear user grants")?;

        for slug in &body.clients {
            sqlx::query(
                "INSERT INTO user_client_access (user_id, client_slug) \
                 VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(saved.id)
            .bind(slug)
            .execute(&mut *tx)
            .await
            .context("Failed to grant tenant access")?;
        }

        tx.commit()
            .await
            .context("Failed to commit user save")?;

        tracing::info!(
            "Saved user '{}' ({}) with {} tenant grants",
            saved.email,
            saved.role,
            body.clients.len()
        );
        Ok(saved)
    }

    pub async fn delete(&self, user_id: Uuid) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to open transaction for user delete")?;

        sqlx::query("DELETE FROM user_client_access WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear user grants")?;

        let result = sqlx::query("DELETE FROM user_profiles WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete user profile")?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No user {}", user_id)));
        }
        tx.commit()
            .await
            .context("Failed to commit user delete")?;
        tracing::info!("Deleted user {}", user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    #[test]
    fn generated_passwords_match_the_operator_shape() {
        let shape = Regex::new(r"^Cef-[A-Z2-9]{6}-\d{4}$").unwrap();
        for _ in 0..50 {
            let pw = generate_password();
            assert!(shape.is_match(&pw), "unexpected shape: {}", pw);
        }
    }

    #[test]
    fn generated_passwords_avoid_ambiguous_characters() {
        for _ in 0..50 {
            let pw = generate_password();
            let body = &pw[4..10];
            assert!(!body.contains('I') && !body.contains('O'));
            assert!(!body.contains('0') && !body.contains('1'));
        }
    }
}
