//! Tenant registry backed by the `clients_config` table.
//!
//! Slugs are the primary key and double as the dashboard URL segment, so
//! they get normalized on the way in and are immutable after creation.

use crate::errors::{AppError, ResultExt};
use crate::models::{TenantConfig, TenantSummary, TenantUpsert};
use regex::Regex;
use sqlx::PgPool;
use std::sync::OnceLock;

const DEFAULT_PRIMARY: &str = "#7551FF";
const DEFAULT_SECONDARY: &str = "#01F1E3";

fn hex_color() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}$").unwrap())
}

/// Lowercases, trims, and dash-joins a display name into a URL slug.
pub fn normalize_slug(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

pub struct TenantStore {
    pool: PgPool,
}

impl TenantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetches a single tenant by slug; `NotFound` when missing.
    pub async fn get(&self, slug: &str) -> Result<TenantConfig, AppError> {
        sqlx::query_as::<_, TenantConfig>(
            r#"
            SELECT id_slug, name, client_type, webhook_url, investment,
                   investment_updated_at, sales_goal, logo_url,
                   theme_primary, theme_secondary, username, password
            FROM clients_config
            WHERE id_slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to load tenant config")?
        .ok_or_else(|| AppError::NotFound(format!("No tenant '{}'", slug)))
    }

    /// Lists every registered tenant, for the back-office table.
    pub async fn list(&self) -> Result<Vec<TenantSummary>, AppError> {
        sqlx::query_as::<_, TenantSummary>(
            "SELECT id_slug, name, webhook_url FROM clients_config ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list tenants")
    }

    /// Lists only the tenants named by `slugs`, preserving alphabetical
    /// order. Partners get their dashboard picker through this.
    pub async fn list_by_slugs(&self, slugs: &[String]) -> Result<Vec<TenantSummary>, AppError> {
        sqlx::query_as::<_, TenantSummary>(
            "SELECT id_slug, name, webhook_url FROM clients_config \
             WHERE id_slug = ANY($1) ORDER BY name",
        )
        .bind(slugs)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list granted tenants")
    }

    /// Creates or replaces a tenant. The slug is derived from `slug_hint`
    /// when given, otherwise from the display name.
    pub async fn upsert(
        &self,
        slug_hint: Option<&str>,
        body: TenantUpsert,
    ) -> Result<TenantConfig, AppError> {
        let slug = normalize_slug(slug_hint.unwrap_or(&body.name));
        if slug.is_empty() {
            return Err(AppError::BadRequest(
                "Tenant name must not be empty".to_string(),
            ));
        }
        validate(&body)?;

        let primary = body.theme_primary.as_deref().unwrap_or(DEFAULT_PRIMARY);
        let secondary = body.theme_secondary.as_deref().unwrap_or(DEFAULT_SECONDARY);

        let saved = sqlx::query_as::<_, TenantConfig>(
            r#"
            INSERT INTO clients_config
                (id_slug, name, client_type, webhook_url, investment,
                 investment_updated_at, sales_goal, logo_url,
                 theme_primary, theme_secondary, username, password)
            VALUES ($1, $2, $3, $4, $5, CURRENT_DATE, $6, $7, $8, $9, $10, $11)
            ON CONFLICT (id_slug) DO UPDATE SET
                name = EXCLUDED.name,
                client_type = EXCLUDED.client_type,
                webhook_url = EXCLUDED.webhook_url,
                investment = EXCLUDED.investment,
                investment_updated_at = CASE
                    WHEN clients_config.investment IS DISTINCT FROM EXCLUDED.investment
                    THEN CURRENT_DATE
                    ELSE clients_config.investment_updated_at
                END,
                sales_goal = EXCLUDED.sales_goal,
                logo_url = EXCLUDED.logo_url,
                theme_primary = EXCLUDED.theme_primary,
                theme_secondary = EXCLUDED.theme_secondary,
                username = EXCLUDED.username,
                password = EXCLUDED.password
            RETURNING id_slug, name, client_type, webhook_url, investment,
                      investment_updated_at, sales_goal, logo_url,
                      theme_primary, theme_secondary, username, password
            "#,
        )
        .bind(&slug)
        .bind(&body.name)
        .bind(&body.client_type)
        .bind(&body.webhook_url)
        .bind(body.investment)
        .bind(body.sales_goal)
        .bind(&body.logo_url)
        .bind(primary)
        .bind(secondary)
        .bind(&body.username)
        .bind(&body.password)
        .fetch_one(&self.pool)
        .await
        .context("Failed to save tenant config")?;

        tracing::info!("Saved tenant config for '{}'", saved.id_slug);
        Ok(saved)
    }

    /// Deletes a tenant; `NotFound` when the slug never existed.
    pub async fn delete(&self, slug: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM clients_config WHERE id_slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .context("Failed to delete tenant config")?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("No tenant '{}'", slug)));
        }
        tracing::info!("Deleted tenant config '{}'", slug);
        Ok(())
    }
}

fn validate(body: &TenantUpsert) -> Result<(), AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Tenant name must not be empty".to_string(),
        ));
    }
    if url::Url::parse(&body.webhook_url).is_err() {
        tracing::warn!("Rejected tenant save: invalid webhook URL");
        return Err(AppError::BadRequest(
            "webhook_url must be a valid URL".to_string(),
        ));
    }
    for color in [&body.theme_primary, &body.theme_secondary]
        .into_iter()
        .flatten()
    {
        if !hex_color().is_match(color) {
            tracing::warn!("Rejected tenant save: invalid theme color '{}'", color);
            return Err(AppError::BadRequest(format!(
                "Theme color '{}' is not #RRGGBB",
                color
            )));
        }
    }
    Ok(())
}
