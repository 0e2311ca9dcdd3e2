use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::taxonomy::CanonicalStatus;

// ============ Lead pipeline models ============

/// Raw lead record as returned by a tenant's webhook.
///
/// Only the contractual fields are read; everything else the source sends
/// is preserved in `raw` and otherwise ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawLead {
    /// Display name of the prospect.
    #[serde(default)]
    pub nombre: Option<String>,

    /// Free-text status string from the marketing funnel.
    #[serde(default)]
    pub estatus: Option<String>,

    /// Free-text creation timestamp, locale formatted.
    #[serde(default)]
    pub fecha_creacion: Option<String>,

    /// Campaign attribution tag.
    #[serde(default)]
    pub utm_campaign: Option<String>,

    /// Source attribution tag.
    #[serde(default)]
    pub utm_source: Option<String>,

    /// Medium attribution tag (fallback for source attribution).
    #[serde(default)]
    pub utm_medium: Option<String>,

    /// Any additional fields the source sends.
    #[serde(flatten)]
    pub raw: Value,
}

/// Canonical projection of a [`RawLead`].
///
/// `status` and `created_at` are pure functions of the raw fields, so
/// re-deriving from the same raw input always yields the same canonical
/// lead. The collection is treated as read-only once ingested; filtering
/// and aggregation build fresh derived values from it.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalLead {
    pub nombre: Option<String>,
    /// Normalized status.
    pub status: CanonicalStatus,
    /// Creation instant. `None` only when no timestamp could be derived at
    /// all; the parser's "now" sentinel keeps this populated in practice
    /// and flags the degradation via `date_parse_failed`.
    pub created_at: Option<NaiveDateTime>,
    /// True when `created_at` is the "now" sentinel rather than a parsed
    /// value, so data-quality problems stay visible downstream.
    pub date_parse_failed: bool,
    pub utm_campaign: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
}

impl CanonicalLead {
    /// Calendar day used for day-bucketing, when a date is known.
    pub fn created_day(&self) -> Option<NaiveDate> {
        self.created_at.map(|dt| dt.date())
    }

    pub fn is_qualified(&self) -> bool {
        self.status.is_qualified()
    }
}

/// Financial inputs supplied by tenant configuration, never derived from
/// the lead collection itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TenantFinancials {
    pub investment: f64,
    pub sales: f64,
}

/// KPI set computed from a filtered lead collection plus the tenant
/// financials. Recomputed on every filter change; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub total: usize,
    pub qualified: usize,
    /// Qualified / total as a ratio; formatting as a percentage is a
    /// presentation concern.
    pub conversion_rate: f64,
    pub investment: f64,
    pub sales: f64,
    pub roi: f64,
    pub cost_per_qualified: f64,
    /// Leads whose creation date degraded to the "now" sentinel.
    pub date_parse_failures: usize,
}

/// One chart bucket: a label and how many leads fell into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesBucket {
    pub key: String,
    pub count: u64,
}

// ============ Dashboard payload ============

/// Outcome of the lead-source fetch for a dashboard load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Ok,
    /// Source answered with an empty array.
    Empty,
    Unreachable,
    Malformed,
}

/// One row of the qualified-leads table view.
#[derive(Debug, Clone, Serialize)]
pub struct LeadRow {
    pub name: String,
    /// `dd/mm/yyyy`, or `None` when the lead has no usable date.
    pub date: Option<String>,
    /// Display string of the canonical status.
    pub status: String,
    pub qualified: bool,
    /// Attribution channel (`utm_medium`, falling back to "Directo").
    pub channel: String,
}

/// Tenant display block the rendering layer needs alongside the numbers.
#[derive(Debug, Clone, Serialize)]
pub struct TenantBranding {
    pub slug: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub theme_primary: String,
    pub theme_secondary: String,
}

/// Everything a dashboard render needs, as plain data. Charts, number
/// formatting, and layout happen client-side.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardPayload {
    pub tenant: TenantBranding,
    pub source_status: SourceStatus,
    pub metrics: MetricsSnapshot,
    /// Leads per calendar day, chronological.
    pub daily: Vec<SeriesBucket>,
    /// Qualified leads per campaign, insertion order.
    pub campaigns: Vec<SeriesBucket>,
    /// Top sources by volume, descending.
    pub top_sources: Vec<SeriesBucket>,
    pub qualified_rows: Vec<LeadRow>,
}

// ============ Tenant registry models ============

/// One row of `clients_config` — a registered tenant.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TenantConfig {
    /// URL-safe identifier, primary key.
    pub id_slug: String,
    pub name: String,
    pub client_type: Option<String>,
    pub webhook_url: String,
    pub investment: f64,
    pub investment_updated_at: Option<NaiveDate>,
    pub sales_goal: f64,
    pub logo_url: Option<String>,
    pub theme_primary: String,
    pub theme_secondary: String,
    /// Operator-facing reference credentials kept from the legacy back
    /// office; not a login path.
    pub username: Option<String>,
    pub password: Option<String>,
}

impl TenantConfig {
    pub fn financials(&self) -> TenantFinancials {
        TenantFinancials {
            investment: self.investment,
            sales: self.sales_goal,
        }
    }

    pub fn branding(&self) -> TenantBranding {
        TenantBranding {
            slug: self.id_slug.clone(),
            name: self.name.clone(),
            logo_url: self.logo_url.clone(),
            theme_primary: self.theme_primary.clone(),
            theme_secondary: self.theme_secondary.clone(),
        }
    }
}

/// Body of a tenant upsert from the back office.
#[derive(Debug, Clone, Deserialize)]
pub struct TenantUpsert {
    pub name: String,
    #[serde(default)]
    pub client_type: Option<String>,
    pub webhook_url: String,
    #[serde(default)]
    pub investment: f64,
    #[serde(default)]
    pub sales_goal: f64,
    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub theme_primary: Option<String>,
    #[serde(default)]
    pub theme_secondary: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Compact tenant listing for the back-office sidebar.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TenantSummary {
    pub id_slug: String,
    pub name: String,
    pub webhook_url: String,
}

// ============ User / access models ============

/// One row of `user_profiles`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    /// sha-256 hex digest of the password.
    #[serde(skip_serializing)]
    pub password_digest: String,
    /// "admin" or "partner".
    pub role: String,
    pub is_active: bool,
}

/// Body of a user create/update from the back office.
#[derive(Debug, Clone, Deserialize)]
pub struct UserUpsert {
    pub name: String,
    pub email: String,
    /// Plaintext on the wire, digested before storage. Optional on update
    /// to keep the existing password.
    #[serde(default)]
    pub password: Option<String>,
    pub role: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    /// Tenant slugs this user may open; replaced wholesale on save.
    #[serde(default)]
    pub clients: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_lead_tolerates_extra_fields() {
        let json = r#"
        {
            "nombre": "Ana Torres",
            "estatus": "Lead Calificado",
            "fecha_creacion": "3/2/2026, 5:37:27 p.m.",
            "utm_campaign": "febrero-remarketing",
            "telefono": "999-123-4567",
            "score": 87
        }
        "#;

        let lead: RawLead = serde_json::from_str(json).unwrap();
        assert_eq!(lead.nombre.as_deref(), Some("Ana Torres"));
        assert_eq!(lead.estatus.as_deref(), Some("Lead Calificado"));
        assert_eq!(lead.utm_source, None);
        assert_eq!(lead.raw.get("score"), Some(&serde_json::json!(87)));
    }

    #[test]
    fn raw_lead_all_fields_optional() {
        let lead: RawLead = serde_json::from_str("{}").unwrap();
        assert!(lead.nombre.is_none());
        assert!(lead.estatus.is_none());
        assert!(lead.fecha_creacion.is_none());
    }

    #[test]
    fn source_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&SourceStatus::Unreachable).unwrap(),
            "\"unreachable\""
        );
    }
}
