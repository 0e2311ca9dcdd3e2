use crate::auth::{AuthService, LoginOutcome, Session};
use crate::config::Config;
use crate::dashboard::{empty_payload, DashboardContext};
use crate::errors::AppError;
use crate::filters::{DateRange, RangePreset};
use crate::ingest::LeadSourceClient;
use crate::models::{
    CanonicalLead, DashboardPayload, SourceStatus, TenantSummary, TenantUpsert, UserProfile,
    UserUpsert,
};
use crate::tenant_store::TenantStore;
use crate::user_store::{generate_password, UserStore};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;
use moka::future::Cache;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: PgPool,
    /// Application configuration.
    pub config: Config,
    /// HTTP client for tenant lead sources.
    pub source: Arc<LeadSourceClient>,
    /// Login and bearer-session service.
    pub auth: Arc<AuthService>,
    /// Per-tenant canonical lead collections, keyed by slug. Only
    /// successful fetches are cached; failures retry on the next request.
    pub leads_cache: Cache<String, Arc<Vec<CanonicalLead>>>,
}

impl AppState {
    fn tenants(&self) -> TenantStore {
        TenantStore::new(self.db.clone())
    }

    fn users(&self) -> UserStore {
        UserStore::new(self.db.clone())
    }
}

/// Health check endpoint.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "lead-dashboard-api",
            "version": "0.1.0"
        })),
    )
}

// ============ Auth endpoints ============

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>, AppError> {
    let outcome = state.auth.login(&body.email, &body.password).await?;
    Ok(Json(outcome))
}

/// POST /api/v1/auth/logout — idempotent, always 204.
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> StatusCode {
    state.auth.logout(&headers).await;
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Session>, AppError> {
    let session = state.auth.authorize(&headers).await?;
    Ok(Json(session))
}

// ============ Dashboard ============

#[derive(Debug, Deserialize)]
pub struct DashboardQuery {
    /// Preset range; ignored when `start`/`end` are present.
    pub range: Option<RangePreset>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Bypass the cached lead collection and re-fetch from the source.
    #[serde(default)]
    pub refresh: bool,
}

impl DashboardQuery {
    fn resolve_range(&self, today: NaiveDate) -> DateRange {
        if self.start.is_some() || self.end.is_some() {
            DateRange::custom(self.start, self.end)
        } else {
            DateRange::from_preset(self.range.unwrap_or(RangePreset::All), today)
        }
    }
}

/// GET /api/v1/dashboard/:slug
///
/// The main dashboard payload. A source failure does not fail the
/// request: the payload comes back with zeroed metrics and a
/// `source_status` the front end turns into an empty-state banner.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Query(params): Query<DashboardQuery>,
) -> Result<Json<DashboardPayload>, AppError> {
    let session = state.auth.authorize(&headers).await?;
    if !session.can_access(&slug) {
        tracing::warn!("'{}' denied access to dashboard '{}'", session.email, slug);
        return Err(AppError::Unauthorized(format!(
            "No access to dashboard '{}'",
            slug
        )));
    }

    let tenant = state.tenants().get(&slug).await?;
    let branding = tenant.branding();
    let financials = tenant.financials();

    let (leads, source_status) = match load_leads(&state, &slug, &tenant.webhook_url, params.refresh)
        .await
    {
        Ok(pair) => pair,
        Err(err) if err.is_source_failure() => {
            tracing::warn!("Lead source failure for '{}': {}", slug, err);
            let status = match err {
                AppError::MalformedSource(_) => SourceStatus::Malformed,
                _ => SourceStatus::Unreachable,
            };
            return Ok(Json(empty_payload(branding, financials, status)));
        }
        Err(err) => return Err(err),
    };

    let today = chrono::Local::now().date_naive();
    let ctx = DashboardContext {
        leads: &leads,
        range: params.resolve_range(today),
        financials,
    };
    Ok(Json(ctx.build(branding, source_status)))
}

async fn load_leads(
    state: &AppState,
    slug: &str,
    webhook_url: &str,
    refresh: bool,
) -> Result<(Arc<Vec<CanonicalLead>>, SourceStatus), AppError> {
    if !refresh {
        if let Some(cached) = state.leads_cache.get(slug).await {
            tracing::debug!("Lead cache hit for '{}' ({} leads)", slug, cached.len());
            let status = status_for(&cached);
            return Ok((cached, status));
        }
    }

    let leads = Arc::new(state.source.fetch_leads(webhook_url).await?);
    state.leads_cache.insert(slug.to_string(), leads.clone()).await;
    tracing::info!("Fetched {} leads for '{}'", leads.len(), slug);
    let status = status_for(&leads);
    Ok((leads, status))
}

fn status_for(leads: &[CanonicalLead]) -> SourceStatus {
    if leads.is_empty() {
        SourceStatus::Empty
    } else {
        SourceStatus::Ok
    }
}

/// GET /api/v1/tenants — the dashboard picker for the logged-in user.
/// Admins see every tenant, partners only their grants.
pub async fn list_accessible_tenants(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TenantSummary>>, AppError> {
    let session = state.auth.authorize(&headers).await?;
    let tenants = if session.is_admin() {
        state.tenants().list().await?
    } else {
        state.tenants().list_by_slugs(&session.grants).await?
    };
    Ok(Json(tenants))
}

// ============ Back office: tenants ============

pub async fn admin_list_tenants(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<TenantSummary>>, AppError> {
    state.auth.authorize_admin(&headers).await?;
    Ok(Json(state.tenants().list().await?))
}

pub async fn admin_get_tenant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<Json<crate::models::TenantConfig>, AppError> {
    state.auth.authorize_admin(&headers).await?;
    Ok(Json(state.tenants().get(&slug).await?))
}

pub async fn admin_create_tenant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<TenantUpsert>,
) -> Result<(StatusCode, Json<crate::models::TenantConfig>), AppError> {
    state.auth.authorize_admin(&headers).await?;
    let saved = state.tenants().upsert(None, body).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn admin_update_tenant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
    Json(body): Json<TenantUpsert>,
) -> Result<Json<crate::models::TenantConfig>, AppError> {
    state.auth.authorize_admin(&headers).await?;
    let saved = state.tenants().upsert(Some(&slug), body).await?;
    // A config change invalidates whatever leads we cached for the slug;
    // the webhook URL may have moved.
    state.leads_cache.invalidate(&saved.id_slug).await;
    Ok(Json(saved))
}

pub async fn admin_delete_tenant(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(slug): Path<String>,
) -> Result<StatusCode, AppError> {
    state.auth.authorize_admin(&headers).await?;
    state.tenants().delete(&slug).await?;
    state.leads_cache.invalidate(&slug).await;
    Ok(StatusCode::NO_CONTENT)
}

// ============ Back office: users ============

pub async fn admin_list_users(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserProfile>>, AppError> {
    state.auth.authorize_admin(&headers).await?;
    Ok(Json(state.users().list().await?))
}

pub async fn admin_save_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<UserUpsert>,
) -> Result<Json<UserProfile>, AppError> {
    state.auth.authorize_admin(&headers).await?;
    Ok(Json(state.users().upsert(body).await?))
}

pub async fn admin_delete_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.auth.authorize_admin(&headers).await?;
    state.users().delete(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/admin/password-suggestion — a fresh operator password for
/// the create-user form. Never stored server-side.
pub async fn admin_password_suggestion(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    state.auth.authorize_admin(&headers).await?;
    Ok(Json(json!({ "password": generate_password() })))
}
