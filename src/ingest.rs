//! Lead ingestion: fetch a tenant's webhook and canonicalize its records.

use chrono::NaiveDateTime;
use std::time::Duration;

use crate::dates::parse_creation_date;
use crate::errors::AppError;
use crate::models::{CanonicalLead, RawLead};
use crate::taxonomy::normalize;

/// HTTP client for tenant lead sources.
///
/// One bare GET per dashboard load; no retry, no pagination, no partial
/// results. Either the full current lead set comes back or the caller
/// gets a source-level failure and shows the empty state.
#[derive(Clone)]
pub struct LeadSourceClient {
    client: reqwest::Client,
}

impl LeadSourceClient {
    /// Creates the client with a bounded request timeout so a dead
    /// webhook surfaces as `SourceUnreachable` instead of hanging the
    /// dashboard load.
    pub fn new(timeout: Duration) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create lead source client: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Fetches and canonicalizes a tenant's full lead set.
    ///
    /// Source order is preserved. Per-record anomalies (unknown status,
    /// garbled date) degrade inside the record; only source-level
    /// failures (transport, non-2xx, non-array body) are errors.
    pub async fn fetch_leads(&self, webhook_url: &str) -> Result<Vec<CanonicalLead>, AppError> {
        let url = url::Url::parse(webhook_url)
            .map_err(|e| AppError::BadRequest(format!("Invalid webhook URL: {}", e)))?;

        tracing::info!("Fetching leads from source: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| {
            AppError::SourceUnreachable(format!("Lead source request failed: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AppError::SourceUnreachable(format!(
                "Lead source returned status {}",
                status
            )));
        }

        let body = response.text().await.map_err(|e| {
            AppError::SourceUnreachable(format!("Failed to read lead source body: {}", e))
        })?;

        let raw_leads: Vec<RawLead> = serde_json::from_str(&body).map_err(|e| {
            AppError::MalformedSource(format!("Expected a JSON array of lead objects: {}", e))
        })?;

        let now = chrono::Local::now().naive_local();
        let leads: Vec<CanonicalLead> = raw_leads
            .into_iter()
            .map(|raw| canonicalize(raw, now))
            .collect();

        let failures = leads.iter().filter(|l| l.date_parse_failed).count();
        if failures > 0 {
            tracing::warn!(
                "{} of {} leads had unparseable creation dates",
                failures,
                leads.len()
            );
        }
        tracing::info!("Ingested {} leads", leads.len());

        Ok(leads)
    }
}

/// Derives the canonical projection of a raw lead.
///
/// Pure given `now`: the same raw input always yields the same canonical
/// fields, which is what makes re-filtering the cached collection safe.
pub fn canonicalize(raw: RawLead, now: NaiveDateTime) -> CanonicalLead {
    let status = normalize(raw.estatus.as_deref());
    let parsed = parse_creation_date(raw.fecha_creacion.as_deref(), now);

    CanonicalLead {
        nombre: raw.nombre,
        status,
        created_at: Some(parsed.at),
        date_parse_failed: parsed.failed,
        utm_campaign: raw.utm_campaign,
        utm_source: raw.utm_source,
        utm_medium: raw.utm_medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::CanonicalStatus;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn raw(estatus: Option<&str>, fecha: Option<&str>) -> RawLead {
        RawLead {
            nombre: Some("Luis Pérez".to_string()),
            estatus: estatus.map(String::from),
            fecha_creacion: fecha.map(String::from),
            utm_campaign: None,
            utm_source: None,
            utm_medium: None,
            raw: serde_json::json!({}),
        }
    }

    #[test]
    fn canonicalize_derives_status_and_date() {
        let lead = canonicalize(
            raw(Some("Lead Calificado"), Some("3/2/2026, 5:37:27 p.m.")),
            now(),
        );
        assert_eq!(lead.status, CanonicalStatus::LeadQualified);
        assert!(!lead.date_parse_failed);
        assert_eq!(
            lead.created_at.unwrap().date(),
            NaiveDate::from_ymd_opt(2026, 2, 3).unwrap()
        );
    }

    #[test]
    fn canonicalize_is_referentially_transparent() {
        let a = canonicalize(raw(Some("rechazado"), Some("1/1/2026")), now());
        let b = canonicalize(raw(Some("rechazado"), Some("1/1/2026")), now());
        assert_eq!(a.status, b.status);
        assert_eq!(a.created_at, b.created_at);
        assert_eq!(a.date_parse_failed, b.date_parse_failed);
    }

    #[test]
    fn missing_fields_degrade_per_record() {
        let lead = canonicalize(raw(None, None), now());
        assert_eq!(lead.status, CanonicalStatus::Unknown);
        assert!(!lead.is_qualified());
        assert!(lead.date_parse_failed);
        assert_eq!(lead.created_at, Some(now()));
    }
}
