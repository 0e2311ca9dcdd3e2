//! Dashboard session controller.
//!
//! Owns the glue between the ingested (read-only) lead collection and
//! the derived values a render needs: filter, aggregate, bucket, tabulate.
//! Everything here is an explicit context passed in by the handler — no
//! ambient state survives between filter changes, so every payload is a
//! fresh pure derivation.

use crate::filters::{filter_by_range, DateRange};
use crate::metrics::aggregate;
use crate::models::{
    CanonicalLead, DashboardPayload, LeadRow, SourceStatus, TenantBranding, TenantFinancials,
};
use crate::series::{by_campaign, by_day, by_source_top};

/// How many source buckets the attribution list shows.
const TOP_SOURCES: usize = 5;

/// Fallback display name for a lead without one.
const ANONYMOUS_LEAD: &str = "Lead Anonymous";

/// Inputs for one dashboard derivation: the session's canonical lead
/// collection, the active range filter, and the tenant's financials.
pub struct DashboardContext<'a> {
    pub leads: &'a [CanonicalLead],
    pub range: DateRange,
    pub financials: TenantFinancials,
}

impl<'a> DashboardContext<'a> {
    /// Computes the full dashboard payload for the current filter.
    ///
    /// The metrics `qualified` count and the table rows go through the
    /// identical predicate, so the KPI card and the table never disagree.
    pub fn build(&self, tenant: TenantBranding, source_status: SourceStatus) -> DashboardPayload {
        let filtered = filter_by_range(self.leads, &self.range);
        tracing::debug!(
            "Dashboard derivation: {} of {} leads in range",
            filtered.len(),
            self.leads.len()
        );

        let metrics = aggregate(&filtered, &self.financials);
        let daily = by_day(&filtered);
        let campaigns = by_campaign(&filtered, true);
        let top_sources = by_source_top(&filtered, TOP_SOURCES);
        let qualified_rows = table_rows(&filtered, !self.leads.is_empty());

        DashboardPayload {
            tenant,
            source_status,
            metrics,
            daily,
            campaigns,
            top_sources,
            qualified_rows,
        }
    }
}

/// Payload for a dashboard whose source fetch failed: same shape, all
/// zeros, so the front end renders the empty state instead of an error.
pub fn empty_payload(
    tenant: TenantBranding,
    financials: TenantFinancials,
    source_status: SourceStatus,
) -> DashboardPayload {
    DashboardContext {
        leads: &[],
        range: DateRange::default(),
        financials,
    }
    .build(tenant, source_status)
}

/// Builds the qualified-leads table. When the filter leaves no qualified
/// lead but the session does have leads, the table falls back to showing
/// everything in range rather than an empty table next to non-zero KPIs.
fn table_rows(filtered: &[CanonicalLead], session_has_leads: bool) -> Vec<LeadRow> {
    let qualified: Vec<&CanonicalLead> =
        filtered.iter().filter(|l| l.is_qualified()).collect();

    let shown: Vec<&CanonicalLead> = if qualified.is_empty() && session_has_leads {
        filtered.iter().collect()
    } else {
        qualified
    };

    shown.into_iter().map(lead_row).collect()
}

fn lead_row(lead: &CanonicalLead) -> LeadRow {
    LeadRow {
        name: lead
            .nombre
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| ANONYMOUS_LEAD.to_string()),
        date: lead.created_at.map(|at| at.format("%d/%m/%Y").to_string()),
        status: lead.status.label().to_string(),
        qualified: lead.is_qualified(),
        channel: lead
            .utm_medium
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "Directo".to_string()),
    }
}
