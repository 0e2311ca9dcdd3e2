//! KPI aggregation over a filtered lead collection.

use crate::models::{CanonicalLead, MetricsSnapshot, TenantFinancials};

/// Computes the KPI set from the filtered leads and the tenant's
/// financial inputs.
///
/// Pure and deterministic. Every division is zero-guarded: an empty
/// collection or zero investment yields `0`, never NaN or an error, so
/// the dashboard can always render a snapshot.
pub fn aggregate(leads: &[CanonicalLead], financials: &TenantFinancials) -> MetricsSnapshot {
    let total = leads.len();
    let qualified = leads.iter().filter(|l| l.is_qualified()).count();
    let date_parse_failures = leads.iter().filter(|l| l.date_parse_failed).count();

    let investment = financials.investment;
    let sales = financials.sales;

    let conversion_rate = if total > 0 {
        qualified as f64 / total as f64
    } else {
        0.0
    };
    let roi = if investment > 0.0 { sales / investment } else { 0.0 };
    let cost_per_qualified = if qualified > 0 {
        investment / qualified as f64
    } else {
        0.0
    };

    MetricsSnapshot {
        total,
        qualified,
        conversion_rate,
        investment,
        sales,
        roi,
        cost_per_qualified,
        date_parse_failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::CanonicalStatus;
    use chrono::NaiveDate;

    fn lead(status: CanonicalStatus) -> CanonicalLead {
        CanonicalLead {
            nombre: None,
            status,
            created_at: NaiveDate::from_ymd_opt(2026, 2, 3)
                .map(|d| d.and_hms_opt(12, 0, 0).unwrap()),
            date_parse_failed: false,
            utm_campaign: None,
            utm_source: None,
            utm_medium: None,
        }
    }

    fn financials(investment: f64, sales: f64) -> TenantFinancials {
        TenantFinancials { investment, sales }
    }

    #[test]
    fn kpi_scenario_ten_leads_four_qualified() {
        let mut leads: Vec<_> = (0..4).map(|_| lead(CanonicalStatus::LeadQualified)).collect();
        leads.extend((0..6).map(|_| lead(CanonicalStatus::Rejected)));

        let m = aggregate(&leads, &financials(1000.0, 5000.0));
        assert_eq!(m.total, 10);
        assert_eq!(m.qualified, 4);
        assert!((m.conversion_rate - 0.4).abs() < f64::EPSILON);
        assert!((m.roi - 5.0).abs() < f64::EPSILON);
        assert!((m.cost_per_qualified - 250.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_collection_yields_all_zero_snapshot() {
        let m = aggregate(&[], &financials(1000.0, 5000.0));
        assert_eq!(m.total, 0);
        assert_eq!(m.qualified, 0);
        assert_eq!(m.conversion_rate, 0.0);
        assert_eq!(m.cost_per_qualified, 0.0);
        // ROI only depends on financials and stays finite.
        assert!((m.roi - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_investment_guards_roi_and_cost() {
        let leads = vec![lead(CanonicalStatus::LeadQualified)];
        let m = aggregate(&leads, &financials(0.0, 5000.0));
        assert_eq!(m.roi, 0.0);
        assert_eq!(m.cost_per_qualified, 0.0);
        assert!(m.roi.is_finite() && m.conversion_rate.is_finite());
    }

    #[test]
    fn no_qualified_leads_guards_cost_per_qualified() {
        let leads = vec![lead(CanonicalStatus::Rejected), lead(CanonicalStatus::Unknown)];
        let m = aggregate(&leads, &financials(1000.0, 0.0));
        assert_eq!(m.qualified, 0);
        assert_eq!(m.cost_per_qualified, 0.0);
        assert_eq!(m.conversion_rate, 0.0);
    }

    #[test]
    fn conditioned_counts_as_qualified() {
        let leads = vec![
            lead(CanonicalStatus::LeadConditioned),
            lead(CanonicalStatus::Rejected),
        ];
        let m = aggregate(&leads, &financials(100.0, 0.0));
        assert_eq!(m.qualified, 1);
        assert!((m.conversion_rate - 0.5).abs() < f64::EPSILON);
        assert!((m.cost_per_qualified - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn counts_date_parse_failures() {
        let mut bad = lead(CanonicalStatus::Unknown);
        bad.date_parse_failed = true;
        let m = aggregate(&[bad, lead(CanonicalStatus::Rejected)], &financials(0.0, 0.0));
        assert_eq!(m.date_parse_failures, 1);
    }
}
