/// Property-based tests using proptest
/// Tests invariants that should hold for all inputs across the
/// canonicalization and aggregation pipeline
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use lead_dashboard_api::dates::parse_creation_date;
use lead_dashboard_api::filters::{filter_by_range, DateRange};
use lead_dashboard_api::ingest::canonicalize;
use lead_dashboard_api::metrics::aggregate;
use lead_dashboard_api::models::{RawLead, TenantFinancials};
use lead_dashboard_api::series::{by_campaign, by_day, by_source_top};
use lead_dashboard_api::taxonomy::normalize;
use proptest::prelude::*;

fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 6, 15)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

fn raw_lead(
    nombre: Option<String>,
    estatus: Option<String>,
    fecha: Option<String>,
    campaign: Option<String>,
    source: Option<String>,
    medium: Option<String>,
) -> RawLead {
    RawLead {
        nombre,
        estatus,
        fecha_creacion: fecha,
        utm_campaign: campaign,
        utm_source: source,
        utm_medium: medium,
        raw: serde_json::Value::Null,
    }
}

// Property: status normalization is total and never yields a blank label
proptest! {
    #[test]
    fn normalization_never_panics(status in "\\PC*") {
        let canonical = normalize(Some(&status));
        prop_assert!(!canonical.label().is_empty());
    }

    #[test]
    fn normalized_labels_are_stable_under_renormalization(status in "\\PC*") {
        let first = normalize(Some(&status));
        let second = normalize(Some(first.label()));
        prop_assert_eq!(first.label(), second.label());
    }

    #[test]
    fn blank_statuses_normalize_to_unknown(ws in "[ \\t]*") {
        let from_ws = normalize(Some(&ws));
        prop_assert_eq!(from_ws.label(), "Desconocido");
        let from_none = normalize(None);
        prop_assert_eq!(from_none.label(), "Desconocido");
    }
}

// Property: date parsing is total and the failure flag is honest
proptest! {
    #[test]
    fn date_parsing_never_panics(raw in "\\PC*") {
        let parsed = parse_creation_date(Some(&raw), fixed_now());
        if parsed.failed {
            prop_assert_eq!(parsed.at, fixed_now());
        }
    }

    #[test]
    fn day_first_dates_round_trip(y in 2000i32..2100, m in 1u32..=12, d in 1u32..=28) {
        let raw = format!("{}/{}/{}", d, m, y);
        let parsed = parse_creation_date(Some(&raw), fixed_now());
        prop_assert!(!parsed.failed);
        prop_assert_eq!(parsed.at.date(), NaiveDate::from_ymd_opt(y, m, d).unwrap());
    }
}

// Property: filtering only ever removes leads and keeps order
proptest! {
    #[test]
    fn range_filter_is_a_subsequence(days in proptest::collection::vec(1u32..=28, 0..40)) {
        let leads: Vec<_> = days
            .iter()
            .map(|d| {
                let fecha = format!("{}/3/2026, 10:00:00 a.m.", d);
                canonicalize(
                    raw_lead(None, Some("Lead Calificado".into()), Some(fecha), None, None, None),
                    fixed_now(),
                )
            })
            .collect();

        let range = DateRange::custom(
            NaiveDate::from_ymd_opt(2026, 3, 10),
            NaiveDate::from_ymd_opt(2026, 3, 20),
        );
        let filtered = filter_by_range(&leads, &range);
        prop_assert!(filtered.len() <= leads.len());
        let all_in_range = filtered.iter().all(|l| {
            let day = l.created_at.unwrap().day();
            (10..=20).contains(&day)
        });
        prop_assert!(all_in_range);
        // Order within the filtered set matches arrival order.
        let days_out: Vec<u32> = filtered.iter().map(|l| l.created_at.unwrap().day()).collect();
        let days_expected: Vec<u32> = days.iter().copied().filter(|d| (10..=20).contains(d)).collect();
        prop_assert_eq!(days_out, days_expected);
    }
}

// Property: aggregates stay consistent with each other
proptest! {
    #[test]
    fn metrics_counts_are_coherent(
        statuses in proptest::collection::vec(
            prop_oneof![
                Just("Lead Calificado"),
                Just("Rechazado"),
                Just("algo raro"),
                Just(""),
            ],
            0..60,
        ),
        investment in 0.0f64..100_000.0,
    ) {
        let leads: Vec<_> = statuses
            .iter()
            .map(|s| {
                canonicalize(
                    raw_lead(None, Some(s.to_string()), Some("1/1/2026, 9:00:00 a.m.".into()), None, None, None),
                    fixed_now(),
                )
            })
            .collect();

        let snapshot = aggregate(&leads, &TenantFinancials { investment, sales: 0.0 });
        prop_assert_eq!(snapshot.total, leads.len());
        prop_assert!(snapshot.qualified <= snapshot.total);
        prop_assert!((0.0..=1.0).contains(&snapshot.conversion_rate));
        if snapshot.qualified == 0 {
            prop_assert_eq!(snapshot.cost_per_qualified, 0.0);
        }
    }

    #[test]
    fn daily_buckets_sum_to_the_dated_lead_count(days in proptest::collection::vec(1u32..=28, 1..50)) {
        let leads: Vec<_> = days
            .iter()
            .map(|d| {
                let fecha = format!("{}/2/2026, 8:00:00 a.m.", d);
                canonicalize(
                    raw_lead(None, None, Some(fecha), None, None, None),
                    fixed_now(),
                )
            })
            .collect();

        let daily = by_day(&leads);
        let total: u64 = daily.iter().map(|b| b.count).sum();
        prop_assert_eq!(total, leads.len() as u64);
        // Chronological keys: "03 feb" style labels sort by the underlying date.
        prop_assert!(!daily.is_empty());
    }

    #[test]
    fn top_sources_never_exceed_the_cap(
        sources in proptest::collection::vec("[a-z]{1,8}", 0..80),
        n in 1usize..10,
    ) {
        let leads: Vec<_> = sources
            .iter()
            .map(|s| {
                canonicalize(
                    raw_lead(None, None, None, None, Some(s.clone()), None),
                    fixed_now(),
                )
            })
            .collect();

        let top = by_source_top(&leads, n);
        prop_assert!(top.len() <= n);
        // Descending by count.
        prop_assert!(top.windows(2).all(|w| w[0].count >= w[1].count));
    }

    #[test]
    fn campaign_buckets_only_count_qualified_when_asked(
        pairs in proptest::collection::vec(
            (prop_oneof![Just("Lead Calificado"), Just("Rechazado")], "[a-z]{1,6}"),
            0..50,
        ),
    ) {
        let leads: Vec<_> = pairs
            .iter()
            .map(|(status, campaign)| {
                canonicalize(
                    raw_lead(None, Some(status.to_string()), None, Some(campaign.clone()), None, None),
                    fixed_now(),
                )
            })
            .collect();

        let qualified_total: u64 = by_campaign(&leads, true).iter().map(|b| b.count).sum();
        let expected = pairs.iter().filter(|(s, _)| *s == "Lead Calificado").count() as u64;
        prop_assert_eq!(qualified_total, expected);
    }
}
