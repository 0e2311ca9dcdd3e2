//! Chart series aggregation: day buckets, campaign buckets, top sources.

use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

use crate::models::{CanonicalLead, SeriesBucket};

/// Spanish month abbreviations for day labels ("03 feb"), matching the
/// es-MX formatting the dashboard renders.
const MONTHS_ES: [&str; 12] = [
    "ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic",
];

/// Label shown when a lead carries no campaign attribution.
pub const ORGANIC_LABEL: &str = "Orgánico / Otros";
/// Label shown when a lead carries neither source nor medium attribution.
pub const DIRECT_LABEL: &str = "Directo / Otro";

fn day_label(d: NaiveDate) -> String {
    format!("{:02} {}", d.day(), MONTHS_ES[d.month0() as usize])
}

/// Groups leads by calendar day of creation, chronologically ascending.
///
/// Leads without a creation instant are excluded. An empty result becomes
/// a single zero-count placeholder so chart renderers always receive a
/// non-empty series.
pub fn by_day(leads: &[CanonicalLead]) -> Vec<SeriesBucket> {
    let mut days: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for lead in leads {
        if let Some(day) = lead.created_day() {
            *days.entry(day).or_insert(0) += 1;
        }
    }

    if days.is_empty() {
        return vec![SeriesBucket {
            key: "N/A".to_string(),
            count: 0,
        }];
    }

    days.into_iter()
        .map(|(day, count)| SeriesBucket {
            key: day_label(day),
            count,
        })
        .collect()
}

/// Groups leads by `utm_campaign` in first-seen order, defaulting the
/// label when attribution is absent. With `qualified_only`, restricts to
/// leads passing the shared qualification predicate.
pub fn by_campaign(leads: &[CanonicalLead], qualified_only: bool) -> Vec<SeriesBucket> {
    let mut buckets: Vec<SeriesBucket> = Vec::new();
    for lead in leads {
        if qualified_only && !lead.is_qualified() {
            continue;
        }
        let key = non_empty(lead.utm_campaign.as_deref()).unwrap_or(ORGANIC_LABEL);
        bump(&mut buckets, key);
    }
    buckets
}

/// Groups leads by source attribution (`utm_source`, falling back to
/// `utm_medium`, falling back to the direct label) and returns the top
/// `n` buckets by descending count. Ties keep first-seen order.
pub fn by_source_top(leads: &[CanonicalLead], n: usize) -> Vec<SeriesBucket> {
    let mut buckets: Vec<SeriesBucket> = Vec::new();
    for lead in leads {
        let key = non_empty(lead.utm_source.as_deref())
            .or_else(|| non_empty(lead.utm_medium.as_deref()))
            .unwrap_or(DIRECT_LABEL);
        bump(&mut buckets, key);
    }

    // Stable sort keeps insertion order among equal counts.
    buckets.sort_by(|a, b| b.count.cmp(&a.count));
    buckets.truncate(n);
    buckets
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn bump(buckets: &mut Vec<SeriesBucket>, key: &str) {
    match buckets.iter_mut().find(|b| b.key == key) {
        Some(bucket) => bucket.count += 1,
        None => buckets.push(SeriesBucket {
            key: key.to_string(),
            count: 1,
        }),
    }
}
