//! Date-range filtering over the canonical lead collection.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::models::CanonicalLead;

/// Inclusive `[start, end]` interval over lead creation instants.
/// Both `None` means unbounded ("all time"). An inverted interval is not
/// rejected; it simply selects nothing — callers own range sanity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateRange {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

/// Predefined ranges offered by the dashboard's range picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    Today,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
    ThisMonth,
    LastMonth,
    All,
}

fn start_of_day(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::from_hms_opt(0, 0, 0).unwrap())
}

fn end_of_day(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap())
}

fn first_of_month(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).unwrap()
}

impl DateRange {
    /// Builds the range a preset describes, relative to `today`.
    pub fn from_preset(preset: RangePreset, today: NaiveDate) -> Self {
        match preset {
            RangePreset::Today => DateRange {
                start: Some(start_of_day(today)),
                end: Some(end_of_day(today)),
            },
            RangePreset::Last7Days => DateRange {
                start: Some(start_of_day(today - chrono::Duration::days(7))),
                end: Some(end_of_day(today)),
            },
            RangePreset::Last30Days => DateRange {
                start: Some(start_of_day(today - chrono::Duration::days(30))),
                end: Some(end_of_day(today)),
            },
            RangePreset::ThisMonth => DateRange {
                start: Some(start_of_day(first_of_month(today))),
                end: Some(end_of_day(today)),
            },
            RangePreset::LastMonth => {
                let first_this_month = first_of_month(today);
                let last_of_prev = first_this_month - chrono::Duration::days(1);
                DateRange {
                    start: Some(start_of_day(first_of_month(last_of_prev))),
                    end: Some(end_of_day(last_of_prev)),
                }
            }
            RangePreset::All => DateRange::default(),
        }
    }

    /// Explicit custom range from the date picker; `end` is pushed to the
    /// end of its day so the bound stays inclusive.
    pub fn custom(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange {
            start: start.map(start_of_day),
            end: end.map(end_of_day),
        }
    }

    fn contains(&self, at: NaiveDateTime) -> bool {
        if let Some(start) = self.start {
            if at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if at > end {
                return false;
            }
        }
        true
    }
}

/// Selects the leads falling inside `range`, preserving input order.
///
/// Leads without a creation instant cannot be range-tested and are always
/// excluded. Pure: the source collection is never mutated.
pub fn filter_by_range(leads: &[CanonicalLead], range: &DateRange) -> Vec<CanonicalLead> {
    leads
        .iter()
        .filter(|lead| match lead.created_at {
            Some(at) => range.contains(at),
            None => false,
        })
        .cloned()
        .collect()
}
