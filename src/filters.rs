//! Publish filtering and date ordering over parsed records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::cmp::Ordering;

use crate::parser::ContentRecord;

/// Direction for [`sort_by_date`]. Newest first unless asked otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

impl SortOrder {
    pub fn from_ascending(ascending: bool) -> Self {
        if ascending {
            SortOrder::Ascending
        } else {
            SortOrder::Descending
        }
    }
}

/// Parse a `publishDate` value. Date-only and zone-less values are taken as UTC.
pub fn parse_publish_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn publish_date(record: &ContentRecord) -> Option<DateTime<Utc>> {
    parse_publish_date(&record.metadata().publish_date)
}

/// Records that are not drafts and whose publish date has passed.
pub fn filter_published(records: &[ContentRecord]) -> Vec<ContentRecord> {
    filter_published_at(records, Utc::now())
}

/// [`filter_published`] evaluated at a fixed instant. Records with an
/// unparseable publish date are never eligible.
pub fn filter_published_at(records: &[ContentRecord], now: DateTime<Utc>) -> Vec<ContentRecord> {
    records
        .iter()
        .filter(|record| !record.metadata().draft)
        .filter(|record| publish_date(record).is_some_and(|date| date <= now))
        .cloned()
        .collect()
}

/// Stable sort by publish date into a new vector. Unparseable dates go last
/// in either direction.
pub fn sort_by_date(records: &[ContentRecord], order: SortOrder) -> Vec<ContentRecord> {
    let mut keyed: Vec<(Option<DateTime<Utc>>, &ContentRecord)> = records
        .iter()
        .map(|record| (publish_date(record), record))
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => match order {
            SortOrder::Ascending => a.cmp(b),
            SortOrder::Descending => b.cmp(a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    keyed.into_iter().map(|(_, record)| record.clone()).collect()
}
