//! Display formatting for raw `YYYYMMDD` document timestamps.
use chrono::NaiveDate;

use crate::types::{DocumentType, TimeGranularity};

/// Date used when a timestamp is missing or malformed.
pub const TIMESTAMP_SENTINEL: NaiveDate = NaiveDate::MIN;

const RAW_FORMAT: &str = "%Y%m%d";

impl TimeGranularity {
    /// strftime pattern for the granularity.
    pub fn pattern(self) -> &'static str {
        match self {
            TimeGranularity::Day => "%Y-%m-%d",
            TimeGranularity::Year => "%Y",
        }
    }

    /// Granularity for an optional document type; untyped rows show the year.
    pub fn for_type(doctype: Option<DocumentType>) -> Self {
        doctype.map_or(TimeGranularity::Year, DocumentType::time_granularity)
    }
}

/// Parse a raw timestamp, falling back to [`TIMESTAMP_SENTINEL`].
pub fn parse_timestamp(raw: Option<&str>) -> NaiveDate {
    raw.map(str::trim)
        .and_then(|s| NaiveDate::parse_from_str(s, RAW_FORMAT).ok())
        .unwrap_or(TIMESTAMP_SENTINEL)
}

pub fn format_timestamp(date: NaiveDate, granularity: TimeGranularity) -> String {
    date.format(granularity.pattern()).to_string()
}
