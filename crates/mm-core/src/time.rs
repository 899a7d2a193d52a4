//! Timestamps and the time formats used by the file formats and derived ids.
//!
//! All times are UTC with millisecond precision.  `chrono` does the parsing
//! and formatting; the constants here pin the exact layouts so that stored
//! corpora remain readable across versions.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::CoreResult;

/// A UTC instant with millisecond precision.
pub type Timestamp = DateTime<Utc>;

/// Point rows in trajectory files: `2008/02/02 13:30:45`.
pub const TRAJ_TIME_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Path-file timestamps: ISO 8601 with space separator and milliseconds,
/// `2008-02-02 13:30:45.123`.
pub const PATH_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Second-precision compact form used in trajectory ids.
pub const ID_SECONDS_FORMAT: &str = "%Y%m%d%H%M%S";

/// Minute-precision compact form used in path ids and filter-derived tids.
pub const ID_MINUTES_FORMAT: &str = "%Y%m%d%H%M";

/// Parse a timestamp in the given format, interpreting it as UTC.
pub fn parse_timestamp(s: &str, format: &str) -> CoreResult<Timestamp> {
    Ok(NaiveDateTime::parse_from_str(s, format)?.and_utc())
}

/// Format a timestamp with the given layout.
pub fn format_timestamp(t: Timestamp, format: &str) -> String {
    t.format(format).to_string()
}
