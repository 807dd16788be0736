//! # HTTP Dates
//! src/http/date.rs
//!
//! RFC 1123 dates for the `Date` response header and for the
//! `If-Modified-Since` / `If-Unmodified-Since` request headers.
//!
//! ```text
//! Sun, 06 Nov 1994 08:49:37 GMT
//! ```

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};

const GMT_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Current time as an RFC 1123 string
pub fn now_gmt() -> String {
    format_gmt(Utc::now())
}

/// Formats a UTC instant as an RFC 1123 string with second precision
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use tippy::http::date::format_gmt;
///
/// let at = Utc.with_ymd_and_hms(1994, 11, 6, 8, 49, 37).unwrap();
/// assert_eq!(format_gmt(at), "Sun, 06 Nov 1994 08:49:37 GMT");
/// ```
pub fn format_gmt(at: DateTime<Utc>) -> String {
    // `%S` would print 60 inside a leap second, so the seconds are written by hand.
    format!(
        "{}{:02} GMT",
        at.format("%a, %d %b %Y %H:%M:"),
        clamp_leap_second(at.second())
    )
}

/// Folds leap-second values (60, 61) back into the 0..=59 range
pub fn clamp_leap_second(second: u32) -> u32 {
    if second > 59 {
        second % 60
    } else {
        second
    }
}

/// Parses an RFC 1123 string into seconds since the epoch
///
/// Returns `None` for anything that is not in the exact format.
pub fn parse_gmt(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value.trim(), GMT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().timestamp())
}
