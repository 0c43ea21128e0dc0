//! HTTP conditional request module
//!
//! Date-based validators for file downloads: `If-Modified-Since` and
//! `If-Range`. Stored files carry no `ETag`, so entity-tag validators never
//! match.

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

/// IMF-fixdate, e.g. `Mon, 01 Jan 2024 00:00:00 GMT`
pub fn http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parse any of the three HTTP-date forms (RFC 9110 §5.6.7)
pub fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    const FORMATS: [&str; 3] = [
        "%a, %d %b %Y %H:%M:%S GMT", // IMF-fixdate
        "%A, %d-%b-%y %H:%M:%S GMT", // RFC 850
        "%a %b %e %H:%M:%S %Y",      // asctime
    ];

    let value = value.trim();
    FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Check whether the client's cached copy is still current
///
/// # Arguments
/// * `if_modified_since` - Client-sent `If-Modified-Since` header
/// * `if_none_match` - Client-sent `If-None-Match` header; when present it
///   takes precedence and the date is not consulted
/// * `modified` - File modification time
///
/// # Returns
/// Returns true if the file has not changed since the given date (should
/// return 304), false otherwise
pub fn is_not_modified(
    if_modified_since: Option<&str>,
    if_none_match: Option<&str>,
    modified: DateTime<Utc>,
) -> bool {
    if if_none_match.is_some() || is_unknown_time(modified) {
        return false;
    }
    if_modified_since
        .and_then(parse_http_date)
        .is_some_and(|since| modified.trunc_subsecs(0) <= since)
}

/// Check whether a `Range` request may be served partially
///
/// Without `If-Range` the range always applies. A date validator must equal
/// the modification time to the second; anything else (an entity tag, an
/// unparsable date, a changed file) means the full body is sent instead.
pub fn if_range_matches(if_range: Option<&str>, modified: Option<DateTime<Utc>>) -> bool {
    let Some(validator) = if_range else {
        return true;
    };
    let Some(modified) = modified.filter(|m| !is_unknown_time(*m)) else {
        return false;
    };
    parse_http_date(validator).is_some_and(|date| modified.trunc_subsecs(0) == date)
}

/// Filesystems without timestamps report the epoch
fn is_unknown_time(time: DateTime<Utc>) -> bool {
    time.timestamp() == 0
}
