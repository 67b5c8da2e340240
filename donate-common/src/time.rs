//! Timestamp utilities

use chrono::{DateTime, Duration, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Advisory expiry of a proof session created at `created_at`
pub fn session_expiry(created_at: DateTime<Utc>, ttl_minutes: u32) -> DateTime<Utc> {
    created_at + Duration::minutes(i64::from(ttl_minutes))
}

/// Parse a client-supplied RFC 3339 capture time, falling back to `fallback`
///
/// Clients that cannot read the device clock send nothing or garbage; the
/// receipt time is used instead.
pub fn parse_capture_time(raw: Option<&str>, fallback: DateTime<Utc>) -> DateTime<Utc> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(fallback)
}
