//! Expiration marker encoding
//!
//! Servers carry their deadline as an `ExpirationTime` tag holding a UTC
//! instant in `YYYY-MM-DDTHH:MM:SS` form (no offset, whole seconds).

use chrono::{DateTime, NaiveDateTime, SubsecRound, Utc};

use crate::models::Tag;

/// Tag key holding the tenant identifier
pub const CUSTOMER_TAG: &str = "CustomerId";

/// Tag key holding the expiration instant
pub const EXPIRATION_TAG: &str = "ExpirationTime";

const TAG_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Offset-free forms accepted on read, all taken as UTC
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Drop sub-second precision so the encoded tag round-trips exactly
pub fn truncate(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(0)
}

/// Encode an instant as a tag value
pub fn encode(instant: DateTime<Utc>) -> String {
    instant.format(TAG_FORMAT).to_string()
}

/// Parse a tag value.
///
/// Accepts the encoded form with an optional fractional part, a space in
/// place of the `T`, minute precision, and RFC 3339 values with an explicit
/// offset. Anything else yields `None`.
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    if let Some(naive) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Some(naive.and_utc());
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Build the `ExpirationTime` tag for an instant
pub fn expiration_tag(instant: DateTime<Utc>) -> Tag {
    Tag::new(EXPIRATION_TAG, encode(instant))
}

/// Look up and parse the expiration marker in a tag set
pub fn find_expiration(tags: &[Tag]) -> Option<DateTime<Utc>> {
    tags.iter()
        .find(|tag| tag.key == EXPIRATION_TAG)
        .and_then(|tag| parse(&tag.value))
}

/// A server is expired once its deadline is reached, boundary included
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    expires_at <= now
}
