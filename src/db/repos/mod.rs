pub mod parts;
pub mod technicians;
pub mod work_orders;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;

/// Parse a JSON TEXT column into a typed value, surfacing corrupt rows as
/// conversion failures instead of silently dropping data.
pub(crate) fn json_column<T: serde::de::DeserializeOwned>(
    idx: usize,
    raw: String,
) -> rusqlite::Result<T> {
    serde_json::from_str(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse an RFC 3339 TEXT column into a UTC timestamp.
pub(crate) fn datetime_column(idx: usize, raw: String) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
