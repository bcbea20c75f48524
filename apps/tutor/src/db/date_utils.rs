//! Conversions between stored epoch milliseconds and chrono timestamps.

use chrono::{DateTime, Utc};

use super::error::DbError;

pub fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub fn from_millis(millis: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| DbError::InvalidData(format!("timestamp out of range: {millis}")))
}
