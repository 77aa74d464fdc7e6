// src/models/timestamp.rs

use chrono::{DateTime, Utc};

use crate::error::{MispError, Result};

/// Parse a MISP timestamp (decimal seconds since the Unix epoch)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let seconds = raw.parse::<i64>().map_err(|e| MispError::InvalidTimestamp {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;

    DateTime::from_timestamp(seconds, 0).ok_or_else(|| MispError::InvalidTimestamp {
        raw: raw.to_string(),
        reason: "out of range".to_string(),
    })
}

/// Accessor variant: a malformed value is a broken record, not a runtime condition
pub(crate) fn expect_timestamp(raw: &str) -> DateTime<Utc> {
    match parse_timestamp(raw) {
        Ok(ts) => ts,
        Err(e) => panic!("malformed MISP timestamp: {e}"),
    }
}
