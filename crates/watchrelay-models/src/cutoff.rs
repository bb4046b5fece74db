use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_LOOKBACK_HOURS: i64 = 12;

/// Start of the lookback window for a single run.
///
/// Computed once per run; the source fetch's `date_from` parameter and every
/// in-window check derive from the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cutoff(DateTime<Utc>);

impl Cutoff {
    pub fn lookback(now: DateTime<Utc>, window: Duration) -> Self {
        Self(now - window)
    }

    pub fn at(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }

    /// Inclusive: a watch exactly at the cutoff is inside the window.
    pub fn includes(&self, watched_at: DateTime<Utc>) -> bool {
        watched_at >= self.0
    }

    /// Value used for the `date_from` query parameter.
    pub fn to_query_value(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl std::fmt::Display for Cutoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_query_value())
    }
}

/// Parse an ISO-8601 / RFC 3339 timestamp as returned by the tracking services.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
