use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// OAuth token payload as persisted in a token store.
///
/// `expires_at` is computed locally as `issued_at + expires_in` whenever a token is
/// issued or refreshed. Services that hand out non-expiring tokens (Simkl) leave it
/// unset, and such a record is never considered fresh by the expiry check.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub expires_in: u64,
    #[serde(
        default,
        serialize_with = "serialize_unix_seconds",
        deserialize_with = "deserialize_unix_seconds"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
}

impl TokenRecord {
    /// Build a record for a token issued (or refreshed) at `issued_at`.
    pub fn issued(
        access_token: String,
        refresh_token: String,
        expires_in: u64,
        issued_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_in,
            expires_at: expiry_after(issued_at, expires_in),
            token_type: None,
            scope: None,
            created_at: None,
        }
    }

    /// A record for a token that carries no expiry information.
    pub fn without_expiry(access_token: String) -> Self {
        Self {
            access_token,
            refresh_token: String::new(),
            expires_in: 0,
            expires_at: None,
            token_type: None,
            scope: None,
            created_at: None,
        }
    }

    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at > now)
    }

    pub fn has_refresh_token(&self) -> bool {
        !self.refresh_token.trim().is_empty()
    }
}

/// `None` when `expires_in` is too large to represent, which the freshness check
/// then treats like a token without expiry.
fn expiry_after(issued_at: DateTime<Utc>, expires_in: u64) -> Option<DateTime<Utc>> {
    let secs = i64::try_from(expires_in).ok()?;
    issued_at.checked_add_signed(Duration::try_seconds(secs)?)
}

// Stored as Unix seconds. Fractional values are accepted on read since older token
// files were written with float timestamps.
fn serialize_unix_seconds<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(dt) => serializer.serialize_some(&dt.timestamp()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_unix_seconds<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(secs) if secs.is_finite() => {
            let whole = secs.trunc() as i64;
            let nanos = ((secs - secs.trunc()) * 1_000_000_000.0).round() as u32;
            DateTime::from_timestamp(whole, nanos.min(999_999_999))
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("expires_at out of range: {}", secs)))
        }
        Some(secs) => Err(serde::de::Error::custom(format!("invalid expires_at: {}", secs))),
    }
}
