use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Key under which Simkl carries the Trakt slug of a show.
pub const TRAKT_SLUG_KEY: &str = "traktslug";

/// External identifiers for a media item, keyed by namespace.
///
/// Simkl returns a heterogeneous map (`simkl` is numeric, `imdb` and `slug` are
/// strings, `tmdb` may be either), so values are kept as raw JSON and forwarded
/// unchanged when submitting movies to Trakt.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct MediaIds(BTreeMap<String, Value>);

impl MediaIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, namespace: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(namespace.into(), value.into());
    }

    /// Identifier as a string, whether the service sent it as a string or a number.
    pub fn get_str(&self, namespace: &str) -> Option<String> {
        match self.0.get(namespace)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn trakt_slug(&self) -> Option<String> {
        self.get_str(TRAKT_SLUG_KEY)
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mixed_value_types() {
        let ids: MediaIds = serde_json::from_value(json!({
            "simkl": 53536,
            "slug": "the-office",
            "imdb": "tt0386676",
            "tmdb": "2316",
            "traktslug": "the-office-us"
        }))
        .unwrap();

        assert_eq!(ids.get_str("simkl").as_deref(), Some("53536"));
        assert_eq!(ids.get_str("tmdb").as_deref(), Some("2316"));
        assert_eq!(ids.trakt_slug().as_deref(), Some("the-office-us"));
        assert_eq!(ids.get_str("imdb").as_deref(), Some("tt0386676"));
    }

    #[test]
    fn test_blank_slug_counts_as_missing() {
        let ids: MediaIds = serde_json::from_value(json!({ "traktslug": "  ", "simkl": 1 })).unwrap();
        assert!(ids.trakt_slug().is_none());
    }

    #[test]
    fn test_serializes_as_plain_map() {
        let mut ids = MediaIds::new();
        ids.insert("imdb", "tt1375666");
        ids.insert("tmdb", 27205);
        assert_eq!(
            serde_json::to_value(&ids).unwrap(),
            json!({ "imdb": "tt1375666", "tmdb": 27205 })
        );
    }
}
