//! Small helpers shared by the fetchers and controllers.

use chrono::{DateTime, Utc};
use domains::{AppError, Result};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;

const KEY_SUFFIX_LEN: usize = 8;

/// Maps loose backend rows into typed records, rejecting the whole batch on
/// the first row that does not fit.
pub fn map_rows<T: DeserializeOwned>(entity: &'static str, rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter().map(|row| map_row(entity, row)).collect()
}

pub fn map_row<T: DeserializeOwned>(entity: &'static str, row: Value) -> Result<T> {
    serde_json::from_value(row).map_err(|e| AppError::malformed(entity, e))
}

/// Collision-resistant object key: `<millis>-<random suffix>.<ext>`.
pub fn storage_key(now: DateTime<Utc>, extension: &str) -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(KEY_SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{suffix}.{extension}", now.timestamp_millis())
}

/// Appends a `t=<millis>` query parameter so browsers and CDNs refetch an
/// object whose URL they may already have cached.
pub fn cache_bust(url: &str, now: DateTime<Utc>) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}t={}", now.timestamp_millis())
}

/// First line of `text`, cut to at most `max_chars` characters.
pub fn title_from(text: &str, max_chars: usize) -> String {
    let line = text.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let mut cut: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tokio_test::assert_err;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn storage_key_has_timestamp_suffix_and_extension() {
        let key = storage_key(at(1_700_000_000_123), "png");
        let (stamp, rest) = key.split_once('-').unwrap();
        assert_eq!(stamp, "1700000000123");
        let (suffix, ext) = rest.split_once('.').unwrap();
        assert_eq!(suffix.len(), KEY_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(ext, "png");
    }

    #[test]
    fn storage_keys_differ_within_same_millisecond() {
        let now = at(42);
        assert_ne!(storage_key(now, "jpg"), storage_key(now, "jpg"));
    }

    #[test]
    fn cache_bust_respects_existing_query() {
        assert_eq!(cache_bust("https://cdn/x.png", at(5)), "https://cdn/x.png?t=5");
        assert_eq!(cache_bust("https://cdn/x.png?w=10", at(5)), "https://cdn/x.png?w=10&t=5");
    }

    #[test]
    fn title_uses_first_non_blank_line() {
        assert_eq!(title_from("\n  spam spam\nmore", 80), "spam spam");
        assert_eq!(title_from("abcdef", 4), "abc…");
        assert_eq!(title_from("", 4), "");
    }

    #[test]
    fn map_rows_rejects_wrong_shape() {
        #[derive(serde::Deserialize, Debug)]
        struct Row {
            #[allow(dead_code)]
            id: String,
        }
        let err = assert_err!(map_rows::<Row>("thing", vec![serde_json::json!({ "id": 5 })]));
        assert!(matches!(err, AppError::Malformed { entity: "thing", .. }));
    }
}
