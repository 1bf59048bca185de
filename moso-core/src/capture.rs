//! Attribution capture: turning a qualifying page URL into a pending
//! referral record.

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::page::QueryParams;
use crate::store::KeyValueStore;

/// Query parameter carrying the marketer id.
pub const MARKETER_PARAM: &str = "m";

/// Query parameter carrying the source marker.
pub const SOURCE_PARAM: &str = "source";

/// Source marker value that makes a URL an attribution link.
pub const SOURCE_MARKER: &str = "moso";

/// Postback sub-id parameter.
pub const SUB_ID_PARAM: &str = "u_id";

/// Postback campaign-id parameter.
pub const CAMPAIGN_ID_PARAM: &str = "c_id";

/// A captured attribution link awaiting relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralRecord {
    /// Full page URL the visitor landed on
    pub link: String,
    #[serde(deserialize_with = "integer_or_numeric_string")]
    pub marketer_id: i64,
    /// Capture time, epoch milliseconds
    pub timestamp: i64,
}

impl ReferralRecord {
    /// Build a record from a page URL, if it is an attribution link.
    ///
    /// The URL qualifies when it has a marketer id that parses as an integer
    /// and a `source` parameter equal to `moso`.
    pub fn from_location(location: &str, now_millis: i64) -> Option<Self> {
        let params = QueryParams::parse(location)?;
        if !params.has_value(SOURCE_PARAM, SOURCE_MARKER) {
            return None;
        }
        let marketer_id = parse_marketer_id(&params.get(MARKETER_PARAM)?)?;

        Some(Self {
            link: location.to_string(),
            marketer_id,
            timestamp: now_millis,
        })
    }

    /// Encode as the JSON text stored under the referrer key.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode stored text. Every one of `link`, `marketer_id` and `timestamp`
    /// must be present.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Milliseconds elapsed since capture.
    pub fn age_millis(&self, now_millis: i64) -> i64 {
        now_millis - self.timestamp
    }
}

fn parse_marketer_id(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Older writers stored the marketer id as the raw query string.
fn integer_or_numeric_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Integer(id) => Ok(id),
        Raw::Text(text) => parse_marketer_id(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("marketer_id is not an integer: {text}"))),
    }
}

/// Write the referral record for `location`, replacing any pending one.
///
/// Returns the stored record, or `None` when the URL does not qualify (in
/// which case the store is left untouched).
pub async fn capture_referral(
    location: &str,
    store: &dyn KeyValueStore,
    now_millis: i64,
) -> Result<Option<ReferralRecord>, StoreError> {
    let Some(record) = ReferralRecord::from_location(location, now_millis) else {
        return Ok(None);
    };

    let encoded = record
        .encode()
        .map_err(|e| StoreError::Corrupt(format!("failed to encode referral record: {}", e)))?;
    store.set(&encoded).await?;
    debug!(marketer_id = record.marketer_id, "Captured referral link");
    Ok(Some(record))
}

/// Persist the postback `u_id` and `c_id` parameters present on `location`.
///
/// Each value overwrites the stored one; an absent parameter leaves its
/// store untouched.
pub async fn capture_postback(
    location: &str,
    sub_id_store: &dyn KeyValueStore,
    campaign_id_store: &dyn KeyValueStore,
) -> Result<(), StoreError> {
    let Some(params) = QueryParams::parse(location) else {
        return Ok(());
    };

    if let Some(sub_id) = params.get(SUB_ID_PARAM) {
        sub_id_store.set(&sub_id).await?;
        debug!("Captured sub id");
    }
    if let Some(campaign_id) = params.get(CAMPAIGN_ID_PARAM) {
        campaign_id_store.set(&campaign_id).await?;
        debug!("Captured campaign id");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{CachedAreaStore, MemoryArea};
    use std::sync::Arc;

    fn memory_store(key: &str) -> CachedAreaStore {
        CachedAreaStore::new(Arc::new(MemoryArea::new()), key, "local storage")
    }

    #[test]
    fn qualifying_url_builds_record() {
        let record = ReferralRecord::from_location("https://x/?m=42&source=moso", 1_000).unwrap();
        assert_eq!(
            record,
            ReferralRecord {
                link: "https://x/?m=42&source=moso".to_string(),
                marketer_id: 42,
                timestamp: 1_000,
            }
        );
    }

    #[test]
    fn non_qualifying_urls_build_nothing() {
        for url in [
            "https://x/",
            "https://x/?m=42",
            "https://x/?source=moso",
            "https://x/?m=42&source=other",
            "https://x/?m=abc&source=moso",
            "https://x/?m=4.2&source=moso",
            "https://x/?m=&source=moso",
            "not a url?m=42&source=moso",
        ] {
            assert!(ReferralRecord::from_location(url, 1_000).is_none(), "{url}");
        }
    }

    #[test]
    fn negative_marketer_id_is_an_integer() {
        let record = ReferralRecord::from_location("https://x/?source=moso&m=-7", 1).unwrap();
        assert_eq!(record.marketer_id, -7);
    }

    #[test]
    fn encoded_record_uses_expected_fields() {
        let record = ReferralRecord {
            link: "https://x/?m=42&source=moso".to_string(),
            marketer_id: 42,
            timestamp: 1_700_000_000_000,
        };
        let encoded = record.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(ReferralRecord::decode(&encoded).unwrap(), record);
        assert_eq!(value["link"], "https://x/?m=42&source=moso");
        assert_eq!(value["marketer_id"], 42);
        assert_eq!(value["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn decode_accepts_string_marketer_id() {
        let record =
            ReferralRecord::decode(r#"{"link":"https://x","marketer_id":"42","timestamp":5}"#)
                .unwrap();
        assert_eq!(record.marketer_id, 42);
    }

    #[test]
    fn decode_rejects_incomplete_or_malformed_records() {
        for raw in [
            r#"{"link":"https://x","marketer_id":42}"#,
            r#"{"marketer_id":42,"timestamp":5}"#,
            r#"{"link":"https://x","timestamp":5}"#,
            r#"{"link":"https://x","marketer_id":"abc","timestamp":5}"#,
            r#""just a string""#,
            "{broken",
        ] {
            assert!(ReferralRecord::decode(raw).is_err(), "{raw}");
        }
    }

    #[tokio::test]
    async fn capture_overwrites_previous_record() {
        let store = memory_store("REFERRER");

        capture_referral("https://x/?m=1&source=moso", &store, 10)
            .await
            .unwrap();
        capture_referral("https://y/?m=2&source=moso", &store, 20)
            .await
            .unwrap();

        let stored = ReferralRecord::decode(&store.get().await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.marketer_id, 2);
        assert_eq!(stored.link, "https://y/?m=2&source=moso");
        assert_eq!(stored.timestamp, 20);
    }

    #[tokio::test]
    async fn non_qualifying_capture_leaves_record_alone() {
        let store = memory_store("REFERRER");
        capture_referral("https://x/?m=1&source=moso", &store, 10)
            .await
            .unwrap();

        let captured = capture_referral("https://x/plain", &store, 20).await.unwrap();

        assert!(captured.is_none());
        let stored = ReferralRecord::decode(&store.get().await.unwrap().unwrap()).unwrap();
        assert_eq!(stored.timestamp, 10);
    }

    #[tokio::test]
    async fn postback_params_are_stored_independently() {
        let sub = memory_store("SUB_ID");
        let campaign = memory_store("CAMPAIGN_ID");

        capture_postback("https://x/?u_id=user-9&c_id=camp-3", &sub, &campaign)
            .await
            .unwrap();
        capture_postback("https://x/?c_id=camp-4", &sub, &campaign)
            .await
            .unwrap();

        assert_eq!(sub.get().await.unwrap().as_deref(), Some("user-9"));
        assert_eq!(campaign.get().await.unwrap().as_deref(), Some("camp-4"));
    }
}
