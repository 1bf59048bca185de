//! Relay policy engine.
//!
//! One `record_event` call walks these steps and stops at the first that
//! fails:
//!
//! 1. the event type must be recognized (checked by the caller, see [`EventType`])
//! 2. the pending referral record is read and, if well formed, deleted
//! 3. the record must be within the expiration window
//! 4. no send may have been attempted within the suppression window
//! 5. the send timestamp is written
//! 6. the payload goes to the transport; failures are logged only
//!
//! Steps 2 to 5 run under a per-engine lock so two calls on the same engine
//! cannot both consume one record. Each call opens its own stores, so a value
//! remembered by an earlier store never resurrects a record another page
//! already consumed.

mod click;
mod policy;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

pub use click::{CLICK_PARAMS, ClickRejection, click_payload};
pub use policy::{
    EXPIRATION_WINDOW_MILLIS, RESEND_SUPPRESSION_MILLIS, is_expired, is_suppressed,
    parse_send_timestamp,
};

use crate::capture::ReferralRecord;
use crate::clock::Clock;
use crate::error::ConfigError;
use crate::store::{KeyValueStore, StoreKeys, StoreOpener};
use crate::transport::{RelayPayload, Transport};

/// Event types a host may record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Login,
}

impl EventType {
    /// Every recognized event type.
    pub const ALLOWED: &'static [EventType] = &[EventType::Login];

    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Login => "login",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALLOWED
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ConfigError::UnrecognizedEventType(s.to_string()))
    }
}

/// What a relay attempt ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayOutcome {
    /// Nothing pending, or the pending value was malformed
    NoRecord,
    /// The pending record was consumed but is past the expiration window
    Expired { age_millis: i64 },
    /// A send was attempted too recently
    Suppressed { since_last_send_millis: i64 },
    /// A click link lacked a required parameter or was not a URL
    Incomplete(ClickRejection),
    /// The store could not complete a step that guards single consumption
    StoreFailed(String),
    /// The endpoint accepted the payload
    Sent,
    /// The endpoint answered with a non-success status
    Rejected,
    /// The request never completed
    TransportFailed(String),
}

impl RelayOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, RelayOutcome::Sent)
    }

    /// Whether the transport was called at all.
    pub fn reached_transport(&self) -> bool {
        matches!(
            self,
            RelayOutcome::Sent | RelayOutcome::Rejected | RelayOutcome::TransportFailed(_)
        )
    }
}

/// Consumes pending referral records and relays them.
pub struct RelayEngine {
    stores: Arc<dyn StoreOpener>,
    referrer_key: String,
    send_timestamp_key: String,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    gate: Mutex<()>,
}

/// The two stores one relay attempt works on.
struct RelayStores {
    referrer: Box<dyn KeyValueStore>,
    send_timestamp: Box<dyn KeyValueStore>,
}

impl RelayEngine {
    pub fn new(
        stores: Arc<dyn StoreOpener>,
        keys: &StoreKeys,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            stores,
            referrer_key: keys.referrer.clone(),
            send_timestamp_key: keys.send_timestamp.clone(),
            transport,
            clock,
            gate: Mutex::new(()),
        }
    }

    fn open_stores(&self) -> RelayStores {
        RelayStores {
            referrer: self.stores.open(&self.referrer_key),
            send_timestamp: self.stores.open(&self.send_timestamp_key),
        }
    }

    /// Relay the pending referral record for `wallet_address`, if policy allows.
    pub async fn record_event(&self, wallet_address: &str) -> RelayOutcome {
        let payload = {
            let _guard = self.gate.lock().await;
            let stores = self.open_stores();
            match self.admit(&stores, wallet_address).await {
                Ok(payload) => payload,
                Err(outcome) => return outcome,
            }
        };

        self.deliver(&payload).await
    }

    /// Relay a brand-link click. Not subject to either time window.
    pub async fn record_click(&self, link: &str) -> RelayOutcome {
        match click_payload(link) {
            Ok(payload) => self.deliver(&payload).await,
            Err(rejection) => {
                debug!(?rejection, "Click link is incomplete");
                RelayOutcome::Incomplete(rejection)
            }
        }
    }

    /// Pending record, without consuming it.
    pub async fn peek_referral(&self) -> Option<ReferralRecord> {
        let raw = self.stores.open(&self.referrer_key).get().await.ok()??;
        ReferralRecord::decode(&raw).ok()
    }

    /// Last stored send timestamp, without purging malformed values.
    pub async fn peek_send_timestamp(&self) -> Option<i64> {
        let raw = self.stores.open(&self.send_timestamp_key).get().await.ok()??;
        parse_send_timestamp(&raw)
    }

    /// Steps 2 to 5. `Err` carries the outcome of the step that stopped the relay.
    async fn admit(
        &self,
        stores: &RelayStores,
        wallet_address: &str,
    ) -> Result<RelayPayload, RelayOutcome> {
        let record = take_referral(stores.referrer.as_ref()).await?;
        let now = self.clock.now_millis();

        let age_millis = record.age_millis(now);
        if is_expired(age_millis) {
            debug!(age_millis, "Url to record has expired");
            return Err(RelayOutcome::Expired { age_millis });
        }

        if let Some(last_send) = last_send(stores.send_timestamp.as_ref()).await {
            let since_last_send_millis = now - last_send;
            if is_suppressed(since_last_send_millis) {
                debug!(since_last_send_millis, "Skipping, a send was attempted moments ago");
                return Err(RelayOutcome::Suppressed {
                    since_last_send_millis,
                });
            }
        }

        if let Err(e) = stores.send_timestamp.set(&now.to_string()).await {
            warn!(error = %e, "Failed to save send timestamp");
        }

        Ok(RelayPayload::Event {
            link: record.link,
            wallet_address: wallet_address.to_string(),
            marketer_id: record.marketer_id,
        })
    }

    async fn deliver(&self, payload: &RelayPayload) -> RelayOutcome {
        match self.transport.post(payload).await {
            Ok(true) => {
                debug!("Request sent");
                RelayOutcome::Sent
            }
            Ok(false) => {
                debug!("Unable to send request");
                RelayOutcome::Rejected
            }
            Err(e) => {
                error!(error = %e, "Relay request failed");
                RelayOutcome::TransportFailed(e.to_string())
            }
        }
    }
}

/// Read the pending record and delete it once it decodes.
///
/// A malformed value is left in place.
async fn take_referral(referrer: &dyn KeyValueStore) -> Result<ReferralRecord, RelayOutcome> {
    let raw = match referrer.get().await {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            debug!("No matching url to record");
            return Err(RelayOutcome::NoRecord);
        }
        Err(e) => {
            warn!(error = %e, "Failed to read referral link");
            return Err(RelayOutcome::NoRecord);
        }
    };

    let record = match ReferralRecord::decode(&raw) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "Stored referral link is not valid");
            return Err(RelayOutcome::NoRecord);
        }
    };

    if let Err(e) = referrer.remove().await {
        warn!(error = %e, "Failed to consume referral link");
        return Err(RelayOutcome::StoreFailed(e.to_string()));
    }

    debug!(marketer_id = record.marketer_id, "Got link to record");
    Ok(record)
}

/// The previous send timestamp. Malformed values are purged and read as absent.
async fn last_send(send_timestamp: &dyn KeyValueStore) -> Option<i64> {
    let raw = match send_timestamp.get().await {
        Ok(raw) => raw?,
        Err(e) => {
            warn!(error = %e, "Failed to read send timestamp");
            return None;
        }
    };

    match parse_send_timestamp(&raw) {
        Some(timestamp) => Some(timestamp),
        None => {
            warn!(value = %raw, "Discarding malformed send timestamp");
            if let Err(e) = send_timestamp.remove().await {
                warn!(error = %e, "Failed to discard send timestamp");
            }
            None
        }
    }
}
