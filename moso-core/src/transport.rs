//! Relay transport: delivering attribution events to the remote endpoint.
//!
//! The relay engine only needs to know whether the endpoint accepted a
//! payload. It never reads response bodies.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use url::Url;

use crate::config::{ApiKeyPlacement, SdkOptions};
use crate::error::TransportError;

/// Header carrying the API key for [`ApiKeyPlacement::Header`].
pub const API_KEY_HEADER: &str = "x-api-key";

/// Wallet reported for click relays, which happen before any wallet is known.
pub const CLICK_WALLET_PLACEHOLDER: &str = "0xc22d2ee59a228dfa5d2286d41cc6b09f77016201";

/// JSON body of a relay request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RelayPayload {
    /// A recorded event carrying the consumed referral link
    Event {
        link: String,
        wallet_address: String,
        marketer_id: i64,
    },
    /// A brand-link click
    Click {
        link: String,
        wallet_address: String,
        bid: String,
        mid: String,
        blid: String,
    },
}

impl RelayPayload {
    pub fn link(&self) -> &str {
        match self {
            RelayPayload::Event { link, .. } | RelayPayload::Click { link, .. } => link,
        }
    }
}

/// Delivers relay payloads.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload`. `Ok(true)` means the endpoint answered with success.
    async fn post(&self, payload: &RelayPayload) -> Result<bool, TransportError>;
}

/// HTTP transport over reqwest.
///
/// No timeout is set beyond reqwest's defaults.
pub struct HttpTransport {
    endpoint: Url,
    api_key: String,
    placement: ApiKeyPlacement,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        placement: ApiKeyPlacement,
    ) -> Result<Self, TransportError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| TransportError::InvalidUrl(format!("{}: {}", endpoint, e)))?;
        Ok(Self {
            endpoint,
            api_key: api_key.into(),
            placement,
            client: reqwest::Client::new(),
        })
    }

    pub fn from_options(options: &SdkOptions) -> Result<Self, TransportError> {
        Self::new(
            &options.endpoint,
            options.api_key.clone(),
            options.api_key_placement,
        )
    }

    /// The URL requests are sent to, including the key when it travels in the query.
    pub fn request_url(&self) -> Url {
        let mut url = self.endpoint.clone();
        if self.placement == ApiKeyPlacement::Query {
            url.query_pairs_mut().append_pair("api_key", &self.api_key);
        }
        url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, payload: &RelayPayload) -> Result<bool, TransportError> {
        let mut request = self.client.post(self.request_url()).json(payload);
        if self.placement == ApiKeyPlacement::Header {
            request = request.header(API_KEY_HEADER, &self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

/// Scripted outcome for [`RecordingTransport`].
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    Accepted,
    Rejected,
    Failed(String),
}

/// Transport that records every payload instead of sending it.
///
/// Queue outcomes with [`queue`](Self::queue); once the queue is empty every
/// post is accepted.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<RelayPayload>>,
    outcomes: Mutex<VecDeque<ScriptedOutcome>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue(&self, outcome: ScriptedOutcome) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
    }

    /// Payloads posted so far, in order.
    pub fn sent(&self) -> Vec<RelayPayload> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, payload: &RelayPayload) -> Result<bool, TransportError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(payload.clone());
        }
        let outcome = self
            .outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or(ScriptedOutcome::Accepted);

        match outcome {
            ScriptedOutcome::Accepted => Ok(true),
            ScriptedOutcome::Rejected => Ok(false),
            ScriptedOutcome::Failed(message) => Err(TransportError::Request(message)),
        }
    }
}
