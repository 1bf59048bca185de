//! The handle a host integration holds.

use std::sync::Arc;

use tracing::{Instrument, info_span, warn};

use crate::capture::{ReferralRecord, capture_postback, capture_referral};
use crate::clock::{Clock, SystemClock};
use crate::config::SdkOptions;
use crate::error::{ConfigError, Result};
use crate::page::PageContext;
use crate::relay::{EventType, RelayEngine, RelayOutcome};
use crate::store::{KeyValueStore, StorageMedia, StoreKeys, StoreOpener};
use crate::transport::{HttpTransport, Transport};

/// Attribution capture and relay for one host integration.
///
/// Built once per page lifetime by [`Analytics::initialize`] (or the
/// [`AnalyticsBuilder`]), which also captures the current page URL. Every
/// operation opens fresh stores on the selected backend.
pub struct Analytics {
    options: SdkOptions,
    keys: StoreKeys,
    page: Arc<dyn PageContext>,
    clock: Arc<dyn Clock>,
    stores: Arc<dyn StoreOpener>,
    relay: RelayEngine,
}

impl Analytics {
    /// Initialize with the HTTP transport and system clock.
    pub async fn initialize(
        options: SdkOptions,
        page: Arc<dyn PageContext>,
        media: StorageMedia,
    ) -> Result<Self> {
        AnalyticsBuilder::new(options, page, media).initialize().await
    }

    pub fn builder(
        options: SdkOptions,
        page: Arc<dyn PageContext>,
        media: StorageMedia,
    ) -> AnalyticsBuilder {
        AnalyticsBuilder::new(options, page, media)
    }

    pub fn options(&self) -> &SdkOptions {
        &self.options
    }

    pub fn keys(&self) -> &StoreKeys {
        &self.keys
    }

    /// Capture the current page URL.
    ///
    /// A qualifying URL replaces the pending referral record; any other URL
    /// leaves it untouched. Postback ids present on the URL are stored too.
    /// Store failures are logged, never returned.
    pub async fn capture_page(&self) -> Option<ReferralRecord> {
        let location = self.page.location();
        let now = self.clock.now_millis();

        async {
            let referrer = self.stores.open(&self.keys.referrer);
            let captured = match capture_referral(&location, referrer.as_ref(), now).await {
                Ok(captured) => captured,
                Err(e) => {
                    warn!(error = %e, "Failed to save referral link");
                    None
                }
            };

            let sub_id = self.stores.open(&self.keys.sub_id);
            let campaign_id = self.stores.open(&self.keys.campaign_id);
            if let Err(e) = capture_postback(&location, sub_id.as_ref(), campaign_id.as_ref()).await
            {
                warn!(error = %e, "Failed to save postback ids");
            }

            captured
        }
        .instrument(self.span("capture"))
        .await
    }

    /// Relay the pending referral record as an event of `event_type`.
    ///
    /// Never fails: the outcome is informational.
    pub async fn record_event(&self, wallet_address: &str, event_type: EventType) -> RelayOutcome {
        self.relay
            .record_event(wallet_address)
            .instrument(info_span!(
                "record_event",
                environment = %self.options.environment,
                storage_type = %self.options.storage_type,
                event_type = %event_type,
            ))
            .await
    }

    /// Like [`record_event`](Self::record_event) for an event type named by the host.
    ///
    /// An unrecognized name is a configuration error.
    pub async fn record_event_named(
        &self,
        wallet_address: &str,
        event_type: &str,
    ) -> std::result::Result<RelayOutcome, ConfigError> {
        let event_type: EventType = event_type.parse()?;
        Ok(self.record_event(wallet_address, event_type).await)
    }

    /// Relay a brand-link click for `url`, or for the current page when `None`.
    pub async fn record_click(&self, url: Option<&str>) -> RelayOutcome {
        let link = url
            .map(str::to_string)
            .unwrap_or_else(|| self.page.location());
        self.relay
            .record_click(&link)
            .instrument(self.span("record_click"))
            .await
    }

    /// Stored postback sub-id.
    pub async fn sub_id(&self) -> Option<String> {
        read_or_log(self.stores.open(&self.keys.sub_id).as_ref()).await
    }

    /// Stored postback campaign id.
    pub async fn campaign_id(&self) -> Option<String> {
        read_or_log(self.stores.open(&self.keys.campaign_id).as_ref()).await
    }

    /// Pending referral record, without consuming it.
    pub async fn pending_referral(&self) -> Option<ReferralRecord> {
        self.relay.peek_referral().await
    }

    /// Epoch millis of the last send attempt, if one is stored.
    pub async fn last_send_timestamp(&self) -> Option<i64> {
        self.relay.peek_send_timestamp().await
    }

    fn span(&self, name: &'static str) -> tracing::Span {
        info_span!(
            "moso",
            operation = name,
            environment = %self.options.environment,
            storage_type = %self.options.storage_type,
        )
    }
}

async fn read_or_log(store: &dyn KeyValueStore) -> Option<String> {
    match store.get().await {
        Ok(value) => value,
        Err(e) => {
            warn!(key = store.key(), error = %e, "Failed to read stored value");
            None
        }
    }
}

/// Builds an [`Analytics`] handle with optional collaborator overrides.
pub struct AnalyticsBuilder {
    options: SdkOptions,
    page: Arc<dyn PageContext>,
    media: StorageMedia,
    transport: Option<Arc<dyn Transport>>,
    clock: Option<Arc<dyn Clock>>,
}

impl AnalyticsBuilder {
    pub fn new(options: SdkOptions, page: Arc<dyn PageContext>, media: StorageMedia) -> Self {
        Self {
            options,
            page,
            media,
            transport: None,
            clock: None,
        }
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the options, open the stores and capture the current page.
    pub async fn initialize(self) -> Result<Analytics> {
        self.options.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                HttpTransport::from_options(&self.options)
                    .map_err(|e| ConfigError::InvalidEndpoint(e.to_string()))?,
            ),
        };
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let keys = StoreKeys::with_prefix(&self.options.key_prefix);
        let storage_type = self.options.storage_type;
        let stores: Arc<dyn StoreOpener> = Arc::new(self.media.select(storage_type));
        let relay = RelayEngine::new(Arc::clone(&stores), &keys, transport, Arc::clone(&clock));

        let analytics = Analytics {
            options: self.options,
            keys,
            page: self.page,
            clock,
            stores,
            relay,
        };

        tracing::debug!(storage_type = %storage_type, "Storage type selected");
        analytics.capture_page().await;
        Ok(analytics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::StorageType;
    use crate::error::Error;
    use crate::page::StaticPage;
    use crate::transport::RecordingTransport;
    use tempfile::tempdir;

    const NOW: i64 = 1_700_000_000_000;

    async fn analytics_at(
        url: &str,
        media: StorageMedia,
        transport: Arc<RecordingTransport>,
    ) -> Analytics {
        Analytics::builder(SdkOptions::new("key"), Arc::new(StaticPage::new(url)), media)
            .transport(transport)
            .clock(Arc::new(ManualClock::new(NOW)))
            .initialize()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn initialize_captures_qualifying_url() {
        let dir = tempdir().unwrap();
        let analytics = analytics_at(
            "https://x/?m=42&source=moso",
            StorageMedia::in_memory(dir.path()),
            Arc::new(RecordingTransport::new()),
        )
        .await;

        let pending = analytics.pending_referral().await.unwrap();
        assert_eq!(pending.marketer_id, 42);
        assert_eq!(pending.timestamp, NOW);
    }

    #[tokio::test]
    async fn handle_does_not_resend_a_record_another_handle_consumed() {
        let dir = tempdir().unwrap();
        let media = StorageMedia::in_memory(dir.path());
        let transport = Arc::new(RecordingTransport::new());
        let clock = ManualClock::new(NOW);
        let open = |url: &str| {
            Analytics::builder(SdkOptions::new("key"), Arc::new(StaticPage::new(url)), media.clone())
                .transport(transport.clone())
                .clock(Arc::new(clock.clone()))
                .initialize()
        };

        let landing = open("https://x/?m=42&source=moso").await.unwrap();
        let other = open("https://x/account").await.unwrap();

        assert!(other.record_event("0xwallet", EventType::Login).await.is_sent());
        clock.advance_millis(10_001);

        assert!(landing.pending_referral().await.is_none());
        assert_eq!(
            landing.record_event("0xwallet", EventType::Login).await,
            RelayOutcome::NoRecord
        );
        assert_eq!(transport.sent_count(), 1);
    }

    #[tokio::test]
    async fn initialize_rejects_missing_api_key() {
        let dir = tempdir().unwrap();
        let result = Analytics::initialize(
            SdkOptions::new(""),
            Arc::new(StaticPage::new("https://x/")),
            StorageMedia::in_memory(dir.path()),
        )
        .await;

        assert!(matches!(result, Err(Error::Config(ConfigError::MissingApiKey))));
    }

    #[tokio::test]
    async fn unrecognized_event_name_is_a_config_error() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let analytics = analytics_at(
            "https://x/?m=42&source=moso",
            StorageMedia::in_memory(dir.path()),
            transport.clone(),
        )
        .await;

        let err = analytics
            .record_event_named("0xwallet", "purchase")
            .await
            .unwrap_err();

        assert!(matches!(err, ConfigError::UnrecognizedEventType(_)));
        assert_eq!(transport.sent_count(), 0);
        assert!(analytics.pending_referral().await.is_some());
    }

    #[tokio::test]
    async fn named_login_event_relays() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let analytics = analytics_at(
            "https://x/?m=42&source=moso",
            StorageMedia::in_memory(dir.path()),
            transport.clone(),
        )
        .await;

        let outcome = analytics
            .record_event_named("0xwallet", "login")
            .await
            .unwrap();

        assert!(outcome.is_sent());
        assert_eq!(analytics.last_send_timestamp().await, Some(NOW));
    }

    #[tokio::test]
    async fn postback_ids_are_readable() {
        let dir = tempdir().unwrap();
        let analytics = analytics_at(
            "https://x/?u_id=sub-1&c_id=camp-2",
            StorageMedia::in_memory(dir.path()),
            Arc::new(RecordingTransport::new()),
        )
        .await;

        assert_eq!(analytics.sub_id().await.as_deref(), Some("sub-1"));
        assert_eq!(analytics.campaign_id().await.as_deref(), Some("camp-2"));
        assert!(analytics.pending_referral().await.is_none());
    }

    #[tokio::test]
    async fn click_defaults_to_current_page() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(RecordingTransport::new());
        let analytics = analytics_at(
            "https://brand.example/?bid=1&mid=2&blid=3",
            StorageMedia::in_memory(dir.path()),
            transport.clone(),
        )
        .await;

        assert!(analytics.record_click(None).await.is_sent());
        assert_eq!(
            transport.sent()[0].link(),
            "https://brand.example/?bid=1&mid=2&blid=3"
        );
    }

    #[tokio::test]
    async fn handles_with_different_prefixes_do_not_share_state() {
        let dir = tempdir().unwrap();
        let media = StorageMedia::in_memory(dir.path());
        let page: Arc<dyn PageContext> = Arc::new(StaticPage::new("https://x/?m=1&source=moso"));

        let first = Analytics::builder(SdkOptions::new("key").with_key_prefix("A"), page, media.clone())
            .transport(Arc::new(RecordingTransport::new()))
            .initialize()
            .await
            .unwrap();
        let second = Analytics::builder(
            SdkOptions::new("key").with_key_prefix("B"),
            Arc::new(StaticPage::new("https://x/")),
            media,
        )
        .transport(Arc::new(RecordingTransport::new()))
        .initialize()
        .await
        .unwrap();

        assert!(first.pending_referral().await.is_some());
        assert!(second.pending_referral().await.is_none());
        assert_eq!(second.keys().referrer, "B_REFERRER");
    }

    #[tokio::test]
    async fn indexed_backend_is_selected_by_options() {
        let dir = tempdir().unwrap();
        let options = SdkOptions::new("key").with_storage_type(StorageType::IndexedDb);
        let media = StorageMedia::in_memory(dir.path());

        Analytics::builder(options, Arc::new(StaticPage::new("https://x/?m=9&source=moso")), media.clone())
            .transport(Arc::new(RecordingTransport::new()))
            .initialize()
            .await
            .unwrap();

        let record_file = dir
            .path()
            .join("MOSO_ANALYTICS")
            .join("tracking")
            .join("MOSO_AFFILIATE_REFERRER");
        assert!(record_file.exists());
        assert!(media.local.get_item("MOSO_AFFILIATE_REFERRER").await.unwrap().is_none());
    }
}
