//! moso-core: referral attribution capture and relay
//!
//! This crate provides the pieces a host page integration needs to credit
//! marketers for the visitors they send:
//!
//! - **Key/value stores** - [`KeyValueStore`] over three interchangeable
//!   backends, selected by [`StorageType`]
//! - **Attribution capture** - [`ReferralRecord`]s built from `?m=<id>&source=moso`
//!   page URLs and persisted until relayed
//! - **Relay policy** - [`RelayEngine`] consumes a pending record at most once,
//!   honouring a 7-day expiration window and a 10-second resend suppression window
//! - **Collaborators** - [`PageContext`], [`Transport`] and [`Clock`] seams, with
//!   [`HttpTransport`] and [`SystemClock`] for real use
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use moso_core::{Analytics, EventType, SdkOptions, StaticPage, StorageMedia};
//!
//! async fn example() -> moso_core::Result<()> {
//!     let page = Arc::new(StaticPage::new("https://shop.example/?m=42&source=moso"));
//!     let media = StorageMedia::in_memory("/tmp/moso-indexeddb");
//!
//!     // Captures the referral link on the current page
//!     let analytics = Analytics::initialize(SdkOptions::new("api-key"), page, media).await?;
//!
//!     // Later, once the visitor signs in
//!     let outcome = analytics.record_event("0xwallet", EventType::Login).await;
//!     println!("relay outcome: {:?}", outcome);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                    Analytics                      │
//! │  ┌──────────────┐         ┌────────────────────┐  │
//! │  │   capture    │         │    RelayEngine     │  │
//! │  │ (page load)  │         │ expire / suppress  │──┼──▶ Transport
//! │  └──────┬───────┘         └─────────┬──────────┘  │
//! │         ▼                           ▼             │
//! │  ┌─────────────────────────────────────────────┐  │
//! │  │  StoreOpener (fresh KeyValueStore per call) │  │
//! │  └─────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod capture;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;
pub mod page;
pub mod relay;
pub mod sdk;
pub mod store;
pub mod transport;

// Re-export key types for convenience
pub use capture::ReferralRecord;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ApiKeyPlacement, Environment, SdkOptions, StorageType};
pub use error::{ConfigError, Error, Result, StoreError, TransportError};
pub use page::{PageContext, StaticPage};
pub use relay::{EventType, RelayEngine, RelayOutcome};
pub use sdk::{Analytics, AnalyticsBuilder};
pub use store::{
    FileArea, KeyValueStore, MemoryArea, SelectedMedia, StorageArea, StorageMedia, StoreKeys,
    StoreOpener,
};
pub use transport::{HttpTransport, RecordingTransport, RelayPayload, ScriptedOutcome, Transport};
