//! Subcommand implementations

pub mod capture;
pub mod click;
pub mod config;
pub mod event;
pub mod show;

use std::sync::Arc;

use anyhow::Result;
use moso_core::{Analytics, FileArea, MemoryArea, SdkOptions, StaticPage, StorageMedia, logging};
use tracing::debug;

use crate::config::{ConfigLoader, GlobalArgs};

/// Page location used when a command has no URL of its own.
pub const BLANK_PAGE: &str = "about:blank";

/// Storage media backed by the moso data directory.
///
/// Session storage is tab-scoped, which for the CLI means one invocation.
pub fn cli_media() -> StorageMedia {
    StorageMedia::new(
        Arc::new(FileArea::new(moso_paths::local_storage_file())),
        Arc::new(MemoryArea::new()),
        moso_paths::indexed_db_dir(),
    )
}

/// Load options, start logging and initialize a handle at `location`.
pub async fn open_analytics(global: &GlobalArgs, location: &str) -> Result<Analytics> {
    let options: SdkOptions = ConfigLoader::load(global)?;
    logging::init(options.environment);
    debug!(
        environment = %options.environment,
        storage_type = %options.storage_type,
        location,
        "Configuration loaded"
    );

    let page = Arc::new(StaticPage::new(location));
    Ok(Analytics::initialize(options, page, cli_media()).await?)
}
