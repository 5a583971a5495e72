//! Extraction resource initialization.
//!
//! This module contains the `init_extraction_resources` function which opens
//! the dedup store and builds the collaborators shared by every scanner.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::config::Config;
use crate::error_handling::ExtractionStats;
use crate::fetch::HttpFetcher;
use crate::initialization::init_client;
use crate::scan::ExtractionContext;
use crate::storage::SqliteDedupStore;
use crate::writer::ScriptWriter;

/// Resources owned by one extraction run.
pub struct ExtractionResources {
    /// Kept separately from the context so the pool can be closed at the end
    pub store: Arc<SqliteDedupStore>,
    pub ctx: ExtractionContext,
}

/// Initialize all resources needed for an extraction run.
///
/// 1. Open (or create) the dedup store and ensure its schema
/// 2. Build the HTTP client and the external script fetcher
/// 3. Build the script writer with the default syntax and MIME oracles
///
/// # Errors
///
/// Returns an error if the store cannot be opened or the HTTP client cannot
/// be built.
pub async fn init_extraction_resources(config: &Config) -> Result<ExtractionResources> {
    let store = SqliteDedupStore::open(&config.store_path)
        .await
        .with_context(|| {
            format!(
                "Failed to open dedup store {}",
                config.store_path.display()
            )
        })?;
    info!("Using dedup store {}", config.store_path.display());
    let store = Arc::new(store);

    let client = init_client(config).context("Failed to initialize HTTP client")?;
    let fetcher = HttpFetcher::new(client, config.max_script_bytes);
    let writer = ScriptWriter::new(&config.prefix);
    info!("Writing scripts under {}", config.prefix.display());

    let ctx = ExtractionContext::new(
        store.clone(),
        Arc::new(fetcher),
        Arc::new(writer),
        Arc::new(ExtractionStats::new()),
    );
    Ok(ExtractionResources { store, ctx })
}
