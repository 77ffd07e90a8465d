// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod canned;
pub mod config;
pub mod logging;
pub mod metrics;
pub mod providers;
pub mod scoring;
pub mod text;
pub mod verdict;
pub mod verifier;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::config::Settings;
pub use crate::verdict::{EvidenceItem, Signals, Stance, VerdictResponse};
pub use crate::verifier::{Verifier, VerifyError};

use std::sync::Arc;

use ::metrics::{describe_gauge, gauge};
use axum::Router;
use tracing::info;

use crate::canned::CannedTable;
use crate::providers::build_collaborators;
use crate::scoring::SourceReliability;

/// Load the static tables and collaborators described by `settings`.
///
/// A missing or unparsable canned-claims file is fatal; everything else degrades.
pub fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let canned = CannedTable::load_from_file(&settings.canned_claims_path)?;
    describe_gauge!("canned_claims_loaded", "Entries in the canned claims table.");
    gauge!("canned_claims_loaded").set(canned.len() as f64);

    let reliability = SourceReliability::load_from_file(&settings.trusted_domains_path);
    let collaborators = build_collaborators(settings);

    let verifier = Verifier::new(Arc::new(canned), Arc::new(reliability), collaborators)
        .with_search_limit(settings.search_limit);
    info!(search_limit = settings.search_limit, "verifier ready");
    Ok(AppState::new(verifier))
}

/// Build the full router from the process environment (no metrics endpoint).
pub fn app() -> anyhow::Result<Router> {
    let settings = Settings::from_env();
    let state = build_state(&settings)?;
    Ok(router(state))
}
