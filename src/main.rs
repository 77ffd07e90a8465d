//! Claim checker: Binary Entrypoint
//! Boots the Axum HTTP server, wiring routes, shared state, and middleware.

use claim_checker::{build_state, logging, metrics::Metrics, router, Settings};
use shuttle_axum::ShuttleAxum;
use tracing::warn;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    logging::init_tracing();

    // Recorder first so metric descriptions registered during startup are kept.
    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(error = ?e, "metrics disabled");
            None
        }
    };

    let settings = Settings::from_env();
    let state = build_state(&settings)?;

    let mut app = router(state);
    if let Some(m) = metrics {
        app = app.merge(m.router());
    }

    Ok(app.into())
}
