//! Mental Health Risk Predictor: binary entrypoint.
//! Boots the Axum HTTP server, wiring routes, shared state, and metrics.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mh_risk_predictor::{config::AiConfig, metrics::Metrics, router, run_ai_quick_probe, AppState};

const DEV_LOG_FILTER: &str = "mh_risk_predictor=debug,warn";

fn is_dev_env() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    let env = std::env::var("SHUTTLE_ENV").unwrap_or_default();
    ["local", "development", "dev"]
        .iter()
        .any(|name| env.eq_ignore_ascii_case(name))
}

/// Compact local logs. Needs `RISK_DEV_LOG=1` and a dev build or dev
/// `SHUTTLE_ENV`; `RUST_LOG` overrides [`DEV_LOG_FILTER`].
fn init_dev_logging() {
    let requested = std::env::var("RISK_DEV_LOG").is_ok_and(|v| v == "1");
    if !requested || !is_dev_env() {
        return;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEV_LOG_FILTER));

    // The runtime may already have installed a subscriber.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // Provides GOOGLE_API_KEY / OPENAI_API_KEY / AI_CONFIG_PATH.
    let _ = dotenvy::dotenv();

    init_dev_logging();

    let cfg = AiConfig::load_default().context("loading AI config")?;

    if std::env::var("AI_QUICK_PROBE").is_ok_and(|v| v == "1") {
        if let Err(e) = run_ai_quick_probe(cfg.clone()).await {
            tracing::warn!(error = ?e, "AI quick probe didn't run");
        }
    }

    let state = AppState::from_config(&cfg).context("building risk pipeline")?;
    let metrics = Metrics::init()?;
    let router = router(state).merge(metrics.router());

    Ok(router.into())
}
