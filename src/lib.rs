// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod analyze;
pub mod api;
pub mod config;
pub mod document;
pub mod engine;
pub mod metrics;
pub mod questionnaire;
pub mod session;
pub mod ui;

pub mod ai_bootstrap;

// ---- Re-exports for stable public API ----
pub use analyze::ai_adapter;
pub use crate::api::{router, AppState};

use tracing::info;

/// Call this from the entrypoint (after tracing init) to perform a one-off
/// smoke test of the configured model. It won't panic on failure; it just logs the result.
pub async fn run_ai_quick_probe(cfg: config::AiConfig) -> anyhow::Result<()> {
    let ai = ai_bootstrap::AiRuntime::from_config(cfg)?;
    ai.quick_probe().await;
    info!("AI quick probe finished");
    Ok(())
}
