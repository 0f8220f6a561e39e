// src/ai_bootstrap.rs
use crate::analyze::ai_adapter::{assess, build_scorer, DynRiskScorer, FallbackPolicy};
use crate::config::ai::AiConfig;
use tracing::{info, warn};

pub struct AiRuntime {
    pub cfg: AiConfig,
    pub scorer: DynRiskScorer,
}

impl AiRuntime {
    pub fn from_config(cfg: AiConfig) -> anyhow::Result<Self> {
        // Safe diagnostics: only provider + enabled + key length
        info!(
            "AI cfg loaded: provider={}, enabled={}, key_len={}",
            cfg.provider,
            cfg.enabled,
            cfg.api_key.len()
        );
        let scorer = build_scorer(&cfg)?;
        Ok(Self { cfg, scorer })
    }

    /// One synthetic scoring call; logs the outcome, never fails.
    pub async fn quick_probe(&self) {
        if !self.cfg.enabled {
            warn!("AI quick_probe skipped: AI is disabled in config");
            return;
        }
        let sample = "Client reports mild stress about exams; sleeping and eating normally.";
        let policy = FallbackPolicy::with_default(self.cfg.fallback_score);
        let out = assess(self.scorer.as_ref(), sample, policy).await;
        info!("AI quick_probe => {:?}", out);
    }
}
