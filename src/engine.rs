//! # Risk Engine
//! Document pipeline (extract → normalize → {split → model score; heuristics})
//! and the pure report builder that combines it with the questionnaire.
//!
//! Only extraction errors stop the pipeline; the model call always yields a
//! score through the fallback policy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::analyze::ai_adapter::{assess, DynRiskScorer, FallbackPolicy, RiskAssessment};
use crate::analyze::medical::{self, MedicalFindings};
use crate::analyze::scoring::{final_score, format_percent, RiskTier};
use crate::document::{
    content_hash, extract_text, normalize, short_id, ExtractionError, MarkerSplitter,
    SectionSplitter,
};
use crate::session::SessionState;

/// Everything derived from one uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentAnalysis {
    pub content_hash: String,
    /// Length of the normalized text, in chars.
    pub text_chars: usize,
    pub counselor_notes_found: bool,
    pub medical: MedicalFindings,
    pub medical_score: u8,
    pub counselor: RiskAssessment,
    pub analyzed_at: DateTime<Utc>,
}

impl DocumentAnalysis {
    pub fn counselor_score(&self) -> u8 {
        self.counselor.score()
    }
}

pub struct Pipeline {
    splitter: Arc<dyn SectionSplitter>,
    scorer: DynRiskScorer,
    policy: FallbackPolicy,
}

impl Pipeline {
    pub fn new(scorer: DynRiskScorer) -> Self {
        Self {
            splitter: Arc::new(MarkerSplitter::default()),
            scorer,
            policy: FallbackPolicy::default(),
        }
    }

    pub fn with_splitter(mut self, splitter: Arc<dyn SectionSplitter>) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn scorer_name(&self) -> &'static str {
        self.scorer.provider_name()
    }

    /// Full pipeline over raw PDF bytes.
    pub async fn analyze(&self, pdf_bytes: Vec<u8>) -> Result<DocumentAnalysis, ExtractionError> {
        let hash = content_hash(&pdf_bytes);
        let raw = tokio::task::spawn_blocking(move || extract_text(&pdf_bytes))
            .await
            .unwrap_or_else(|e| Err(ExtractionError::Aborted(e.to_string())))
            .inspect_err(|_| crate::metrics::record_extraction_error())?;
        Ok(self.analyze_text(hash, &raw).await)
    }

    /// Pipeline minus extraction, for text that is already available.
    pub async fn analyze_text(&self, content_hash: String, raw_text: &str) -> DocumentAnalysis {
        let text = normalize(raw_text);
        let notes = self.splitter.split(&text).unwrap_or_default();
        let findings = medical::evaluate(&text);
        let counselor = assess(self.scorer.as_ref(), notes, self.policy).await;

        info!(
            doc = short_id(&content_hash),
            splitter = self.splitter.name(),
            medical = findings.score(),
            counselor = counselor.score(),
            degraded = counselor.is_degraded(),
            "document analyzed"
        );
        crate::metrics::record_document_analyzed();

        DocumentAnalysis {
            text_chars: text.chars().count(),
            counselor_notes_found: !notes.is_empty(),
            medical_score: findings.score(),
            medical: findings,
            counselor,
            content_hash,
            analyzed_at: Utc::now(),
        }
    }
}

/// Final display values. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskReport {
    pub medical_score: u8,
    pub counselor_score: u8,
    pub questionnaire_score: u8,
    pub final_score: f64,
    /// `final_score` with two decimals.
    pub final_percent: String,
    pub tier: RiskTier,
    pub label: &'static str,
    pub headline: &'static str,
    pub advice: &'static str,
    /// The counselor score is a fallback value.
    pub degraded: bool,
}

/// Combine a submitted session with the analysis of its current document.
///
/// `None` unless the session is submitted, complete, and `analysis` belongs to
/// the session's current document.
pub fn build_report(session: &SessionState, analysis: &DocumentAnalysis) -> Option<RiskReport> {
    if session.file_hash() != Some(analysis.content_hash.as_str()) {
        return None;
    }
    let questionnaire = session.questionnaire_score()?;
    let counselor = analysis.counselor_score();
    let score = final_score(analysis.medical_score, counselor, questionnaire);
    let tier = RiskTier::classify(score);

    Some(RiskReport {
        medical_score: analysis.medical_score,
        counselor_score: counselor,
        questionnaire_score: questionnaire,
        final_score: score,
        final_percent: format_percent(score),
        tier,
        label: tier.label(),
        headline: tier.headline(),
        advice: tier.advice(),
        degraded: analysis.counselor.is_degraded(),
    })
}
