// src/analyze/mod.rs
//! Scoring components: heuristic medical indicators, the counselor-note model
//! score, and the weighted combiner.

pub mod ai_adapter;
pub mod medical;
pub mod scoring;

// Re-export convenient types.
pub use crate::analyze::ai_adapter::{
    assess, DynRiskScorer, FallbackPolicy, RiskAssessment, RiskScorer, ScorerError,
};
pub use crate::analyze::medical::{medical_score, MedicalFindings};
pub use crate::analyze::scoring::{final_score, RiskTier};
