//! HTTP surface: shared state, JSON API and router assembly.
//!
//! One session record lives in [`AppState`]; interactions are serialized by an
//! async mutex that is held across the (bounded) model call.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::analyze::ai_adapter::{build_scorer, FallbackPolicy};
use crate::config::AiConfig;
use crate::document::ExtractionError;
use crate::engine::{build_report, DocumentAnalysis, Pipeline, RiskReport};
use crate::questionnaire::{
    Answer, IncompleteInputError, InvalidAnswer, UnknownQuestion, QUESTIONS,
};
use crate::session::{SessionState, UploadOutcome};

/// Upload cap for PDF reports.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Session plus the analysis of its current document.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub session: SessionState,
    pub analysis: Option<DocumentAnalysis>,
}

impl Workspace {
    pub fn report(&self) -> Option<RiskReport> {
        self.analysis
            .as_ref()
            .and_then(|a| build_report(&self.session, a))
    }
}

#[derive(Clone)]
pub struct AppState {
    workspace: Arc<Mutex<Workspace>>,
    pipeline: Arc<Pipeline>,
}

/// Result of handing a document to the workspace.
#[derive(Debug, Clone)]
pub struct Ingested {
    pub outcome: UploadOutcome,
    pub analysis: DocumentAnalysis,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            workspace: Arc::new(Mutex::new(Workspace::default())),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Build the scorer from config; the configured fallback score becomes the policy.
    pub fn from_config(cfg: &AiConfig) -> anyhow::Result<Self> {
        let scorer = build_scorer(cfg)?;
        let pipeline =
            Pipeline::new(scorer).with_policy(FallbackPolicy::with_default(cfg.fallback_score));
        Ok(Self::new(pipeline))
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Workspace> {
        self.workspace.lock().await
    }

    /// Copy of the current workspace.
    pub async fn snapshot(&self) -> Workspace {
        self.lock().await.clone()
    }

    /// Apply the change-detection rule, then analyze unless the same bytes
    /// were already analyzed.
    pub async fn ingest(&self, bytes: Vec<u8>) -> Result<Ingested, ExtractionError> {
        let mut ws = self.lock().await;
        let outcome = ws.session.observe_upload(&bytes);
        if outcome == UploadOutcome::Unchanged {
            if let Some(analysis) = &ws.analysis {
                return Ok(Ingested {
                    outcome,
                    analysis: analysis.clone(),
                });
            }
        }

        ws.analysis = None;
        let analysis = self.pipeline.analyze(bytes).await.inspect_err(|e| {
            warn!(error = %e, "document extraction failed");
        })?;
        ws.analysis = Some(analysis.clone());
        Ok(Ingested { outcome, analysis })
    }
}

/// Build the router the binary serves (without `/metrics`).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/questions", get(list_questions))
        .route("/api/session", get(get_session))
        .route("/api/document", post(upload_document))
        .route("/api/answers/{number}", put(put_answer))
        .route("/api/submit", post(submit))
        .route("/api/report", get(get_report))
        .merge(crate::ui::routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

// ------------------------------------------------------------
// Errors
// ------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request body is empty")]
    EmptyBody,
    #[error("upload a document first")]
    NoDocument,
    #[error("questionnaire has not been submitted")]
    NotSubmitted,
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error(transparent)]
    Incomplete(#[from] IncompleteInputError),
    #[error(transparent)]
    UnknownQuestion(#[from] UnknownQuestion),
    #[error(transparent)]
    InvalidAnswer(#[from] InvalidAnswer),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyBody => StatusCode::BAD_REQUEST,
            ApiError::NoDocument | ApiError::NotSubmitted => StatusCode::CONFLICT,
            ApiError::UnknownQuestion(_) => StatusCode::NOT_FOUND,
            ApiError::Extraction(_) | ApiError::Incomplete(_) | ApiError::InvalidAnswer(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = json!({ "error": self.to_string() });
        if let ApiError::Incomplete(e) = &self {
            body["missing"] = json!(e.missing);
        }
        (self.status(), Json(body)).into_response()
    }
}

// ------------------------------------------------------------
// Handlers
// ------------------------------------------------------------

#[derive(Serialize)]
struct QuestionOut {
    number: usize,
    text: &'static str,
}

async fn list_questions() -> Json<Vec<QuestionOut>> {
    let out = QUESTIONS
        .iter()
        .enumerate()
        .map(|(i, text)| QuestionOut {
            number: i + 1,
            text: *text,
        })
        .collect();
    Json(out)
}

#[derive(Serialize)]
struct SessionOut {
    file_hash: Option<String>,
    answers: Vec<Option<Answer>>,
    missing: Vec<usize>,
    submitted: bool,
    analysis: Option<DocumentAnalysis>,
}

impl From<&Workspace> for SessionOut {
    fn from(ws: &Workspace) -> Self {
        Self {
            file_hash: ws.session.file_hash().map(str::to_string),
            answers: ws.session.answers().as_slice().to_vec(),
            missing: ws.session.answers().missing(),
            submitted: ws.session.is_submitted(),
            analysis: ws.analysis.clone(),
        }
    }
}

async fn get_session(State(state): State<AppState>) -> Json<SessionOut> {
    let ws = state.lock().await;
    Json(SessionOut::from(&*ws))
}

#[derive(Serialize)]
struct DocumentOut {
    outcome: UploadOutcome,
    reset: bool,
    analysis: DocumentAnalysis,
}

async fn upload_document(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DocumentOut>, ApiError> {
    if body.is_empty() {
        return Err(ApiError::EmptyBody);
    }
    let ingested = state.ingest(body.to_vec()).await?;
    Ok(Json(DocumentOut {
        outcome: ingested.outcome,
        reset: ingested.outcome == UploadOutcome::Reset,
        analysis: ingested.analysis,
    }))
}

#[derive(Deserialize)]
struct AnswerReq {
    answer: String,
}

async fn put_answer(
    State(state): State<AppState>,
    Path(number): Path<usize>,
    Json(req): Json<AnswerReq>,
) -> Result<Json<SessionOut>, ApiError> {
    let answer: Answer = req.answer.parse()?;
    let mut ws = state.lock().await;
    if ws.analysis.is_none() {
        return Err(ApiError::NoDocument);
    }
    ws.session.answer(number, answer)?;
    Ok(Json(SessionOut::from(&*ws)))
}

async fn submit(State(state): State<AppState>) -> Result<Json<RiskReport>, ApiError> {
    let mut ws = state.lock().await;
    if ws.analysis.is_none() {
        return Err(ApiError::NoDocument);
    }
    ws.session.submit()?;
    ws.report().map(Json).ok_or(ApiError::NotSubmitted)
}

async fn get_report(State(state): State<AppState>) -> Result<Json<RiskReport>, ApiError> {
    let ws = state.lock().await;
    if ws.analysis.is_none() {
        return Err(ApiError::NoDocument);
    }
    ws.report().map(Json).ok_or(ApiError::NotSubmitted)
}
