//! Server-rendered form: upload, scores, questionnaire, final estimate.

use std::collections::HashMap;
use std::fmt::Write as _;

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::analyze::scoring::RiskTier;
use crate::api::{AppState, Workspace};
use crate::questionnaire::{Answer, QUESTIONS};

const STYLE: &str = "\
body{font-family:sans-serif;max-width:760px;margin:2rem auto;padding:0 1rem;color:#222}\
h1{text-align:center;color:#800080}h4.sub{text-align:center;color:#444}\
.question-card{border:1px solid #ddd;border-radius:10px;padding:15px;margin-bottom:10px;background:#f8f9fa}\
.score{color:#00008B;font-weight:bold}\
.banner{padding:15px;border-radius:10px;margin-top:12px}\
.warn{background:#fff3cd;border:2px solid #ffcc00}.err{background:#ffe6e6;border:2px solid red}\
.final{margin-top:20px;padding:15px;background:#e0e0ff;border-radius:12px}\
.final p{font-size:26px;color:#FF4500;font-weight:bold}\
.tier-high{background:#ffe6e6;border:2px solid red}\
.tier-moderate{background:#fff3cd;border:2px solid #ffcc00}\
.tier-low{background:#d4edda;border:2px solid #28a745}";

/// Message shown above the form after a failed interaction.
#[derive(Debug, Clone)]
pub enum Notice {
    Warning(String),
    Error(String),
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/upload", post(upload))
        .route("/submit", post(submit))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    let ws = state.lock().await;
    Html(render_page(&ws, None))
}

async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, MultipartError> {
    let mut file: Option<Vec<u8>> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            file = Some(field.bytes().await?.to_vec());
        }
    }

    // No file picked: nothing to do.
    let Some(bytes) = file.filter(|b| !b.is_empty()) else {
        return Ok(Redirect::to("/").into_response());
    };

    match state.ingest(bytes).await {
        Ok(_) => Ok(Redirect::to("/").into_response()),
        Err(e) => {
            let ws = state.lock().await;
            let notice = Notice::Error(format!("Could not read the PDF: {e}"));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(render_page(&ws, Some(&notice))))
                .into_response())
        }
    }
}

async fn submit(
    State(state): State<AppState>,
    Form(fields): Form<HashMap<String, String>>,
) -> Response {
    let mut ws = state.lock().await;
    if ws.analysis.is_none() {
        return Redirect::to("/").into_response();
    }

    for number in 1..=QUESTIONS.len() {
        let answer = fields
            .get(&format!("q{number}"))
            .and_then(|v| v.parse::<Answer>().ok());
        if let Some(a) = answer {
            // number is always in range here
            let _ = ws.session.answer(number, a);
        }
    }

    match ws.session.submit() {
        Ok(()) => Redirect::to("/#result").into_response(),
        Err(e) => {
            let notice = Notice::Warning(e.to_string());
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(render_page(&ws, Some(&notice))),
            )
                .into_response()
        }
    }
}

/// Whole page for the current workspace state.
pub fn render_page(ws: &Workspace, notice: Option<&Notice>) -> String {
    let mut out = String::with_capacity(8 * 1024);
    out.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    out.push_str("<title>Mental Health Risk Predictor</title>");
    let _ = write!(out, "<style>{STYLE}</style></head><body>");
    out.push_str("<h1>Suicide Risk Predictor</h1>");
    out.push_str(
        "<h4 class=\"sub\">PDF Report + AI Counselor Analysis + Mental Health Questionnaire</h4>",
    );

    if let Some(n) = notice {
        let (class, text) = match n {
            Notice::Warning(t) => ("warn", t),
            Notice::Error(t) => ("err", t),
        };
        let _ = write!(
            out,
            "<div class=\"banner {class}\" role=\"alert\">{}</div>",
            encode_text(text)
        );
    }

    out.push_str("<h4>Upload Combined Medical + Counselor Report (PDF)</h4>");
    out.push_str(
        "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\
         <input type=\"file\" name=\"file\" accept=\"application/pdf,.pdf\"> \
         <button type=\"submit\">Analyze</button></form>",
    );

    if let Some(analysis) = &ws.analysis {
        out.push_str("<h3>Physical Health Evaluation</h3>");
        let _ = write!(
            out,
            "<p><b>Medical Score:</b> <span class=\"score\">{}/4</span></p>",
            analysis.medical_score
        );
        let reasons = analysis.medical.reasons();
        if !reasons.is_empty() {
            let _ = write!(out, "<p>Indicators: {}</p>", encode_text(&reasons.join(", ")));
        }

        out.push_str("<h3>Counselor Risk Analysis</h3>");
        let _ = write!(
            out,
            "<p><b>Counselor Score:</b> <span class=\"score\">{}/3</span>",
            analysis.counselor_score()
        );
        if analysis.counselor.is_degraded() {
            out.push_str(" <small>(default score; the model could not be consulted)</small>");
        }
        out.push_str("</p>");

        render_questionnaire(&mut out, ws);
        render_result(&mut out, ws);
    }

    out.push_str("</body></html>");
    out
}

fn render_questionnaire(out: &mut String, ws: &Workspace) {
    out.push_str("<h3>Mental Health Questionnaire</h3>");
    out.push_str("<form method=\"post\" action=\"/submit\">");
    let answers = ws.session.answers();
    for (i, question) in QUESTIONS.iter().enumerate() {
        let number = i + 1;
        let _ = write!(
            out,
            "<div class=\"question-card\"><strong>Q{number}:</strong> {}<br>",
            encode_text(question)
        );
        for option in [Answer::Yes, Answer::No] {
            let checked = if answers.get(number) == Some(option) {
                " checked"
            } else {
                ""
            };
            let _ = write!(
                out,
                "<label><input type=\"radio\" name=\"q{number}\" value=\"{}\"{checked}> {}</label> ",
                encode_double_quoted_attribute(option.as_str()),
                option
            );
        }
        out.push_str("</div>");
    }
    out.push_str("<button type=\"submit\">Submit</button></form>");
}

fn render_result(out: &mut String, ws: &Workspace) {
    let Some(report) = ws.report() else {
        return;
    };
    let _ = write!(
        out,
        "<div id=\"result\"><p><b>Questionnaire Score:</b> <span class=\"score\">{}/4</span></p>",
        report.questionnaire_score
    );
    let _ = write!(
        out,
        "<div class=\"final\"><h3>Final Suicidal Risk Estimate</h3><p>{}% Risk</p></div>",
        report.final_percent
    );
    let tier_class = match report.tier {
        RiskTier::High => "tier-high",
        RiskTier::Moderate => "tier-moderate",
        RiskTier::Low => "tier-low",
    };
    let _ = write!(
        out,
        "<div class=\"banner {tier_class}\"><strong>{}</strong><br>{}</div></div>",
        encode_text(report.headline),
        encode_text(report.advice)
    );
}
