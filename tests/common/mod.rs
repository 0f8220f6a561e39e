// tests/common/mod.rs
//
// Shared helpers: synthetic PDFs, a counting stub scorer, router + request plumbing.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use mh_risk_predictor::ai_adapter::{RiskScorer, ScorerError};
use mh_risk_predictor::engine::Pipeline;
use mh_risk_predictor::{router, AppState};

pub const BODY_LIMIT: usize = 1024 * 1024;

/// Returns a fixed reply and counts how often it was asked.
pub struct CountingScorer {
    pub reply: Result<u8, ScorerError>,
    pub calls: AtomicUsize,
}

impl CountingScorer {
    pub fn new(reply: Result<u8, ScorerError>) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskScorer for CountingScorer {
    async fn score(&self, _notes: &str) -> Result<u8, ScorerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// Router over a fresh session, scoring counselor notes with `scorer`.
pub fn test_router(scorer: Arc<CountingScorer>) -> Router {
    router(AppState::new(Pipeline::new(scorer)))
}

/// PDF with one page per entry; each page lists its lines top to bottom.
/// An empty line list yields a page without any text.
pub fn make_pdf(pages: &[&[&str]]) -> Vec<u8> {
    use lopdf::dictionary;
    use lopdf::{Document, Object, ObjectId, Stream};

    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut content = String::new();
        if !lines.is_empty() {
            content.push_str("BT /F1 12 Tf 72 720 Td ");
            for (i, line) in lines.iter().enumerate() {
                if i > 0 {
                    content.push_str("0 -24 Td ");
                }
                content.push_str(&format!("({line}) Tj "));
            }
            content.push_str("ET");
        }
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize test pdf");
    buf
}

/// Report with two triggering vitals and counselor notes.
pub fn sample_report() -> Vec<u8> {
    make_pdf(&[
        &["Patient Report", "Blood Pressure: 150/95", "Heart Rate: 120"],
        &["--- COUNSELOR REPORT ---", "Client describes feeling hopeless."],
    ])
}

pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Json) {
    let resp = app.clone().oneshot(req).await.expect("router response");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let v = if bytes.is_empty() {
        Json::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Json::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, v)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET")
}

pub fn post_pdf(bytes: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/document")
        .header("content-type", "application/pdf")
        .body(Body::from(bytes))
        .expect("build POST /api/document")
}

pub fn put_answer(number: usize, answer: &str) -> Request<Body> {
    let payload = serde_json::json!({ "answer": answer });
    Request::builder()
        .method("PUT")
        .uri(format!("/api/answers/{number}"))
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build PUT /api/answers")
}

pub fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("build POST")
}

/// Answer questions 1..=7: the first `yes` with Yes, the rest with No.
pub async fn answer_all(app: &Router, yes: usize) {
    for n in 1..=7 {
        let a = if n <= yes { "Yes" } else { "No" };
        let (status, _) = send(app, put_answer(n, a)).await;
        assert_eq!(status, StatusCode::OK, "answer q{n}");
    }
}
