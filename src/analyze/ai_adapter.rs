//! AI adapter: counselor-note risk scoring through a hosted language model.
//!
//! The model gets a fixed rubric prompt and must answer with a single digit
//! 0..=3. Every failure is reported as a typed [`ScorerError`]; the caller picks
//! how to degrade via [`FallbackPolicy`] (default: substitute 1). No retries.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::AiConfig;

pub const MAX_COUNSELOR_SCORE: u8 = 3;
pub const DEFAULT_FALLBACK_SCORE: u8 = 1;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const USER_AGENT: &str = "mh-risk-predictor/0.1";

// ------------------------------------------------------------
// Public surface
// ------------------------------------------------------------

/// Why the model did not produce a usable score.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScorerError {
    #[error("AI scoring is disabled")]
    Disabled,
    #[error("missing API credential")]
    MissingCredential,
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned HTTP {0}")]
    Status(u16),
    #[error("malformed provider response: {0}")]
    Malformed(String),
    #[error("empty reply")]
    EmptyReply,
    #[error("reply is not an integer: {0:?}")]
    NotNumeric(String),
}

impl From<reqwest::Error> for ScorerError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScorerError::Timeout
        } else if e.is_decode() {
            ScorerError::Malformed(e.to_string())
        } else {
            ScorerError::Transport(e.to_string())
        }
    }
}

/// Scores counselor notes on the 0..=3 rubric.
#[async_trait]
pub trait RiskScorer: Send + Sync {
    async fn score(&self, counselor_notes: &str) -> Result<u8, ScorerError>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynRiskScorer = Arc<dyn RiskScorer>;

/// Outcome of one scoring attempt after the fallback policy was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RiskAssessment {
    Scored { score: u8 },
    Fallback { score: u8, reason: String },
}

impl RiskAssessment {
    pub fn score(&self) -> u8 {
        match self {
            RiskAssessment::Scored { score } | RiskAssessment::Fallback { score, .. } => *score,
        }
    }

    /// True when the score is a substitute rather than a model answer.
    pub fn is_degraded(&self) -> bool {
        matches!(self, RiskAssessment::Fallback { .. })
    }
}

/// How a failed model call is turned into a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackPolicy {
    pub default_score: u8,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            default_score: DEFAULT_FALLBACK_SCORE,
        }
    }
}

impl FallbackPolicy {
    pub fn with_default(score: u8) -> Self {
        Self {
            default_score: score.min(MAX_COUNSELOR_SCORE),
        }
    }

    pub fn resolve(&self, result: Result<u8, ScorerError>) -> RiskAssessment {
        match result {
            Ok(score) => RiskAssessment::Scored {
                score: score.min(MAX_COUNSELOR_SCORE),
            },
            Err(e) => RiskAssessment::Fallback {
                score: self.default_score,
                reason: e.to_string(),
            },
        }
    }
}

/// Score `notes` and apply `policy`. Never fails; failures are logged and counted.
pub async fn assess(scorer: &dyn RiskScorer, notes: &str, policy: FallbackPolicy) -> RiskAssessment {
    let result = scorer.score(notes).await;
    if let Err(e) = &result {
        warn!(
            provider = scorer.provider_name(),
            error = %e,
            fallback = policy.default_score,
            "counselor scoring failed; using fallback score"
        );
        crate::metrics::record_scorer_fallback(scorer.provider_name());
    }
    policy.resolve(result)
}

/// Fixed rubric prompt with the notes embedded verbatim.
pub fn build_prompt(counselor_notes: &str) -> String {
    format!(
        "\nAnalyze this counselor note and return a risk score (0\u{2013}3):\n\
         - 0 = No signs of suicidal thoughts\n\
         - 1 = Mild distress\n\
         - 2 = Concerning signs\n\
         - 3 = Suicidal ideation\n\
         \n\
         Counselor Notes: '''{counselor_notes}'''\n\
         ONLY return the number.\n"
    )
}

/// Parse a model reply: trimmed, signed integer, clamped into 0..=3.
pub fn parse_risk_reply(reply: &str) -> Result<u8, ScorerError> {
    use std::num::IntErrorKind;

    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err(ScorerError::EmptyReply);
    }
    let value: i64 = match trimmed.parse() {
        Ok(v) => v,
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => return Err(ScorerError::NotNumeric(truncate(trimmed, 40))),
        },
    };
    Ok(value.clamp(0, i64::from(MAX_COUNSELOR_SCORE)) as u8)
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

// ------------------------------------------------------------
// Provider abstraction + concrete providers
// ------------------------------------------------------------

/// Low-level provider: sends a prompt, returns the raw reply text.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    async fn complete(&self, prompt: &str) -> Result<String, ScorerError>;
    fn name(&self) -> &'static str;
}

/// Prompt + parse on top of any provider, bounded by an overall deadline.
pub struct LlmRiskScorer<P: Provider> {
    inner: P,
    deadline: Duration,
}

impl<P: Provider> LlmRiskScorer<P> {
    pub fn new(inner: P, deadline: Duration) -> Self {
        Self { inner, deadline }
    }
}

#[async_trait]
impl<P: Provider> RiskScorer for LlmRiskScorer<P> {
    async fn score(&self, counselor_notes: &str) -> Result<u8, ScorerError> {
        let prompt = build_prompt(counselor_notes);
        let reply = tokio::time::timeout(self.deadline, self.inner.complete(&prompt))
            .await
            .map_err(|_| ScorerError::Timeout)??;
        debug!(provider = self.inner.name(), reply_len = reply.len(), "model replied");
        parse_risk_reply(&reply)
    }

    fn provider_name(&self) -> &'static str {
        self.inner.name()
    }
}

fn http_client(connect_timeout: Duration, timeout: Duration) -> anyhow::Result<reqwest::Client> {
    let http = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .build()?;
    Ok(http)
}

/// Google Gemini `generateContent`.
pub struct GeminiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(http: reqwest::Client, api_key: String, model: Option<&str>) -> Self {
        Self {
            http,
            api_key,
            model: model.unwrap_or(DEFAULT_GEMINI_MODEL).to_string(),
        }
    }
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}
#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}
#[derive(Serialize)]
struct GeminiReq<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResp {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}
#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiRespContent>,
}
#[derive(Debug, Deserialize)]
struct GeminiRespContent {
    #[serde(default)]
    parts: Vec<GeminiRespPart>,
}
#[derive(Debug, Deserialize)]
struct GeminiRespPart {
    #[serde(default)]
    text: String,
}

/// Text of the first candidate (all parts concatenated).
fn gemini_reply_text(body: &str) -> Result<String, ScorerError> {
    let resp: GeminiResp =
        serde_json::from_str(body).map_err(|e| ScorerError::Malformed(e.to_string()))?;
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ScorerError::EmptyReply);
    }
    Ok(text)
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ScorerError> {
        if self.api_key.is_empty() {
            return Err(ScorerError::MissingCredential);
        }
        let req = GeminiReq {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };
        let resp = self
            .http
            .post(format!("{GEMINI_BASE_URL}/{}:generateContent", self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ScorerError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await?;
        gemini_reply_text(&body)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

/// OpenAI provider (Chat Completions API).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(http: reqwest::Client, api_key: String, model: Option<&str>) -> Self {
        Self {
            http,
            api_key,
            model: model.unwrap_or(DEFAULT_OPENAI_MODEL).to_string(),
        }
    }
}

#[derive(Serialize)]
struct OpenAiMsg<'a> {
    role: &'a str,
    content: &'a str,
}
#[derive(Serialize)]
struct OpenAiReq<'a> {
    model: &'a str,
    messages: Vec<OpenAiMsg<'a>>,
    temperature: f32,
    max_tokens: u32,
}
#[derive(Debug, Deserialize)]
struct OpenAiResp {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}
#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMsg,
}
#[derive(Debug, Deserialize)]
struct OpenAiChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

fn openai_reply_text(body: &str) -> Result<String, ScorerError> {
    let resp: OpenAiResp =
        serde_json::from_str(body).map_err(|e| ScorerError::Malformed(e.to_string()))?;
    let text = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Err(ScorerError::EmptyReply);
    }
    Ok(text)
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn complete(&self, prompt: &str) -> Result<String, ScorerError> {
        if self.api_key.is_empty() {
            return Err(ScorerError::MissingCredential);
        }
        let req = OpenAiReq {
            model: &self.model,
            messages: vec![OpenAiMsg {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
            max_tokens: 4,
        };
        let resp = self
            .http
            .post(OPENAI_URL)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(ScorerError::Status(resp.status().as_u16()));
        }
        let body = resp.text().await?;
        openai_reply_text(&body)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Deterministic provider for tests/local runs.
#[derive(Debug, Clone)]
pub struct MockProvider {
    pub reply: Result<String, ScorerError>,
}

impl MockProvider {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Ok(reply.into()),
        }
    }

    pub fn failing(err: ScorerError) -> Self {
        Self { reply: Err(err) }
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, _prompt: &str) -> Result<String, ScorerError> {
        self.reply.clone()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// Always fails with [`ScorerError::Disabled`]; used when AI is off.
pub struct DisabledScorer;

#[async_trait]
impl RiskScorer for DisabledScorer {
    async fn score(&self, _counselor_notes: &str) -> Result<u8, ScorerError> {
        Err(ScorerError::Disabled)
    }

    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

// ------------------------------------------------------------
// Factory
// ------------------------------------------------------------

/// Build a scorer according to config and environment variables.
///
/// * If `AI_TEST_MODE=mock`, returns a mock replying `$AI_MOCK_REPLY` (default "1").
/// * Else if `config.enabled == false`, returns [`DisabledScorer`].
/// * Else builds the configured HTTP provider.
pub fn build_scorer(config: &AiConfig) -> anyhow::Result<DynRiskScorer> {
    let connect_timeout = Duration::from_secs(config.connect_timeout_secs);
    let timeout = Duration::from_secs(config.timeout_secs);
    // Outer guard on top of the HTTP timeouts.
    let deadline = timeout + Duration::from_secs(1);

    if std::env::var("AI_TEST_MODE")
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        let reply = std::env::var("AI_MOCK_REPLY").unwrap_or_else(|_| "1".to_string());
        return Ok(Arc::new(LlmRiskScorer::new(
            MockProvider::replying(reply),
            deadline,
        )));
    }

    if !config.enabled {
        return Ok(Arc::new(DisabledScorer));
    }

    let http = http_client(connect_timeout, timeout)?;
    let model = config.model.as_deref();
    match config.provider.as_str() {
        "gemini" => Ok(Arc::new(LlmRiskScorer::new(
            GeminiProvider::new(http, config.api_key.clone(), model),
            deadline,
        ))),
        "openai" => Ok(Arc::new(LlmRiskScorer::new(
            OpenAiProvider::new(http, config.api_key.clone(), model),
            deadline,
        ))),
        other => anyhow::bail!("Unsupported AI provider: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_scorer(reply: &str) -> LlmRiskScorer<MockProvider> {
        LlmRiskScorer::new(MockProvider::replying(reply), Duration::from_secs(5))
    }

    struct SlowProvider;

    #[async_trait]
    impl Provider for SlowProvider {
        async fn complete(&self, _prompt: &str) -> Result<String, ScorerError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok("3".to_string())
        }
        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[test]
    fn prompt_embeds_notes_and_rubric() {
        let p = build_prompt("Client feels hopeless.");
        assert!(p.contains("Counselor Notes: '''Client feels hopeless.'''"));
        assert!(p.contains("3 = Suicidal ideation"));
        assert!(p.contains("ONLY return the number."));
    }

    #[test]
    fn prompt_with_empty_notes() {
        assert!(build_prompt("").contains("Counselor Notes: ''''''"));
    }

    #[test]
    fn parse_clamps_into_range() {
        let cases = [("0", 0), ("1", 1), ("2", 2), ("3", 3), ("5", 3), ("-1", 0)];
        for (reply, want) in cases {
            assert_eq!(parse_risk_reply(reply), Ok(want), "reply {reply:?}");
        }
    }

    #[test]
    fn parse_trims_and_saturates_overflow() {
        assert_eq!(parse_risk_reply("  2\n"), Ok(2));
        assert_eq!(parse_risk_reply("+1"), Ok(1));
        assert_eq!(parse_risk_reply("123456789012345678901234567890"), Ok(3));
        assert_eq!(parse_risk_reply("-123456789012345678901234567890"), Ok(0));
    }

    #[test]
    fn parse_rejects_non_integers() {
        assert_eq!(parse_risk_reply(""), Err(ScorerError::EmptyReply));
        assert!(matches!(parse_risk_reply("2.5"), Err(ScorerError::NotNumeric(_))));
        assert!(matches!(
            parse_risk_reply("Score: 2"),
            Err(ScorerError::NotNumeric(_))
        ));
    }

    #[tokio::test]
    async fn simulated_replies_with_default_policy() {
        let policy = FallbackPolicy::default();
        let cases = [
            ("0", 0),
            ("1", 1),
            ("2", 2),
            ("3", 3),
            ("5", 3),
            ("-1", 0),
            ("high", 1),
            ("", 1),
        ];
        for (reply, want) in cases {
            let got = assess(&mock_scorer(reply), "notes", policy).await;
            assert_eq!(got.score(), want, "reply {reply:?}");
        }
    }

    #[tokio::test]
    async fn provider_failures_fall_back_to_one() {
        let policy = FallbackPolicy::default();
        for err in [
            ScorerError::Timeout,
            ScorerError::Transport("connection refused".into()),
            ScorerError::Status(503),
            ScorerError::Malformed("eof".into()),
        ] {
            let scorer = LlmRiskScorer::new(MockProvider::failing(err), Duration::from_secs(5));
            let got = assess(&scorer, "notes", policy).await;
            assert_eq!(got.score(), 1);
            assert!(got.is_degraded());
        }
    }

    #[tokio::test]
    async fn deadline_bounds_slow_providers() {
        let scorer = LlmRiskScorer::new(SlowProvider, Duration::from_millis(50));
        assert_eq!(scorer.score("notes").await, Err(ScorerError::Timeout));
        let got = assess(&scorer, "notes", FallbackPolicy::default()).await;
        assert_eq!(
            got,
            RiskAssessment::Fallback {
                score: 1,
                reason: "request timed out".to_string()
            }
        );
    }

    #[tokio::test]
    async fn disabled_scorer_degrades() {
        let got = assess(&DisabledScorer, "", FallbackPolicy::default()).await;
        assert!(got.is_degraded());
        assert_eq!(got.score(), 1);
    }

    #[test]
    fn alternative_policy_and_clamping() {
        let strict = FallbackPolicy::with_default(3);
        assert_eq!(strict.resolve(Err(ScorerError::EmptyReply)).score(), 3);
        assert_eq!(FallbackPolicy::with_default(7).default_score, 3);
        assert_eq!(
            strict.resolve(Ok(2)),
            RiskAssessment::Scored { score: 2 }
        );
    }

    #[test]
    fn gemini_reply_parsing() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"2"},{"text":"\n"}],"role":"model"}}]}"#;
        assert_eq!(gemini_reply_text(body).unwrap(), "2\n");
        assert_eq!(
            gemini_reply_text(r#"{"candidates":[]}"#),
            Err(ScorerError::EmptyReply)
        );
        assert!(matches!(
            gemini_reply_text("<html>"),
            Err(ScorerError::Malformed(_))
        ));
    }

    #[test]
    fn openai_reply_parsing() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" 1 "}}]}"#;
        assert_eq!(openai_reply_text(body).unwrap(), " 1 ");
        assert_eq!(
            openai_reply_text(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(ScorerError::EmptyReply)
        );
    }

    #[tokio::test]
    async fn missing_credential_is_a_failure_not_a_panic() {
        let http = reqwest::Client::new();
        let p = GeminiProvider::new(http, String::new(), None);
        assert_eq!(
            p.complete("x").await,
            Err(ScorerError::MissingCredential)
        );
    }

    #[serial_test::serial]
    #[test]
    fn factory_respects_mode_and_enabled_flag() {
        std::env::remove_var("AI_TEST_MODE");
        let off = build_scorer(&AiConfig::default()).unwrap();
        assert_eq!(off.provider_name(), "disabled");

        std::env::set_var("AI_TEST_MODE", "mock");
        let mock = build_scorer(&AiConfig::default()).unwrap();
        std::env::remove_var("AI_TEST_MODE");
        assert_eq!(mock.provider_name(), "mock");

        let cfg = AiConfig {
            enabled: true,
            provider: "gemini".into(),
            api_key: "k".into(),
            ..AiConfig::default()
        };
        assert_eq!(build_scorer(&cfg).unwrap().provider_name(), "gemini");
    }
}
