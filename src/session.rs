//! Per-session state: current document, answers, submit gate.
//!
//! The state is an explicit value owned by whoever drives the interaction;
//! every operation takes it by reference.

use serde::Serialize;
use tracing::info;

use crate::document::{content_hash, short_id};
use crate::questionnaire::{Answer, Answers, IncompleteInputError, UnknownQuestion};

/// Result of observing an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadOutcome {
    /// New content: answers cleared, submit flag cleared, views must be redrawn.
    Reset,
    /// Same bytes as the current document: nothing changed.
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    file_hash: Option<String>,
    answers: Answers,
    submitted: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_hash(&self) -> Option<&str> {
        self.file_hash.as_deref()
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Hash `bytes` and apply the change-detection rule.
    pub fn observe_upload(&mut self, bytes: &[u8]) -> UploadOutcome {
        self.observe_hash(content_hash(bytes))
    }

    /// A differing hash (including the first one) resets the questionnaire.
    pub fn observe_hash(&mut self, hash: String) -> UploadOutcome {
        if self.file_hash.as_deref() == Some(hash.as_str()) {
            return UploadOutcome::Unchanged;
        }
        info!(doc = short_id(&hash), "new document; questionnaire reset");
        self.reset_questionnaire();
        self.file_hash = Some(hash);
        crate::metrics::record_session_reset();
        UploadOutcome::Reset
    }

    pub fn reset_questionnaire(&mut self) {
        self.answers.clear();
        self.submitted = false;
    }

    /// Record an answer for 1-based question `number`.
    pub fn answer(&mut self, number: usize, answer: Answer) -> Result<(), UnknownQuestion> {
        self.answers.set(number, answer)
    }

    /// Transition to submitted. Incomplete sheets are rejected and leave the flag as is.
    pub fn submit(&mut self) -> Result<(), IncompleteInputError> {
        self.answers.ensure_complete()?;
        self.submitted = true;
        Ok(())
    }

    /// Questionnaire score, available only after a successful submit.
    pub fn questionnaire_score(&self) -> Option<u8> {
        if !self.submitted {
            return None;
        }
        self.answers.score().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::QUESTION_COUNT;

    fn answer_all(s: &mut SessionState, a: Answer) {
        for n in 1..=QUESTION_COUNT {
            s.answer(n, a).unwrap();
        }
    }

    #[test]
    fn first_upload_resets() {
        let mut s = SessionState::new();
        assert_eq!(s.file_hash(), None);
        assert_eq!(s.observe_upload(b"doc-a"), UploadOutcome::Reset);
        assert_eq!(s.file_hash(), Some(content_hash(b"doc-a").as_str()));
    }

    #[test]
    fn new_document_clears_submitted_answers() {
        let mut s = SessionState::new();
        s.observe_upload(b"doc-a");
        answer_all(&mut s, Answer::Yes);
        s.submit().unwrap();
        assert_eq!(s.questionnaire_score(), Some(4));

        assert_eq!(s.observe_upload(b"doc-b"), UploadOutcome::Reset);
        assert!(!s.is_submitted());
        assert_eq!(s.answers().missing().len(), QUESTION_COUNT);
        assert_eq!(s.questionnaire_score(), None);
    }

    #[test]
    fn identical_reupload_is_a_noop() {
        let mut s = SessionState::new();
        s.observe_upload(b"doc-a");
        answer_all(&mut s, Answer::No);
        s.submit().unwrap();
        let before = s.clone();

        assert_eq!(s.observe_upload(b"doc-a"), UploadOutcome::Unchanged);
        assert_eq!(s, before);
        assert!(s.is_submitted());
    }

    #[test]
    fn incomplete_submit_keeps_flag_false() {
        let mut s = SessionState::new();
        s.observe_upload(b"doc-a");
        s.answer(1, Answer::Yes).unwrap();
        let err = s.submit().unwrap_err();
        assert_eq!(err.missing.len(), QUESTION_COUNT - 1);
        assert!(!s.is_submitted());
        assert_eq!(s.questionnaire_score(), None);
    }

    #[test]
    fn score_requires_submit() {
        let mut s = SessionState::new();
        answer_all(&mut s, Answer::Yes);
        assert_eq!(s.questionnaire_score(), None);
        s.submit().unwrap();
        assert_eq!(s.questionnaire_score(), Some(4));
    }

    #[test]
    fn sessions_are_isolated() {
        let mut a = SessionState::new();
        let mut b = SessionState::new();
        a.observe_upload(b"doc");
        answer_all(&mut a, Answer::Yes);
        a.submit().unwrap();
        b.observe_upload(b"doc");
        assert!(!b.is_submitted());
        assert_eq!(b.answers().yes_count(), 0);
    }
}
