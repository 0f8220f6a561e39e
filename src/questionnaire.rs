//! Mental health questionnaire: fixed questions, per-session answers, score.
//!
//! Seven yes/no questions feed a score on a 4-point scale. The combiner treats
//! this term like the medical score, so the Yes count saturates at 4.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const QUESTIONS: [&str; 7] = [
    "Do you often feel hopeless or down?",
    "Do you have trouble sleeping or experience nightmares?",
    "Have you had thoughts of self-harm or suicide recently?",
    "Do you feel isolated or withdrawn from others?",
    "Do you experience sudden mood swings or aggression?",
    "Are you currently taking any medications for mental health?",
    "Do you feel anxious or panicked regularly?",
];

pub const QUESTION_COUNT: usize = QUESTIONS.len();
pub const MAX_QUESTIONNAIRE_SCORE: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn as_str(self) -> &'static str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("answer must be \"Yes\" or \"No\", got {0:?}")]
pub struct InvalidAnswer(pub String);

impl FromStr for Answer {
    type Err = InvalidAnswer;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" => Ok(Answer::Yes),
            "no" => Ok(Answer::No),
            _ => Err(InvalidAnswer(s.to_string())),
        }
    }
}

/// 1-based question number outside `1..=QUESTION_COUNT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("question {0} does not exist (expected 1..={max})", max = QUESTION_COUNT)]
pub struct UnknownQuestion(pub usize);

/// Submit attempted while some questions are unanswered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please answer all questions before submitting (missing: {})", join_numbers(.missing))]
pub struct IncompleteInputError {
    /// 1-based numbers of the unanswered questions.
    pub missing: Vec<usize>,
}

fn join_numbers(nums: &[usize]) -> String {
    nums.iter()
        .map(|n| format!("Q{n}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Per-session answer sheet. All unanswered on creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Answers {
    slots: [Option<Answer>; QUESTION_COUNT],
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an answer for 1-based question `number`.
    pub fn set(&mut self, number: usize, answer: Answer) -> Result<(), UnknownQuestion> {
        let slot = number
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(UnknownQuestion(number))?;
        *slot = Some(answer);
        Ok(())
    }

    pub fn get(&self, number: usize) -> Option<Answer> {
        number
            .checked_sub(1)
            .and_then(|i| self.slots.get(i).copied().flatten())
    }

    pub fn as_slice(&self) -> &[Option<Answer>] {
        &self.slots
    }

    pub fn clear(&mut self) {
        self.slots = [None; QUESTION_COUNT];
    }

    /// 1-based numbers of unanswered questions, ascending.
    pub fn missing(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, a)| a.is_none())
            .map(|(i, _)| i + 1)
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn yes_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|a| **a == Some(Answer::Yes))
            .count()
    }

    /// Validate completeness.
    pub fn ensure_complete(&self) -> Result<(), IncompleteInputError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(IncompleteInputError { missing })
        }
    }

    /// Questionnaire score; only defined for a complete sheet.
    pub fn score(&self) -> Result<u8, IncompleteInputError> {
        self.ensure_complete()?;
        Ok(saturate(self.yes_count()))
    }
}

fn saturate(yes: usize) -> u8 {
    yes.min(usize::from(MAX_QUESTIONNAIRE_SCORE)) as u8
}
