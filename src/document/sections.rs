// src/document/sections.rs
//! Subsection extraction strategies.
//!
//! Reports put free-text counselor notes after a fixed marker line. The marker
//! strategy is the default; other layouts plug in through [`SectionSplitter`].

use once_cell::sync::Lazy;
use regex::Regex;

/// Marker that opens the counselor notes in a combined report.
pub const COUNSELOR_MARKER: &str = "--- COUNSELOR REPORT ---";

static DEFAULT_SPLITTER: Lazy<MarkerSplitter> =
    Lazy::new(|| MarkerSplitter::new(COUNSELOR_MARKER));

/// Pulls one subsection out of (normalized) document text.
pub trait SectionSplitter: Send + Sync {
    /// Returns the subsection, or `None` when the layout is not recognized.
    fn split<'a>(&self, text: &'a str) -> Option<&'a str>;
    /// Strategy name for diagnostics.
    fn name(&self) -> &'static str;
}

/// Everything after the first case-insensitive occurrence of a literal marker.
#[derive(Debug, Clone)]
pub struct MarkerSplitter {
    re: Regex,
}

impl MarkerSplitter {
    pub fn new(marker: &str) -> Self {
        // (?is): case-insensitive, `.` spans newlines. `.+` needs at least one char.
        let pattern = format!(r"(?is){}(.+)", regex::escape(marker));
        let re = Regex::new(&pattern).expect("escaped marker is a valid regex");
        Self { re }
    }
}

impl Default for MarkerSplitter {
    fn default() -> Self {
        Self::new(COUNSELOR_MARKER)
    }
}

impl SectionSplitter for MarkerSplitter {
    fn split<'a>(&self, text: &'a str) -> Option<&'a str> {
        self.re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    }

    fn name(&self) -> &'static str {
        "marker"
    }
}

/// Counselor notes via the default marker; empty string when absent.
pub fn counselor_section(text: &str) -> String {
    DEFAULT_SPLITTER.split(text).unwrap_or_default().to_string()
}
