// src/document/text.rs
use once_cell::sync::OnceCell;
use regex::Regex;

/// Trim, then collapse every run of whitespace (spaces, tabs, newlines, ...)
/// into a single space.
pub fn normalize(input: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(input.trim(), " ").into_owned()
}
