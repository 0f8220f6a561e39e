// src/document/mod.rs
//! Document handling: PDF text extraction, whitespace normalization and
//! locating the counselor subsection inside the report text.

pub mod extract;
pub mod sections;
pub mod text;

pub use extract::{extract_text, join_pages, ExtractionError};
pub use sections::{counselor_section, MarkerSplitter, SectionSplitter, COUNSELOR_MARKER};
pub use text::normalize;

/// Hex-encoded SHA-256 of the raw document bytes. Used as document identity.
pub fn content_hash(bytes: &[u8]) -> String {
    use sha2::{Digest, Sha256};
    use std::fmt::Write as _;

    let digest = Sha256::digest(bytes);
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Short prefix of a content hash, safe to put into logs.
pub fn short_id(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
