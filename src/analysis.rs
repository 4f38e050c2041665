//! Text analysis for the reference engine.
//!
//! Analyzers are a capability of the engine and are invoked by name; the
//! mapping only carries the name. This module provides the small registry
//! used by [`MemoryTransport`](crate::transport::memory::MemoryTransport):
//!
//! - `standard`: Unicode word segmentation plus lowercasing. CJK
//!   ideographs segment one per token, so a multi-character value only
//!   matches whole-value lookups through the `.exact` sub-field.
//! - `whitespace`: split on whitespace, no case folding.
//!
//! Unknown analyzer names fall back to `standard`; a real engine would
//! have rejected them at index-provisioning time.

use unicode_segmentation::UnicodeSegmentation;

/// Analyze `text` with the named analyzer, returning its tokens.
pub fn analyze(analyzer: Option<&str>, text: &str) -> Vec<String> {
    match analyzer {
        Some("whitespace") => whitespace(text),
        _ => standard(text),
    }
}

/// Unicode word segmentation with lowercasing.
fn standard(text: &str) -> Vec<String> {
    text.unicode_words().map(|w| w.to_lowercase()).collect()
}

/// Whitespace splitting, case preserved.
fn whitespace(text: &str) -> Vec<String> {
    text.split_whitespace().map(|w| w.to_string()).collect()
}
