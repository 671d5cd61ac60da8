//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use crate::render::highlight::{CodeHighlighter, HighlightError};

/// Tags output with the grammar used, so tests can tell which path ran.
/// Knows `rust` and `js`; everything else is auto-detected.
pub struct TagHighlighter;

impl CodeHighlighter for TagHighlighter {
    fn has_language(&self, name: &str) -> bool {
        matches!(name, "rust" | "js")
    }

    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError> {
        Ok(format!("[{language}]{code}"))
    }

    fn highlight_auto(&self, code: &str) -> Result<String, HighlightError> {
        Ok(format!("[auto]{code}"))
    }
}

/// Claims every language and fails on every call.
pub struct FailingHighlighter;

impl CodeHighlighter for FailingHighlighter {
    fn has_language(&self, _name: &str) -> bool {
        true
    }

    fn highlight(&self, _code: &str, _language: &str) -> Result<String, HighlightError> {
        Err(HighlightError::Syntect(syntect::Error::Fmt(std::fmt::Error)))
    }

    fn highlight_auto(&self, _code: &str) -> Result<String, HighlightError> {
        Err(HighlightError::Syntect(syntect::Error::Fmt(std::fmt::Error)))
    }
}
