//! Syntax highlighting for fenced code blocks.
//!
//! The renderer only talks to the [`CodeHighlighter`] trait. The default
//! implementation wraps syntect; tests swap in their own.

use std::fmt;
use std::sync::LazyLock;

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::{
    ClassStyle, ClassedHTMLGenerator, IncludeBackground, css_for_theme_with_class_style,
    styled_line_to_highlighted_html,
};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Prefix for every highlight class, e.g. `hl-keyword`.
const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

/// How highlighted code is coloured in the output HTML.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightStyle {
    /// `<span class="hl-...">`, paired with [`CodeHighlighter::stylesheet`].
    #[default]
    Classed,
    /// `<span style="color:#...">` taken straight from the theme.
    Inline,
}

#[derive(Debug)]
pub enum HighlightError {
    /// The configured theme is not in the bundled theme set.
    UnknownTheme(String),
    /// syntect failed while scoping or styling a line.
    Syntect(syntect::Error),
}

impl fmt::Display for HighlightError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightError::UnknownTheme(name) => write!(
                f,
                "unknown highlight theme: {name} (available: {})",
                SyntectHighlighter::theme_names().join(", ")
            ),
            HighlightError::Syntect(e) => write!(f, "highlighting failed: {e}"),
        }
    }
}

impl std::error::Error for HighlightError {}

impl From<syntect::Error> for HighlightError {
    fn from(e: syntect::Error) -> Self {
        HighlightError::Syntect(e)
    }
}

pub trait CodeHighlighter: Send + Sync {
    /// Whether a grammar is registered under `name` (`"rs"`, `"python"`, ...).
    fn has_language(&self, name: &str) -> bool;

    /// Highlight `code` with the grammar registered under `language`.
    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError>;

    /// Highlight `code`, guessing the grammar from its content.
    fn highlight_auto(&self, code: &str) -> Result<String, HighlightError>;

    /// CSS needed to colour the output, if any.
    fn stylesheet(&self) -> Result<String, HighlightError> {
        Ok(String::new())
    }
}

/// Highlighter backed by syntect's bundled grammars and themes.
pub struct SyntectHighlighter {
    style: HighlightStyle,
    theme: &'static Theme,
}

impl SyntectHighlighter {
    pub fn new(style: HighlightStyle, theme_name: &str) -> Result<Self, HighlightError> {
        let theme = THEME_SET
            .themes
            .get(theme_name)
            .ok_or_else(|| HighlightError::UnknownTheme(theme_name.to_string()))?;
        Ok(Self { style, theme })
    }

    /// Names of every bundled theme, sorted.
    pub fn theme_names() -> Vec<&'static str> {
        THEME_SET.themes.keys().map(String::as_str).collect()
    }

    fn render(&self, code: &str, syntax: &SyntaxReference) -> Result<String, HighlightError> {
        match self.style {
            HighlightStyle::Classed => {
                let mut generator =
                    ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, CLASS_STYLE);
                for line in LinesWithEndings::from(code) {
                    generator.parse_html_for_line_which_includes_newline(line)?;
                }
                Ok(generator.finalize())
            }
            HighlightStyle::Inline => {
                let mut lines = HighlightLines::new(syntax, self.theme);
                let mut out = String::with_capacity(code.len() * 2);
                for line in LinesWithEndings::from(code) {
                    let ranges = lines.highlight_line(line, &SYNTAX_SET)?;
                    out.push_str(&styled_line_to_highlighted_html(
                        &ranges,
                        IncludeBackground::No,
                    )?);
                }
                Ok(out)
            }
        }
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn has_language(&self, name: &str) -> bool {
        SYNTAX_SET.find_syntax_by_token(name).is_some()
    }

    fn highlight(&self, code: &str, language: &str) -> Result<String, HighlightError> {
        match SYNTAX_SET.find_syntax_by_token(language) {
            Some(syntax) => self.render(code, syntax),
            None => self.highlight_auto(code),
        }
    }

    fn highlight_auto(&self, code: &str) -> Result<String, HighlightError> {
        // syntect can only guess from the first line (shebangs, modelines, `<?php`)
        let syntax = SYNTAX_SET
            .find_syntax_by_first_line(code)
            .unwrap_or_else(|| SYNTAX_SET.find_syntax_plain_text());
        debug!("Auto-detected code block syntax: {}", syntax.name);
        self.render(code, syntax)
    }

    fn stylesheet(&self) -> Result<String, HighlightError> {
        match self.style {
            HighlightStyle::Classed => Ok(css_for_theme_with_class_style(self.theme, CLASS_STYLE)?),
            HighlightStyle::Inline => Ok(String::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classed() -> SyntectHighlighter {
        SyntectHighlighter::new(HighlightStyle::Classed, DEFAULT_THEME).unwrap()
    }

    #[test]
    fn test_unknown_theme_is_rejected() {
        let err = SyntectHighlighter::new(HighlightStyle::Inline, "no-such-theme")
            .err()
            .unwrap();
        assert!(matches!(err, HighlightError::UnknownTheme(ref name) if name == "no-such-theme"));
        let msg = err.to_string();
        assert!(msg.starts_with("unknown highlight theme: no-such-theme (available: "));
        assert!(msg.contains(DEFAULT_THEME), "got {msg}");
    }

    #[test]
    fn test_has_language_by_token() {
        let hl = classed();
        assert!(hl.has_language("rust"));
        assert!(hl.has_language("rs"));
        assert!(hl.has_language("js"));
        assert!(!hl.has_language("definitely-not-a-language"));
    }

    #[test]
    fn classed_output_uses_prefixed_classes() {
        let html = classed().highlight("fn main() {}\n", "rust").unwrap();
        assert!(html.contains("class=\"hl-"), "got {html}");
        assert!(html.contains("main"));
    }

    #[test]
    fn inline_output_uses_theme_colors() {
        let hl = SyntectHighlighter::new(HighlightStyle::Inline, DEFAULT_THEME).unwrap();
        let html = hl.highlight("let x = 1;\n", "rust").unwrap();
        assert!(html.contains("style=\"color:#"), "got {html}");
        assert!(!html.contains("class=\"hl-"));
    }

    #[test]
    fn highlighted_code_is_escaped() {
        let html = classed().highlight_auto("a < b && c > d\n").unwrap();
        assert!(html.contains("&lt;"));
        assert!(html.contains("&amp;&amp;"));
        assert!(!html.contains("a < b"));
    }

    #[test]
    fn unknown_language_falls_back_to_auto_detection() {
        let hl = classed();
        let code = "#!/bin/bash\necho hi\n";
        assert_eq!(
            hl.highlight(code, "not-a-lang").unwrap(),
            hl.highlight_auto(code).unwrap()
        );
    }

    #[test]
    fn stylesheet_only_for_classed_style() {
        assert!(classed().stylesheet().unwrap().contains(".hl-"));
        let inline = SyntectHighlighter::new(HighlightStyle::Inline, DEFAULT_THEME).unwrap();
        assert!(inline.stylesheet().unwrap().is_empty());
    }

    #[test]
    fn test_bundled_themes_include_default() {
        assert!(SyntectHighlighter::theme_names().contains(&DEFAULT_THEME));
    }
}
