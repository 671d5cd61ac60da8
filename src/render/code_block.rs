//! One buffered code block → HTML.
//!
//! pulldown-cmark hands a code block over as `Start`, any number of `Text`
//! events and `End`. The renderer buffers the text here and swaps the whole
//! block for a single HTML event once the block closes.

use log::debug;
use pulldown_cmark::CodeBlockKind;

use super::highlight::{CodeHighlighter, HighlightError};

#[derive(Debug, Default)]
pub struct CodeBlock {
    /// Sanitized language token from the fence info string. Empty if none.
    pub language: String,
    pub source: String,
}

impl CodeBlock {
    pub fn new(kind: &CodeBlockKind<'_>) -> Self {
        let language = match kind {
            CodeBlockKind::Fenced(info) => language_token(info),
            CodeBlockKind::Indented => String::new(),
        };
        Self {
            language,
            source: String::new(),
        }
    }

    pub fn push(&mut self, text: &str) {
        self.source.push_str(text);
    }

    /// Renders the block, optionally wrapped in the copy-button chrome.
    pub fn to_html(
        &self,
        highlighter: Option<&dyn CodeHighlighter>,
        copy_button: bool,
    ) -> Result<String, HighlightError> {
        let body = match highlighter {
            Some(hl) if !self.language.is_empty() && hl.has_language(&self.language) => {
                hl.highlight(&self.source, &self.language)?
            }
            Some(hl) => {
                if !self.language.is_empty() {
                    debug!("No grammar for '{}', auto-detecting", self.language);
                }
                hl.highlight_auto(&self.source)?
            }
            None => escape_html(&self.source),
        };

        let mut html = String::with_capacity(body.len() + 64);
        let decorated = copy_button && !self.language.is_empty();
        if decorated {
            html.push_str("<div class=\"code-block\"><div class=\"code-header\">");
            html.push_str("<span class=\"code-language\">");
            html.push_str(&self.language);
            html.push_str("</span>");
            html.push_str(
                "<button class=\"code-copy-button\" type=\"button\" aria-label=\"Copy code\"></button>",
            );
            html.push_str("</div>");
        }
        if self.language.is_empty() {
            html.push_str("<pre><code>");
        } else {
            html.push_str("<pre><code class=\"language-");
            html.push_str(&self.language);
            html.push_str("\">");
        }
        html.push_str(&body);
        html.push_str("</code></pre>");
        if decorated {
            html.push_str("</div>");
        }
        html.push('\n');
        Ok(html)
    }
}

/// First word of an info string, restricted to characters that are safe in
/// a class attribute. `"c++ {.numberLines}"` → `"c++"`.
pub fn language_token(info: &str) -> String {
    info.split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '#' | '.'))
        .collect()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FailingHighlighter, TagHighlighter};

    fn fenced(info: &str, source: &str) -> CodeBlock {
        let mut block = CodeBlock::new(&CodeBlockKind::Fenced(info.into()));
        block.push(source);
        block
    }

    #[test]
    fn language_token_takes_first_word() {
        assert_eq!(language_token("rust"), "rust");
        assert_eq!(language_token("  python title=\"x.py\""), "python");
        assert_eq!(language_token("c++ {.numberLines}"), "c++");
        assert_eq!(language_token(""), "");
    }

    #[test]
    fn language_token_strips_attribute_breaking_chars() {
        assert_eq!(language_token("js\"><script>"), "jsscript");
    }

    #[test]
    fn indented_block_has_no_language() {
        let block = CodeBlock::new(&CodeBlockKind::Indented);
        assert!(block.language.is_empty());
    }

    #[test]
    fn plain_block_is_escaped_without_highlighter() {
        let html = fenced("", "<b>&</b>\n").to_html(None, false).unwrap();
        assert_eq!(html, "<pre><code>&lt;b&gt;&amp;&lt;/b&gt;\n</code></pre>\n");
    }

    #[test]
    fn known_language_uses_named_grammar() {
        let hl = TagHighlighter;
        let html = fenced("rust", "x\n").to_html(Some(&hl), false).unwrap();
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">[rust]x\n</code></pre>\n"
        );
    }

    #[test]
    fn unknown_language_uses_auto_detection() {
        let hl = TagHighlighter;
        let html = fenced("klingon", "x\n").to_html(Some(&hl), false).unwrap();
        assert!(html.contains("class=\"language-klingon\""));
        assert!(html.contains("[auto]x"));
    }

    #[test]
    fn copy_button_wraps_blocks_with_language() {
        let html = fenced("rust", "x\n").to_html(None, true).unwrap();
        assert!(html.starts_with("<div class=\"code-block\"><div class=\"code-header\">"));
        assert!(html.contains("<span class=\"code-language\">rust</span>"));
        assert!(html.contains("class=\"code-copy-button\""));
        assert!(html.ends_with("</code></pre></div>\n"));
    }

    #[test]
    fn copy_button_skips_blocks_without_language() {
        let html = fenced("", "x\n").to_html(None, true).unwrap();
        assert!(!html.contains("code-copy-button"));
    }

    #[test]
    fn highlighter_failure_is_returned() {
        let hl = FailingHighlighter;
        assert!(fenced("rust", "x\n").to_html(Some(&hl), false).is_err());
    }
}
