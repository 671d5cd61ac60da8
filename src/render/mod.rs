//! # Markdown → HTML
//!
//! ```text
//!   text ──► Parser (pulldown-cmark) ──► event rewrite ──► push_html ──► HTML
//!                                          │
//!                                          ├─ SoftBreak → HardBreak   (breaks)
//!                                          ├─ Html → Text             (escape_html)
//!                                          └─ CodeBlock → highlighted (CodeHighlighter)
//! ```
//!
//! A [`Renderer`] is built once from [`RenderOptions`] and never mutated, so
//! it can be shared by reference between any number of render calls.
//!
//! ## Modules
//!
//! - [`highlight`]: the `CodeHighlighter` seam and its syntect implementation
//! - [`code_block`]: one buffered code block → `<pre><code>` HTML
//! - [`stabilize`]: rendering text that stops inside an open code fence
//! - [`stream`]: frame-by-frame rendering of a growing buffer

pub mod code_block;
pub mod highlight;
pub mod stabilize;
pub mod stream;

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use log::{debug, error};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};
use serde::{Deserialize, Serialize};

use code_block::CodeBlock;
use highlight::{CodeHighlighter, HighlightError, HighlightStyle, SyntectHighlighter};

pub use stabilize::{FENCE, split_open_fence, stabilize};
pub use stream::{StreamRenderer, split_chunks};

/// What the policy-aware entry points do when rendering fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Log the failure and hand back the source text untouched.
    #[default]
    RawFallback,
    /// Return the error to the caller.
    Propagate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Single newlines become `<br />`.
    pub breaks: bool,
    /// Tables, strikethrough, task lists and GFM blockquote tags.
    pub gfm: bool,
    /// Curly quotes, en/em dashes and ellipses.
    pub smartypants: bool,
    pub highlight: bool,
    pub highlight_style: HighlightStyle,
    pub theme: String,
    pub copy_buttons: bool,
    /// Escape raw HTML in the source instead of passing it through.
    pub escape_html: bool,
    pub on_failure: FailurePolicy,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            breaks: true,
            gfm: true,
            smartypants: true,
            highlight: true,
            highlight_style: HighlightStyle::default(),
            theme: highlight::DEFAULT_THEME.to_string(),
            copy_buttons: false,
            escape_html: false,
            on_failure: FailurePolicy::default(),
        }
    }
}

impl RenderOptions {
    fn parser_options(&self) -> Options {
        let mut opts = Options::empty();
        if self.gfm {
            opts.insert(Options::ENABLE_TABLES);
            opts.insert(Options::ENABLE_STRIKETHROUGH);
            opts.insert(Options::ENABLE_TASKLISTS);
            opts.insert(Options::ENABLE_GFM);
        }
        if self.smartypants {
            opts.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        opts
    }
}

#[derive(Debug)]
pub enum RenderError {
    Highlight(HighlightError),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Highlight(e) => write!(f, "render error: {e}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Highlight(e) => Some(e),
        }
    }
}

impl From<HighlightError> for RenderError {
    fn from(e: HighlightError) -> Self {
        RenderError::Highlight(e)
    }
}

pub struct Renderer {
    options: RenderOptions,
    highlighter: Option<Arc<dyn CodeHighlighter>>,
}

impl Renderer {
    /// Builds a renderer, loading the syntect highlighter if `options.highlight` is set.
    pub fn new(options: RenderOptions) -> Result<Self, RenderError> {
        let highlighter: Option<Arc<dyn CodeHighlighter>> = if options.highlight {
            Some(Arc::new(SyntectHighlighter::new(
                options.highlight_style,
                &options.theme,
            )?))
        } else {
            None
        };
        Ok(Self::with_highlighter(options, highlighter))
    }

    pub fn with_highlighter(
        options: RenderOptions,
        highlighter: Option<Arc<dyn CodeHighlighter>>,
    ) -> Self {
        Self {
            options,
            highlighter,
        }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// CSS for classed highlighting. Empty when there's nothing to style.
    pub fn stylesheet(&self) -> Result<String, RenderError> {
        match &self.highlighter {
            Some(hl) => Ok(hl.stylesheet()?),
            None => Ok(String::new()),
        }
    }

    /// Renders `text` to HTML. No recovery: a highlighter failure is returned.
    pub fn render(&self, text: &str) -> Result<String, RenderError> {
        let parser = Parser::new_ext(text, self.options.parser_options());
        let events = self.rewrite(parser)?;

        let mut html_output = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());
        Ok(html_output)
    }

    /// Full-document render under the configured [`FailurePolicy`].
    pub fn render_markdown(&self, text: &str) -> Result<String, RenderError> {
        self.apply_policy(text, self.render(text))
    }

    /// Render of possibly unfinished text under the configured [`FailurePolicy`].
    pub fn render_partial(&self, text: &str) -> Result<String, RenderError> {
        self.apply_policy(text, stabilize(self, text))
    }

    fn apply_policy(
        &self,
        text: &str,
        result: Result<String, RenderError>,
    ) -> Result<String, RenderError> {
        match (result, self.options.on_failure) {
            (Ok(html), _) => Ok(html),
            (Err(e), FailurePolicy::RawFallback) => {
                error!("Markdown rendering failed, returning source text: {e}");
                Ok(text.to_string())
            }
            (Err(e), FailurePolicy::Propagate) => Err(e),
        }
    }

    fn rewrite<'a>(&self, parser: Parser<'a>) -> Result<Vec<Event<'a>>, RenderError> {
        let mut out = Vec::new();
        let mut pending: Option<CodeBlock> = None;

        for event in parser {
            if pending.is_some() {
                match event {
                    Event::Text(t) => {
                        if let Some(block) = pending.as_mut() {
                            block.push(&t);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(block) = pending.take() {
                            let html = block.to_html(
                                self.highlighter.as_deref(),
                                self.options.copy_buttons,
                            )?;
                            out.push(Event::Html(html.into()));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let block = CodeBlock::new(&kind);
                    debug!("Code block opened (language: {:?})", block.language);
                    pending = Some(block);
                }
                Event::SoftBreak if self.options.breaks => out.push(Event::HardBreak),
                Event::Html(raw) | Event::InlineHtml(raw) if self.options.escape_html => {
                    out.push(Event::Text(raw))
                }
                other => out.push(other),
            }
        }
        Ok(out)
    }
}
