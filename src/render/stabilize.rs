//! Rendering Markdown that may stop inside a code fence.
//!
//! While a reply is still streaming in, the text often ends inside an open
//! ```` ``` ```` block. Handed to the renderer as-is, everything after the
//! opening fence turns into code and then snaps back once the fence closes.
//! Instead, the unfinished block is cut off and rendered as if it were
//! already closed:
//!
//! ```text
//!   "intro\n```rust\nfn ma"
//!    ├─ prefix:  "intro\n"           → render(prefix)
//!    └─ open:    "rust\nfn ma"       → render("```rust\nfn ma\n```")
//! ```
//!
//! Text with balanced fences goes to the renderer untouched.

use log::debug;

use super::{RenderError, Renderer};

/// Code fence delimiter.
pub const FENCE: &str = "```";

/// Splits `text` at its last fence if that fence is still open.
///
/// Splitting on [`FENCE`] (left to right, non-overlapping) gives an odd
/// number of segments when every fence is closed and an even number when
/// the last segment sits inside an open fence. Returns `None` in the first
/// case and `Some((prefix, open_segment))` in the second, where
/// `prefix` is every segment but the last joined back with [`FENCE`].
pub fn split_open_fence(text: &str) -> Option<(&str, &str)> {
    let mut fences = 0usize;
    let mut last = 0usize;
    for (idx, _) in text.match_indices(FENCE) {
        fences += 1;
        last = idx;
    }
    if fences % 2 == 0 {
        return None;
    }
    Some((&text[..last], &text[last + FENCE.len()..]))
}

/// Renders `text`, closing a trailing open fence first.
///
/// Errors from the renderer are returned as-is; see
/// [`Renderer::render_partial`] for the variant that honors the failure policy.
pub fn stabilize(renderer: &Renderer, text: &str) -> Result<String, RenderError> {
    let Some((prefix, open)) = split_open_fence(text) else {
        return renderer.render(text);
    };
    debug!(
        "Closing open code fence ({} prefix bytes, {} open bytes)",
        prefix.len(),
        open.len()
    );

    let mut html = renderer.render(prefix)?;
    let closed = format!("{FENCE}{open}\n{FENCE}");
    html.push_str(&renderer.render(&closed)?);
    Ok(html)
}
