//! Frame-by-frame rendering of text that arrives in chunks.

use log::debug;

use super::{RenderError, Renderer};

/// Accumulates streamed chunks and renders a stable frame after each one.
///
/// Every frame is a function of the text received so far. The final render
/// from [`finish`](Self::finish) depends only on the complete text, never on
/// the frames that came before it.
pub struct StreamRenderer<'r> {
    renderer: &'r Renderer,
    buffer: String,
    frames: usize,
}

impl<'r> StreamRenderer<'r> {
    pub fn new(renderer: &'r Renderer) -> Self {
        Self {
            renderer,
            buffer: String::new(),
            frames: 0,
        }
    }

    /// Appends `chunk` and renders the text so far, closing any open fence.
    pub fn push(&mut self, chunk: &str) -> Result<String, RenderError> {
        self.buffer.push_str(chunk);
        self.frames += 1;
        debug!("Frame {} ({} bytes buffered)", self.frames, self.buffer.len());
        self.renderer.render_partial(&self.buffer)
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Number of frames rendered by [`push`](Self::push).
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Renders the complete text as a finished document.
    pub fn finish(self) -> Result<String, RenderError> {
        debug!("Stream finished after {} frames", self.frames);
        self.renderer.render_markdown(&self.buffer)
    }
}

/// Cuts `text` into pieces of at most `size` characters, never splitting a
/// character. Used to replay a finished text as if it were streaming in.
pub fn split_chunks(text: &str, size: usize) -> Vec<&str> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    for (count, (idx, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&text[start..idx]);
            start = idx;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderOptions;

    fn renderer() -> Renderer {
        Renderer::with_highlighter(RenderOptions::default(), None)
    }

    #[test]
    fn test_new_stream_is_empty() {
        let r = renderer();
        let stream = StreamRenderer::new(&r);
        assert_eq!(stream.text(), "");
        assert_eq!(stream.frames(), 0);
    }

    #[test]
    fn chunks_accumulate() {
        let r = renderer();
        let mut stream = StreamRenderer::new(&r);
        stream.push("Hel").unwrap();
        stream.push("lo").unwrap();
        assert_eq!(stream.text(), "Hello");
        assert_eq!(stream.frames(), 2);
    }

    #[test]
    fn frame_closes_open_fence() {
        let r = renderer();
        let mut stream = StreamRenderer::new(&r);
        stream.push("Look:\n\n").unwrap();
        let frame = stream.push("```rust\nlet a").unwrap();
        assert_eq!(
            frame,
            "<p>Look:</p>\n<pre><code class=\"language-rust\">let a\n</code></pre>\n"
        );
    }

    #[test]
    fn finish_matches_one_shot_render() {
        let r = renderer();
        let text = "Intro\n```py\nprint(1)\n```\nDone";
        let mut stream = StreamRenderer::new(&r);
        for chunk in ["Intro\n``", "`py\npri", "nt(1)\n`", "``\nDone"] {
            stream.push(chunk).unwrap();
        }
        assert_eq!(stream.finish().unwrap(), r.render_markdown(text).unwrap());
    }

    #[test]
    fn split_chunks_respects_char_boundaries() {
        assert_eq!(split_chunks("abcdefg", 3), vec!["abc", "def", "g"]);
        assert_eq!(split_chunks("héllo", 2), vec!["hé", "ll", "o"]);
        assert!(split_chunks("", 4).is_empty());
        assert_eq!(split_chunks("ab", 0), vec!["a", "b"]);
        assert_eq!(split_chunks("🦀🦀🦀", 2).concat(), "🦀🦀🦀");
    }
}
