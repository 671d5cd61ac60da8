//! chatmark: Markdown → HTML for chat front ends, including replies that
//! are still streaming in.

pub mod core;
pub mod render;

#[cfg(test)]
pub mod test_support;

pub use render::{
    FailurePolicy, RenderError, RenderOptions, Renderer, StreamRenderer, split_chunks,
    split_open_fence, stabilize,
};
