//! # Application Setup
//!
//! Everything that happens before the first render: reading settings and
//! collapsing them into one immutable [`RenderOptions`](crate::render::RenderOptions).
//!
//! ```text
//!   defaults     ─┐
//!   config.toml  ─┤
//!   env vars     ─┼─► resolve() ─► RenderOptions ─► Renderer::new()
//!   CLI flags    ─┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: the layered config file, env and CLI resolution

pub mod config;
