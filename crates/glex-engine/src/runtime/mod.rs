//! Render loop runtime.
//!
//! [`RenderThread`] owns the dedicated OS thread that holds the context bind
//! while running, paces frames to a target rate, and executes work posted
//! from other threads between frames.

mod render_thread;

pub use render_thread::{FrameCallback, RenderTask, RenderThread};
