//! glex engine crate.
//!
//! This crate owns the GL context lifecycle, the dedicated render thread and the
//! stage pipeline it drives. Hosts talk to it through [`engine::Engine`].

pub mod device;
pub mod engine;
pub mod input;
pub mod render;
pub mod resources;
pub mod runtime;
pub mod time;

pub mod assets;
pub mod error;
pub mod logging;
pub mod paint;

pub use error::{EngineError, EngineResult, LastError};
