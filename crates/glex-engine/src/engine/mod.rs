//! Engine orchestration.
//!
//! [`Engine`] reacts to host surface lifecycle events, owns the
//! context/thread/pipeline triple, and hands configuration from arbitrary
//! threads to the render thread through coalescing slots. The
//! [`SurfaceRegistry`] lets a binding layer route notifications by surface id.

mod channel;
mod config;
mod frame;
mod lifecycle;
mod stages;
mod surfaces;

pub use config::{ContextInfo, EngineConfig, EngineState};
pub use lifecycle::Engine;
pub use surfaces::{surfaces, PendingSurface, SurfaceId, SurfaceRegistry};
