//! GL device + surface management.
//!
//! This module is responsible for:
//! - the driver seam (`Platform` for EGL-style display/surface/context calls,
//!   `Gl` for GLES calls) that keeps the core independent of any loader
//! - negotiating and owning the context bound to a host surface
//! - explicit thread binding and buffer presentation
//!
//! With the `glow` feature, [`GlowGl`] adapts a `glow::Context` to [`Gl`].

mod config;
mod context;
mod driver;
#[cfg(feature = "glow")]
mod glow;
mod surface;

pub use config::ContextConfig;
pub use context::{GlInfo, GraphicsContext};
pub use driver::{
    Backend, ConfigHandle, ConfigProfile, ContextHandle, DisplayHandle, DrawMode, FeatureLevel,
    Gl, GlString, Platform, ShaderKind, SurfaceHandle,
};
#[cfg(feature = "glow")]
pub use self::glow::GlowGl;
pub use surface::NativeSurface;
