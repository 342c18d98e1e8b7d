//! Stage pipeline.
//!
//! A frame is an ordered list of [`RenderStage`] plug-ins driven by a
//! [`RenderPipeline`]. Stages are created by name through the global
//! [`StageRegistry`], so the engine never links concrete stages directly.
//! [`ShaderStage`] is the one stage shipped with the crate.

mod pipeline;
mod registry;
mod shader;
mod shader_stage;
mod stage;
mod uniform;

pub use pipeline::RenderPipeline;
pub use registry::{register_builtin_stages, registry, StageFactory, StageRegistry};
pub use shader::{ShaderProgram, ShaderSources};
pub use shader_stage::ShaderStage;
pub use stage::{RenderStage, Stage, StageCtx};
pub use uniform::{UniformMap, UniformValue};
