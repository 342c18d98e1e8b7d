use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use parking_lot::Mutex;

use crate::device::{FeatureLevel, GraphicsContext};
use crate::error::{EngineError, LastError};
use crate::paint::Color;
use crate::render::{RenderPipeline, ShaderSources, StageCtx, StageRegistry, UniformMap};

use super::channel::{PointerChannel, Slot};

/// Configuration written by any thread, consumed by the render side.
pub(crate) struct Shared {
    pub background: Mutex<Color>,
    pub resize: Slot<(i32, i32)>,
    pub shader: Slot<ShaderSources>,
    pub uniforms: Slot<UniformMap>,
    pub stages: Slot<Vec<String>>,
    pub pointer: PointerChannel,
    /// Survives surface teardown so an early `start` takes effect later.
    pub start_requested: AtomicBool,
    pub errors: Arc<LastError>,
    pub registry: &'static StageRegistry,
}

/// State only touched by whichever thread holds the context bind.
pub(crate) struct RenderState {
    pub pipeline: RenderPipeline,
    pub level: FeatureLevel,
    pub applied_pointer_seq: u64,
    /// Host sources, seeded into programmable stages created later.
    pub sources: Option<ShaderSources>,
    pub uniforms: UniformMap,
}

impl RenderState {
    pub fn new() -> Self {
        Self {
            pipeline: RenderPipeline::new(),
            level: FeatureLevel::ES_2_0,
            applied_pointer_seq: 0,
            sources: None,
            uniforms: UniformMap::new(),
        }
    }

    /// Builds the pipeline for a fresh context bound to the calling thread.
    pub fn prepare(&mut self, shared: &Shared, context: &GraphicsContext) {
        self.level = context.feature_level().unwrap_or(FeatureLevel::ES_2_0);
        self.applied_pointer_seq = shared.pointer.last_seq();

        let gl = context.gl();
        let ctx = StageCtx::new(gl.as_ref(), self.level, &shared.errors);

        let names = shared.stages.take_current();
        self.apply_stage_list(shared, &ctx, &names);

        let (w, h) = context.size();
        if let Err(e) = self.pipeline.initialize(&ctx, w, h) {
            ctx.report(e);
        }
        log::info!(
            "pipeline ready: [{}] at {w}x{h}",
            self.pipeline.names().join(", ")
        );
    }

    /// One frame, in fixed order: stage list, shader, uniforms, resize,
    /// pointer, clear, update, render.
    pub fn frame(&mut self, shared: &Shared, context: &GraphicsContext, dt: f32) {
        let gl = context.gl();
        let ctx = StageCtx::new(gl.as_ref(), self.level, &shared.errors);

        // Taken first so stages created by this frame's list change start
        // from the new sources.
        let sources = shared.shader.take().filter(|_| self.accept_shader(&ctx));
        if let Some(s) = &sources {
            self.sources = Some(s.clone());
        }

        if let Some(names) = shared.stages.take() {
            self.apply_stage_list(shared, &ctx, &names);
        }

        if let Some(s) = sources {
            if self.pipeline.apply_shader_sources(&s) == 0 {
                log::warn!("shader sources stored; no programmable stage active");
            }
        }

        if let Some(uniforms) = shared.uniforms.take() {
            self.uniforms = uniforms;
            self.pipeline.apply_uniforms(&self.uniforms);
        }

        if let Some((w, h)) = shared.resize.take() {
            self.pipeline.resize(&ctx, w, h);
            context.set_surface_size(w, h);
            log::debug!("resized to {w}x{h}");
        }

        if let Some(event) = shared.pointer.newer_than(self.applied_pointer_seq) {
            self.applied_pointer_seq = event.seq;
            self.pipeline.dispatch_pointer(&ctx, &event);
        }

        let (w, h) = self.pipeline.size();
        let bg = *shared.background.lock();
        gl.viewport(0, 0, w, h);
        gl.clear_color(bg.r, bg.g, bg.b, bg.a);
        gl.clear();

        self.pipeline.update(&ctx, dt);
        self.pipeline.render(&ctx);
    }

    pub fn destroy_pipeline(&mut self, shared: &Shared, context: &GraphicsContext) {
        let gl = context.gl();
        let ctx = StageCtx::new(gl.as_ref(), self.level, &shared.errors);
        self.pipeline.destroy(&ctx);
    }

    fn accept_shader(&self, ctx: &StageCtx<'_>) -> bool {
        if self.level.supports_es3() {
            return true;
        }
        ctx.report(EngineError::precondition(format!(
            "custom shader requires feature level 3.0, context provides {}",
            self.level
        )));
        false
    }

    /// Diffs the live pipeline against `names`: drops stages not listed,
    /// creates missing ones, then orders the pipeline as listed.
    fn apply_stage_list(&mut self, shared: &Shared, ctx: &StageCtx<'_>, names: &[String]) {
        for live in self.pipeline.names() {
            if !names.contains(&live) {
                self.pipeline.remove_stage(ctx, &live);
            }
        }

        for name in names {
            if self.pipeline.contains(name) {
                continue;
            }
            let Some(mut stage) = shared.registry.create(name) else {
                ctx.report(EngineError::UnknownStage(name.clone()));
                continue;
            };
            if stage.name() != name {
                ctx.report(EngineError::Registration(format!(
                    "factory for '{name}' built a stage named '{}'",
                    stage.name()
                )));
                continue;
            }

            let required = stage.required_level();
            if required > self.level {
                ctx.report(EngineError::FeatureLevelTooLow {
                    stage: name.clone(),
                    required,
                    available: self.level,
                });
                continue;
            }

            if let Some(sources) = &self.sources {
                stage.set_shader_sources(sources);
            }
            stage.set_uniforms(&self.uniforms);

            if let Err(e) = self.pipeline.add_stage(ctx, stage) {
                ctx.report(e);
            }
        }

        self.pipeline.reorder(names);
    }
}
