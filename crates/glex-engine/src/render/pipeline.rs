use crate::error::EngineResult;
use crate::input::PointerEvent;

use super::{RenderStage, ShaderSources, Stage, StageCtx, UniformMap};

/// Ordered stage list driven once per frame.
///
/// Insertion order is execution order: later stages draw over earlier ones.
#[derive(Debug, Default)]
pub struct RenderPipeline {
    stages: Vec<Stage>,
    width: i32,
    height: i32,
    initialized: bool,
}

impl RenderPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    ///
    /// If the pipeline is already initialized the stage is initialized at the
    /// current size. It is kept even if that fails; it simply stays gated off.
    pub fn add_stage(&mut self, ctx: &StageCtx<'_>, stage: Box<dyn RenderStage>) -> EngineResult<()> {
        let mut stage = Stage::new(stage);
        let result = if self.initialized {
            stage.initialize(ctx, self.width, self.height)
        } else {
            Ok(())
        };
        self.stages.push(stage);
        result
    }

    /// Destroys and removes the first stage called `name`.
    pub fn remove_stage(&mut self, ctx: &StageCtx<'_>, name: &str) -> bool {
        let Some(idx) = self.stages.iter().position(|s| s.name() == name) else {
            return false;
        };
        let mut stage = self.stages.remove(idx);
        stage.destroy(ctx);
        true
    }

    /// Sorts stages into the order of `names`; unlisted stages keep their
    /// relative order after the listed ones.
    pub fn reorder<S: AsRef<str>>(&mut self, names: &[S]) {
        self.stages.sort_by_key(|s| {
            names
                .iter()
                .position(|n| n.as_ref() == s.name())
                .unwrap_or(usize::MAX)
        });
    }

    pub fn find(&self, name: &str) -> Option<&Stage> {
        self.stages.iter().find(|s| s.name() == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut Stage> {
        self.stages.iter_mut().find(|s| s.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name().to_owned()).collect()
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    // ── frame lifecycle ───────────────────────────────────────────────────

    /// Initializes every stage; all stages are attempted and the first
    /// failure is returned.
    pub fn initialize(&mut self, ctx: &StageCtx<'_>, width: i32, height: i32) -> EngineResult<()> {
        self.width = width;
        self.height = height;

        let mut first_err = None;
        for stage in &mut self.stages {
            if let Err(e) = stage.initialize(ctx, width, height) {
                log::error!("{e}");
                first_err.get_or_insert(e);
            }
        }
        self.initialized = true;

        first_err.map_or(Ok(()), Err)
    }

    pub fn resize(&mut self, ctx: &StageCtx<'_>, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        for stage in &mut self.stages {
            stage.resize(ctx, width, height);
        }
    }

    pub fn update(&mut self, ctx: &StageCtx<'_>, dt: f32) {
        for stage in &mut self.stages {
            stage.update(ctx, dt);
        }
    }

    pub fn render(&mut self, ctx: &StageCtx<'_>) {
        for stage in &mut self.stages {
            stage.render(ctx);
        }
    }

    pub fn dispatch_pointer(&mut self, ctx: &StageCtx<'_>, event: &PointerEvent) {
        for stage in &mut self.stages {
            stage.pointer(ctx, event);
        }
    }

    /// Hands `sources` to every programmable stage; returns how many took them.
    pub fn apply_shader_sources(&mut self, sources: &ShaderSources) -> usize {
        let mut accepted = 0;
        for stage in &mut self.stages {
            if stage.inner_mut().set_shader_sources(sources) {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn apply_uniforms(&mut self, uniforms: &UniformMap) {
        for stage in &mut self.stages {
            stage.inner_mut().set_uniforms(uniforms);
        }
    }

    /// Destroys and drops every stage. The pipeline can be initialized again.
    pub fn destroy(&mut self, ctx: &StageCtx<'_>) {
        for stage in &mut self.stages {
            stage.destroy(ctx);
        }
        self.stages.clear();
        self.initialized = false;
    }
}
