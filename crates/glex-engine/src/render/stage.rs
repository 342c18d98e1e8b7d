use crate::device::{FeatureLevel, Gl};
use crate::error::{EngineError, EngineResult, LastError};
use crate::input::PointerEvent;

use super::{ShaderSources, UniformMap};

/// Per-call view handed to stage hooks on the render thread.
pub struct StageCtx<'a> {
    gl: &'a dyn Gl,
    level: FeatureLevel,
    errors: &'a LastError,
}

impl<'a> StageCtx<'a> {
    pub fn new(gl: &'a dyn Gl, level: FeatureLevel, errors: &'a LastError) -> Self {
        Self { gl, level, errors }
    }

    pub fn gl(&self) -> &'a dyn Gl {
        self.gl
    }

    /// Level negotiated by the context the stage runs on.
    pub fn feature_level(&self) -> FeatureLevel {
        self.level
    }

    /// Records a non-fatal failure into the engine's last error.
    pub fn report(&self, err: EngineError) {
        self.errors.record(&err);
    }
}

/// One pluggable phase of a frame.
///
/// Implementors only provide hooks; [`Stage`] owns the enabled/initialized
/// gating and the current size. Hooks run on the render thread with the
/// context bound.
pub trait RenderStage: Send {
    /// Registry name; unique within a pipeline.
    fn name(&self) -> &str;

    /// Lowest context level this stage can run on.
    fn required_level(&self) -> FeatureLevel {
        FeatureLevel::ES_3_0
    }

    /// Allocates GPU state. An error leaves the stage uninitialized.
    fn on_initialize(&mut self, ctx: &StageCtx<'_>, width: i32, height: i32) -> anyhow::Result<()>;

    fn on_resize(&mut self, _ctx: &StageCtx<'_>, _width: i32, _height: i32) {}

    fn on_update(&mut self, _ctx: &StageCtx<'_>, _dt: f32) {}

    fn on_render(&mut self, ctx: &StageCtx<'_>, width: i32, height: i32);

    fn on_pointer(&mut self, _ctx: &StageCtx<'_>, _event: &PointerEvent) {}

    /// Releases GPU state. Only called after a successful `on_initialize`.
    fn on_destroy(&mut self, _ctx: &StageCtx<'_>) {}

    /// Accepts host shader sources. Returns `false` if the stage is not
    /// programmable.
    fn set_shader_sources(&mut self, _sources: &ShaderSources) -> bool {
        false
    }

    /// Receives the full host uniform snapshot.
    fn set_uniforms(&mut self, _uniforms: &UniformMap) {}
}

/// Lifecycle wrapper around a [`RenderStage`].
///
/// `update`, `render` and `pointer` are no-ops unless the stage is both
/// enabled and initialized.
pub struct Stage {
    inner: Box<dyn RenderStage>,
    enabled: bool,
    initialized: bool,
    width: i32,
    height: i32,
}

impl Stage {
    pub fn new(inner: Box<dyn RenderStage>) -> Self {
        Self {
            inner,
            enabled: true,
            initialized: false,
            width: 0,
            height: 0,
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn size(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn inner(&self) -> &dyn RenderStage {
        self.inner.as_ref()
    }

    pub fn inner_mut(&mut self) -> &mut dyn RenderStage {
        self.inner.as_mut()
    }

    fn active(&self) -> bool {
        self.enabled && self.initialized
    }

    pub fn initialize(&mut self, ctx: &StageCtx<'_>, width: i32, height: i32) -> EngineResult<()> {
        self.width = width;
        self.height = height;
        if self.initialized {
            return Ok(());
        }

        match self.inner.on_initialize(ctx, width, height) {
            Ok(()) => {
                self.initialized = true;
                log::debug!("stage '{}' initialized at {width}x{height}", self.name());
                Ok(())
            }
            Err(e) => Err(EngineError::StageInit {
                stage: self.name().to_owned(),
                reason: format!("{e:#}"),
            }),
        }
    }

    pub fn resize(&mut self, ctx: &StageCtx<'_>, width: i32, height: i32) {
        self.width = width;
        self.height = height;
        if self.initialized {
            self.inner.on_resize(ctx, width, height);
        }
    }

    pub fn update(&mut self, ctx: &StageCtx<'_>, dt: f32) {
        if self.active() {
            self.inner.on_update(ctx, dt);
        }
    }

    pub fn render(&mut self, ctx: &StageCtx<'_>) {
        if self.active() {
            self.inner.on_render(ctx, self.width, self.height);
        }
    }

    pub fn pointer(&mut self, ctx: &StageCtx<'_>, event: &PointerEvent) {
        if self.active() {
            self.inner.on_pointer(ctx, event);
        }
    }

    pub fn destroy(&mut self, ctx: &StageCtx<'_>) {
        if self.initialized {
            self.inner.on_destroy(ctx);
            self.initialized = false;
            log::debug!("stage '{}' destroyed", self.name());
        }
    }
}

impl std::fmt::Debug for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stage")
            .field("name", &self.name())
            .field("enabled", &self.enabled)
            .field("initialized", &self.initialized)
            .field("size", &(self.width, self.height))
            .finish()
    }
}
