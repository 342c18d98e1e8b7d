use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::assets;
use crate::device::{Backend, ContextConfig, FeatureLevel, GraphicsContext, NativeSurface};
use crate::error::{EngineError, LastError};
use crate::input::{PointerAction, PointerEvent};
use crate::paint::Color;
use crate::render::{
    register_builtin_stages, registry, ShaderSources, ShaderStage, StageRegistry, UniformMap,
    UniformValue,
};
use crate::resources::{tracker, ResourceStats};
use crate::runtime::RenderThread;

use super::channel::{PointerChannel, Slot};
use super::frame::{RenderState, Shared};
use super::stages::normalize;
use super::surfaces::{surfaces, SurfaceId};
use super::{ContextInfo, EngineConfig, EngineState};

#[derive(Default)]
struct Lifecycle {
    context: Option<Arc<GraphicsContext>>,
}

/// Coordinates one context, one render thread and one pipeline for a host
/// surface.
///
/// Surface callbacks and configuration setters may be called from any
/// thread. Setters only publish into per-category slots; the render thread
/// applies them at the start of the next frame. Failures never propagate to
/// the caller: they are logged and stored in [`last_error`](Self::last_error).
///
/// Stage lists are permissive: unknown names in a batch are dropped
/// individually (each reported through the last error) and the known ones
/// still apply.
pub struct Engine {
    backend: Backend,
    context_config: ContextConfig,
    lifecycle: Mutex<Lifecycle>,
    thread: RenderThread,
    shared: Arc<Shared>,
    render: Arc<Mutex<RenderState>>,
    surface_id: Mutex<Option<SurfaceId>>,
}

impl Engine {
    /// Engine using the process-wide stage registry (built-ins registered).
    pub fn new(config: EngineConfig, backend: Backend) -> Self {
        register_builtin_stages();
        Self::with_registry(config, backend, registry())
    }

    /// Engine resolving stage names through `registry`.
    pub fn with_registry(
        config: EngineConfig,
        backend: Backend,
        registry: &'static StageRegistry,
    ) -> Self {
        let errors = Arc::new(LastError::new());

        let initial = normalize(&config.default_stages, |n| registry.is_registered(n));
        for name in &initial.unknown {
            log::warn!("default stage '{name}' is not registered");
        }
        let stages = Slot::new(initial.names);

        let shared = Arc::new(Shared {
            background: Mutex::new(config.background.clamped()),
            resize: Slot::new((0, 0)),
            shader: Slot::new(ShaderSources::default()),
            uniforms: Slot::new(UniformMap::new()),
            stages,
            pointer: PointerChannel::new(),
            start_requested: AtomicBool::new(false),
            errors: Arc::clone(&errors),
            registry,
        });

        let thread = RenderThread::new(errors);
        thread.set_target_fps(config.target_fps);

        Self {
            backend,
            context_config: config.context,
            lifecycle: Mutex::new(Lifecycle::default()),
            thread,
            shared,
            render: Arc::new(Mutex::new(RenderState::new())),
            surface_id: Mutex::new(None),
        }
    }

    fn record(&self, err: EngineError) {
        self.shared.errors.record(&err);
    }

    // ── surface lifecycle ─────────────────────────────────────────────────

    /// Builds a context and pipeline for `surface`, replacing any previous one.
    ///
    /// Starts the loop if a start was requested or the previous surface's
    /// loop was running.
    pub fn on_surface_created(&self, surface: NativeSurface) {
        let mut life = self.lifecycle.lock();

        let was_running = self.thread.is_running();
        self.teardown_locked(&mut life);
        if was_running {
            self.shared.start_requested.store(true, Ordering::Release);
        }

        let context = Arc::new(GraphicsContext::new(self.backend.clone()));
        if let Err(e) = context.initialize(&surface, &self.context_config) {
            self.record(e);
            return;
        }

        self.render.lock().prepare(&self.shared, &context);

        // The render thread cannot bind while this thread still holds it.
        context.unbind_from_current_thread();
        life.context = Some(context);
        log::info!("surface ready");

        if self.shared.start_requested.load(Ordering::Acquire) {
            self.start_locked(&life);
        }
    }

    /// Records a new drawable size; applied on the next frame.
    pub fn on_surface_changed(&self, width: i32, height: i32) {
        self.resize(width, height);
    }

    /// Stops the loop and releases the pipeline and context.
    ///
    /// A pending start request is kept, so the loop resumes on the next
    /// surface.
    pub fn on_surface_destroyed(&self) {
        let mut life = self.lifecycle.lock();
        let was_running = self.thread.is_running();
        self.teardown_locked(&mut life);
        if was_running {
            self.shared.start_requested.store(true, Ordering::Release);
        }
        self.shared.resize.clear_dirty();
        self.shared.pointer.clear();
        log::info!("surface destroyed");
    }

    /// Destroys the pipeline on whichever thread can bind the context, then
    /// the thread and the context. Idempotent.
    fn teardown_locked(&self, life: &mut Lifecycle) {
        let Some(context) = life.context.take() else {
            self.thread.stop();
            return;
        };

        let destroyed = self.thread.is_running() && {
            let render = Arc::clone(&self.render);
            let shared = Arc::clone(&self.shared);
            let ctx = Arc::clone(&context);
            self.thread.post_and_wait(Box::new(move || {
                render.lock().destroy_pipeline(&shared, &ctx);
            }))
        };

        self.thread.stop();

        if !destroyed {
            match context.bind_to_current_thread() {
                Ok(()) => {
                    self.render.lock().destroy_pipeline(&self.shared, &context);
                    context.unbind_from_current_thread();
                }
                Err(e) => {
                    log::warn!("pipeline teardown without a bound context: {e}");
                    self.render.lock().pipeline = Default::default();
                }
            }
        }

        context.destroy();
    }

    // ── render loop ───────────────────────────────────────────────────────

    /// Starts the render loop now, or as soon as a surface exists.
    pub fn start(&self) {
        self.shared.start_requested.store(true, Ordering::Release);
        let life = self.lifecycle.lock();
        if life.context.is_none() {
            log::info!("start deferred until a surface exists");
            return;
        }
        self.start_locked(&life);
    }

    fn start_locked(&self, life: &Lifecycle) {
        if self.thread.is_running() {
            return;
        }
        let Some(context) = life.context.as_ref() else {
            return;
        };

        let shared = Arc::clone(&self.shared);
        let render = Arc::clone(&self.render);
        let ctx = Arc::clone(context);
        let frame = Box::new(move |dt: f32| {
            render.lock().frame(&shared, &ctx, dt);
        });

        if let Err(e) = self.thread.start(Arc::clone(context), frame) {
            self.record(e);
        }
    }

    /// Stops the loop, blocking until the render thread has exited.
    pub fn stop(&self) {
        self.shared.start_requested.store(false, Ordering::Release);
        let _life = self.lifecycle.lock();
        self.thread.stop();
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_running()
    }

    pub fn state(&self) -> EngineState {
        if self.thread.is_running() {
            EngineState::Running
        } else if self.lifecycle.lock().context.is_some() {
            EngineState::SurfaceReady
        } else {
            EngineState::Unbound
        }
    }

    /// Clamped to at least 1.
    pub fn set_target_fps(&self, fps: i32) {
        self.thread.set_target_fps(fps.max(1).unsigned_abs());
    }

    pub fn target_fps(&self) -> u32 {
        self.thread.target_fps()
    }

    pub fn current_fps(&self) -> f32 {
        self.thread.current_fps()
    }

    // ── configuration ─────────────────────────────────────────────────────

    /// Requests a new drawable size.
    pub fn resize(&self, width: i32, height: i32) {
        if width <= 0 || height <= 0 {
            self.record(EngineError::invalid(format!("surface size {width}x{height}")));
            return;
        }
        self.shared.resize.publish((width, height));
    }

    /// Components are clamped to `[0, 1]`.
    pub fn set_background_color(&self, r: f32, g: f32, b: f32, a: f32) {
        *self.shared.background.lock() = Color::new(r, g, b, a).clamped();
    }

    pub fn background_color(&self) -> Color {
        *self.shared.background.lock()
    }

    /// Publishes a shader pair and switches the stage list to the
    /// programmable stage alone. Empty halves use the built-in shaders.
    pub fn set_shader_sources(&self, vertex: &str, fragment: &str) {
        self.shared
            .shader
            .publish(ShaderSources::new(vertex, fragment));
        self.set_stages(&[ShaderStage::NAME]);
    }

    /// Reads a shader pair from disk and publishes it.
    pub fn load_shader_files(&self, vertex: impl AsRef<Path>, fragment: impl AsRef<Path>) {
        match assets::read_shader_sources(vertex.as_ref(), fragment.as_ref()) {
            Ok(sources) => self.set_shader_sources(&sources.vertex, &sources.fragment),
            Err(e) => self.record(EngineError::ShaderFile(format!("{e:#}"))),
        }
    }

    /// Sets a float uniform by component count (1, 2, 3, 4 or 16).
    pub fn set_uniform(&self, name: &str, values: &[f32]) {
        if name.is_empty() {
            self.record(EngineError::invalid("empty uniform name"));
            return;
        }
        match UniformValue::from_slice(values) {
            Ok(value) => {
                self.shared.uniforms.update(|map| {
                    map.insert(name.to_owned(), value);
                    true
                });
            }
            Err(e) => self.record(e),
        }
    }

    pub fn remove_uniform(&self, name: &str) {
        self.shared.uniforms.update(|map| map.remove(name).is_some());
    }

    /// Replaces the requested stage list.
    ///
    /// Unknown names are skipped (each recorded as the last error) and
    /// duplicates collapse to their first occurrence; the rest applies.
    pub fn set_stages<S: AsRef<str>>(&self, names: &[S]) {
        let registry = self.shared.registry;
        let list = normalize(names, |n| registry.is_registered(n));
        for name in list.unknown {
            self.record(EngineError::UnknownStage(name));
        }
        self.shared.stages.publish(list.names);
    }

    /// Appends one stage if it is known and not already requested.
    pub fn add_stage(&self, name: &str) {
        if !self.shared.registry.is_registered(name) {
            self.record(EngineError::UnknownStage(name.to_owned()));
            return;
        }
        self.shared.stages.update(|list| {
            if list.iter().any(|n| n == name) {
                return false;
            }
            list.push(name.to_owned());
            true
        });
    }

    pub fn remove_stage(&self, name: &str) {
        self.shared.stages.update(|list| {
            let before = list.len();
            list.retain(|n| n != name);
            list.len() != before
        });
    }

    /// Currently requested stage names, in order.
    pub fn stages(&self) -> Vec<String> {
        self.shared.stages.get()
    }

    /// Forwards a pointer sample; only the newest sample per frame reaches
    /// the stages.
    pub fn pointer_event(&self, x: f32, y: f32, action: i32, pointer_id: i32) {
        if !x.is_finite() || !y.is_finite() {
            self.record(EngineError::invalid(format!("pointer position ({x}, {y})")));
            return;
        }
        self.shared.pointer.publish(PointerEvent {
            x,
            y,
            action: PointerAction::from_code(action),
            pointer_id,
            seq: 0,
        });
    }

    // ── queries ───────────────────────────────────────────────────────────

    pub fn context_info(&self) -> ContextInfo {
        let life = self.lifecycle.lock();
        let Some(context) = life.context.as_ref() else {
            return ContextInfo::not_initialized();
        };
        let Some(info) = context.info() else {
            return ContextInfo::not_initialized();
        };
        let (width, height) = context.size();
        ContextInfo {
            version: info.version,
            renderer: info.renderer,
            feature_level: Some(info.feature_level),
            width,
            height,
        }
    }

    pub fn feature_level(&self) -> Option<FeatureLevel> {
        self.lifecycle
            .lock()
            .context
            .as_ref()
            .and_then(|c| c.feature_level())
    }

    /// Process-wide live GL object counts.
    pub fn resource_stats(&self) -> ResourceStats {
        tracker().snapshot()
    }

    pub fn last_error(&self) -> Option<String> {
        self.shared.errors.get()
    }

    pub fn clear_last_error(&self) {
        self.shared.errors.clear();
    }

    // ── surface ids ───────────────────────────────────────────────────────

    /// Associates this engine with a host surface id.
    ///
    /// A surface that was announced for `id` before this call is claimed
    /// immediately, including its last known size.
    pub fn bind_surface_id(self: &Arc<Self>, id: SurfaceId) {
        let previous = self.surface_id.lock().replace(id);
        if let Some(old) = previous.filter(|&old| old != id) {
            surfaces().unbind(old, self);
        }
        surfaces().bind(id, self);
    }

    pub fn unbind_surface_id(&self) {
        if let Some(id) = self.surface_id.lock().take() {
            surfaces().unbind(id, self);
        }
    }

    pub fn surface_id(&self) -> Option<SurfaceId> {
        *self.surface_id.lock()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.unbind_surface_id();
        let mut life = self.lifecycle.lock();
        self.teardown_locked(&mut life);
    }
}
