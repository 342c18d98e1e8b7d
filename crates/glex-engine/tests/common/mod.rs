//! Common utilities for engine integration tests.
//!
//! `MockDriver` implements both driver traits in memory. It enforces the
//! exclusive context bind the way EGL does, counts GL calls made from threads
//! without a current context, and records enough of the GL stream for tests
//! to assert on clears, uniforms, draws and the sources behind each draw.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use raw_window_handle::{RawWindowHandle, WebWindowHandle};

use glex_engine::device::{
    Backend, ConfigHandle, ConfigProfile, ContextConfig, ContextHandle, DisplayHandle, DrawMode,
    FeatureLevel, Gl, GlString, NativeSurface, Platform, ShaderKind, SurfaceHandle,
};
use glex_engine::input::PointerEvent;
use glex_engine::logging::{init_logging, LoggingConfig};
use glex_engine::render::{RenderStage, StageCtx};

// ============================================================================
// Options
// ============================================================================

/// What the mock platform offers.
#[derive(Debug, Clone)]
pub struct MockOptions {
    pub display_available: bool,
    pub es3_config: bool,
    pub es2_config: bool,
    /// Highest context version `create_context` accepts.
    pub max_level: FeatureLevel,
    pub surface_size: (i32, i32),
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            display_available: true,
            es3_config: true,
            es2_config: true,
            max_level: FeatureLevel::ES_3_2,
            surface_size: (640, 480),
        }
    }
}

impl MockOptions {
    /// Device that only exposes a GLES2 config.
    pub fn es2_only() -> Self {
        Self {
            es3_config: false,
            max_level: FeatureLevel::ES_2_0,
            ..Self::default()
        }
    }
}

// ============================================================================
// Recorded state
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum GlCall {
    Viewport(i32, i32, i32, i32),
    ClearColor([f32; 4]),
    Clear,
    Uniform { program: u32, name: String, values: Vec<f32> },
    Draw { program: Option<u32>, count: i32 },
}

#[derive(Debug, Clone, Copy)]
struct ContextRec {
    level: FeatureLevel,
    owner: Option<ThreadId>,
}

#[derive(Default)]
struct State {
    contexts: HashMap<u64, ContextRec>,
    surfaces: Vec<u64>,
    current: HashMap<ThreadId, u64>,
    configs: HashMap<u64, ConfigProfile>,
    error: i32,

    shaders: HashMap<u32, (ShaderKind, String)>,
    programs: HashMap<u32, Vec<u32>>,
    /// (vertex, fragment) captured at link time.
    linked: HashMap<u32, (String, String)>,
    locations: HashMap<u32, (u32, String)>,
    bound_program: Option<u32>,
    calls: Vec<GlCall>,
    draws_sources: Vec<(String, String)>,
}

/// In-memory EGL + GLES driver.
pub struct MockDriver {
    opts: Mutex<MockOptions>,
    state: Mutex<State>,
    next_id: AtomicU64,
    fail_swaps: AtomicBool,
    swaps: AtomicU64,
    violations: AtomicU64,
    terminated: AtomicU64,
}

const EGL_BAD_ACCESS: i32 = 0x3002;
const EGL_BAD_MATCH: i32 = 0x3009;
const EGL_BAD_SURFACE: i32 = 0x300d;
const EGL_CONTEXT_LOST: i32 = 0x300e;

impl MockDriver {
    pub fn new(opts: MockOptions) -> Arc<Self> {
        init_logging(LoggingConfig {
            capture: true,
            ..LoggingConfig::default()
        });
        Arc::new(Self {
            opts: Mutex::new(opts),
            state: Mutex::new(State::default()),
            next_id: AtomicU64::new(1),
            fail_swaps: AtomicBool::new(false),
            swaps: AtomicU64::new(0),
            violations: AtomicU64::new(0),
            terminated: AtomicU64::new(0),
        })
    }

    pub fn backend(self: &Arc<Self>) -> Backend {
        Backend::new(self.clone(), self.clone())
    }

    fn id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn gl_name(&self) -> u32 {
        self.id() as u32
    }

    /// Counts GL calls from a thread without a current context.
    fn check_thread(&self) {
        if !self.state.lock().current.contains_key(&thread::current().id()) {
            self.violations.fetch_add(1, Ordering::Relaxed);
        }
    }

    // ── knobs ─────────────────────────────────────────────────────────────

    pub fn set_fail_swaps(&self, fail: bool) {
        self.fail_swaps.store(fail, Ordering::Release);
    }

    pub fn set_surface_size(&self, w: i32, h: i32) {
        self.opts.lock().surface_size = (w, h);
    }

    // ── inspection ────────────────────────────────────────────────────────

    pub fn swap_count(&self) -> u64 {
        self.swaps.load(Ordering::Acquire)
    }

    pub fn violations(&self) -> u64 {
        self.violations.load(Ordering::Acquire)
    }

    pub fn live_contexts(&self) -> usize {
        self.state.lock().contexts.len()
    }

    pub fn live_surfaces(&self) -> usize {
        self.state.lock().surfaces.len()
    }

    pub fn terminations(&self) -> u64 {
        self.terminated.load(Ordering::Acquire)
    }

    /// Thread currently holding any context, if one does.
    pub fn context_owner(&self) -> Option<ThreadId> {
        self.state.lock().contexts.values().find_map(|c| c.owner)
    }

    pub fn calls(&self) -> Vec<GlCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_colors(&self) -> Vec<[f32; 4]> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::ClearColor(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn viewports(&self) -> Vec<(i32, i32, i32, i32)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::Viewport(x, y, w, h) => Some((x, y, w, h)),
                _ => None,
            })
            .collect()
    }

    pub fn uniform_values(&self, name: &str) -> Vec<Vec<f32>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GlCall::Uniform { name: n, values, .. } if n == name => Some(values),
                _ => None,
            })
            .collect()
    }

    pub fn draw_count(&self) -> usize {
        self.state.lock().draws_sources.len()
    }

    /// Sources of the program bound at the most recent draw.
    pub fn last_drawn_sources(&self) -> Option<(String, String)> {
        self.state.lock().draws_sources.last().cloned()
    }

    pub fn compiled_sources(&self) -> Vec<String> {
        let mut v: Vec<_> = self
            .state
            .lock()
            .shaders
            .values()
            .map(|(_, s)| s.clone())
            .collect();
        v.sort();
        v
    }

    pub fn reset_calls(&self) {
        let mut s = self.state.lock();
        s.calls.clear();
        s.draws_sources.clear();
    }
}

// ============================================================================
// Platform
// ============================================================================

impl Platform for MockDriver {
    fn default_display(&self) -> Option<DisplayHandle> {
        self.opts
            .lock()
            .display_available
            .then(|| DisplayHandle(self.id()))
    }

    fn initialize_display(&self, _display: DisplayHandle) -> bool {
        true
    }

    fn choose_config(
        &self,
        _display: DisplayHandle,
        profile: ConfigProfile,
        _config: &ContextConfig,
    ) -> Option<ConfigHandle> {
        let opts = self.opts.lock();
        let offered = match profile {
            ConfigProfile::Es3 => opts.es3_config,
            ConfigProfile::Es2 => opts.es2_config,
        };
        if !offered {
            return None;
        }
        let id = self.id();
        self.state.lock().configs.insert(id, profile);
        Some(ConfigHandle(id))
    }

    fn create_window_surface(
        &self,
        _display: DisplayHandle,
        _config: ConfigHandle,
        _window: &NativeSurface,
    ) -> Option<SurfaceHandle> {
        let id = self.id();
        self.state.lock().surfaces.push(id);
        Some(SurfaceHandle(id))
    }

    fn create_context(
        &self,
        _display: DisplayHandle,
        config: ConfigHandle,
        level: FeatureLevel,
    ) -> Option<ContextHandle> {
        let max = self.opts.lock().max_level;
        let mut s = self.state.lock();
        let es2_config = s.configs.get(&config.0) == Some(&ConfigProfile::Es2);
        if level > max || (es2_config && level > FeatureLevel::ES_2_0) {
            s.error = EGL_BAD_MATCH;
            return None;
        }
        let id = self.id();
        s.contexts.insert(id, ContextRec { level, owner: None });
        Some(ContextHandle(id))
    }

    fn make_current(
        &self,
        _display: DisplayHandle,
        target: Option<(SurfaceHandle, ContextHandle)>,
    ) -> bool {
        let me = thread::current().id();
        let mut guard = self.state.lock();
        let s = &mut *guard;

        let Some((surface, context)) = target else {
            if let Some(prev) = s.current.remove(&me) {
                if let Some(rec) = s.contexts.get_mut(&prev) {
                    rec.owner = None;
                }
            }
            return true;
        };

        if !s.surfaces.contains(&surface.0) {
            s.error = EGL_BAD_SURFACE;
            return false;
        }
        let owner = s.contexts.get(&context.0).map(|rec| rec.owner);
        match owner {
            None => {
                s.error = EGL_BAD_MATCH;
                return false;
            }
            Some(Some(o)) if o != me => {
                s.error = EGL_BAD_ACCESS;
                return false;
            }
            Some(_) => {}
        }

        if let Some(prev) = s.current.insert(me, context.0) {
            if let Some(rec) = s.contexts.get_mut(&prev) {
                rec.owner = None;
            }
        }
        if let Some(rec) = s.contexts.get_mut(&context.0) {
            rec.owner = Some(me);
        }
        true
    }

    fn query_surface_size(
        &self,
        _display: DisplayHandle,
        _surface: SurfaceHandle,
    ) -> Option<(i32, i32)> {
        Some(self.opts.lock().surface_size)
    }

    fn set_swap_interval(&self, _display: DisplayHandle, _interval: i32) -> bool {
        true
    }

    fn swap_buffers(&self, _display: DisplayHandle, surface: SurfaceHandle) -> bool {
        if self.fail_swaps.load(Ordering::Acquire) {
            self.state.lock().error = EGL_CONTEXT_LOST;
            return false;
        }
        let me = thread::current().id();
        let s = self.state.lock();
        if !s.surfaces.contains(&surface.0) || !s.current.contains_key(&me) {
            drop(s);
            self.violations.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        drop(s);
        self.swaps.fetch_add(1, Ordering::AcqRel);
        true
    }

    fn destroy_context(&self, _display: DisplayHandle, context: ContextHandle) {
        let mut s = self.state.lock();
        s.contexts.remove(&context.0);
        s.current.retain(|_, c| *c != context.0);
    }

    fn destroy_surface(&self, _display: DisplayHandle, surface: SurfaceHandle) {
        self.state.lock().surfaces.retain(|&id| id != surface.0);
    }

    fn terminate(&self, _display: DisplayHandle) {
        self.terminated.fetch_add(1, Ordering::AcqRel);
    }

    fn error_code(&self) -> i32 {
        self.state.lock().error
    }
}

// ============================================================================
// Gl
// ============================================================================

impl Gl for MockDriver {
    fn get_string(&self, name: GlString) -> Option<String> {
        self.check_thread();
        let me = thread::current().id();
        let s = self.state.lock();
        let level = s
            .current
            .get(&me)
            .and_then(|c| s.contexts.get(c))
            .map(|rec| rec.level)?;
        Some(match name {
            GlString::Vendor => "glex-mock".into(),
            GlString::Renderer => "Mock Renderer".into(),
            GlString::Version => format!("OpenGL ES {level} mock"),
            GlString::ShadingLanguageVersion => "OpenGL ES GLSL ES 3.00".into(),
        })
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        self.check_thread();
        self.state.lock().calls.push(GlCall::Viewport(x, y, width, height));
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        self.check_thread();
        self.state.lock().calls.push(GlCall::ClearColor([r, g, b, a]));
    }

    fn clear(&self) {
        self.check_thread();
        self.state.lock().calls.push(GlCall::Clear);
    }

    fn create_shader(&self, kind: ShaderKind) -> Option<u32> {
        self.check_thread();
        let name = self.gl_name();
        self.state.lock().shaders.insert(name, (kind, String::new()));
        Some(name)
    }

    fn shader_source(&self, shader: u32, source: &str) {
        self.check_thread();
        if let Some(entry) = self.state.lock().shaders.get_mut(&shader) {
            entry.1 = source.to_owned();
        }
    }

    fn compile_shader(&self, shader: u32) -> Result<(), String> {
        self.check_thread();
        let s = self.state.lock();
        match s.shaders.get(&shader) {
            Some((_, src)) if src.contains("#error") => Err("0:1: '#error' : forced failure".into()),
            Some(_) => Ok(()),
            None => Err("no such shader".into()),
        }
    }

    fn delete_shader(&self, shader: u32) {
        self.check_thread();
        self.state.lock().shaders.remove(&shader);
    }

    fn create_program(&self) -> Option<u32> {
        self.check_thread();
        let name = self.gl_name();
        self.state.lock().programs.insert(name, Vec::new());
        Some(name)
    }

    fn attach_shader(&self, program: u32, shader: u32) {
        self.check_thread();
        if let Some(list) = self.state.lock().programs.get_mut(&program) {
            list.push(shader);
        }
    }

    fn link_program(&self, program: u32) -> Result<(), String> {
        self.check_thread();
        let mut s = self.state.lock();
        let attached = s.programs.get(&program).cloned().unwrap_or_default();
        let mut vertex = None;
        let mut fragment = None;
        for sh in attached {
            match s.shaders.get(&sh) {
                Some((ShaderKind::Vertex, src)) => vertex = Some(src.clone()),
                Some((ShaderKind::Fragment, src)) => fragment = Some(src.clone()),
                None => {}
            }
        }
        match (vertex, fragment) {
            (Some(v), Some(f)) => {
                s.linked.insert(program, (v, f));
                Ok(())
            }
            _ => Err("program needs a vertex and a fragment shader".into()),
        }
    }

    fn delete_program(&self, program: u32) {
        self.check_thread();
        let mut s = self.state.lock();
        s.programs.remove(&program);
        s.linked.remove(&program);
        if s.bound_program == Some(program) {
            s.bound_program = None;
        }
    }

    fn use_program(&self, program: Option<u32>) {
        self.check_thread();
        self.state.lock().bound_program = program;
    }

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32> {
        self.check_thread();
        let loc = self.gl_name();
        let mut s = self.state.lock();
        if !s.linked.contains_key(&program) {
            return None;
        }
        s.locations.insert(loc, (program, name.to_owned()));
        Some(loc)
    }

    fn attrib_location(&self, _program: u32, _name: &str) -> Option<u32> {
        self.check_thread();
        Some(0)
    }

    fn uniform_1i(&self, location: u32, v: i32) {
        self.record_uniform(location, vec![v as f32]);
    }

    fn uniform_1f(&self, location: u32, v: f32) {
        self.record_uniform(location, vec![v]);
    }

    fn uniform_2f(&self, location: u32, x: f32, y: f32) {
        self.record_uniform(location, vec![x, y]);
    }

    fn uniform_3f(&self, location: u32, x: f32, y: f32, z: f32) {
        self.record_uniform(location, vec![x, y, z]);
    }

    fn uniform_4f(&self, location: u32, x: f32, y: f32, z: f32, w: f32) {
        self.record_uniform(location, vec![x, y, z, w]);
    }

    fn uniform_matrix_4fv(&self, location: u32, _transpose: bool, value: &[f32; 16]) {
        self.record_uniform(location, value.to_vec());
    }

    fn create_buffer(&self) -> Option<u32> {
        self.check_thread();
        Some(self.gl_name())
    }

    fn delete_buffer(&self, _buffer: u32) {
        self.check_thread();
    }

    fn bind_array_buffer(&self, _buffer: Option<u32>) {
        self.check_thread();
    }

    fn array_buffer_data(&self, _data: &[u8]) {
        self.check_thread();
    }

    fn create_vertex_array(&self) -> Option<u32> {
        self.check_thread();
        Some(self.gl_name())
    }

    fn delete_vertex_array(&self, _vao: u32) {
        self.check_thread();
    }

    fn bind_vertex_array(&self, _vao: Option<u32>) {
        self.check_thread();
    }

    fn enable_vertex_attrib_array(&self, _index: u32) {
        self.check_thread();
    }

    fn vertex_attrib_pointer_f32(&self, _index: u32, _size: i32, _stride: i32, _offset: i32) {
        self.check_thread();
    }

    fn draw_arrays(&self, _mode: DrawMode, _first: i32, count: i32) {
        self.check_thread();
        let mut s = self.state.lock();
        let program = s.bound_program;
        s.calls.push(GlCall::Draw { program, count });
        let sources = program.and_then(|p| s.linked.get(&p).cloned());
        if let Some(src) = sources {
            s.draws_sources.push(src);
        }
    }
}

impl MockDriver {
    fn record_uniform(&self, location: u32, values: Vec<f32>) {
        self.check_thread();
        let mut s = self.state.lock();
        if let Some((program, name)) = s.locations.get(&location).cloned() {
            s.calls.push(GlCall::Uniform { program, name, values });
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

pub fn surface() -> NativeSurface {
    NativeSurface::new(RawWindowHandle::Web(WebWindowHandle::new(1)))
}

/// Polls `cond` until it holds or `timeout` elapses.
pub fn wait_until(timeout: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    cond()
}

pub const WAIT: Duration = Duration::from_secs(5);

/// Shared event journal for [`RecordingStage`].
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == entry).count()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

/// Stage that journals every hook as `"<name>:<event>"`.
pub struct RecordingStage {
    pub name: String,
    pub journal: Journal,
    pub required: FeatureLevel,
    pub fail_init: bool,
}

impl RecordingStage {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_owned(),
            journal: journal.clone(),
            required: FeatureLevel::ES_2_0,
            fail_init: false,
        }
    }

    pub fn boxed(name: &str, journal: &Journal) -> Box<dyn RenderStage> {
        Box::new(Self::new(name, journal))
    }

    fn log(&self, event: impl AsRef<str>) {
        self.journal.push(format!("{}:{}", self.name, event.as_ref()));
    }
}

impl RenderStage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_level(&self) -> FeatureLevel {
        self.required
    }

    fn on_initialize(&mut self, _ctx: &StageCtx<'_>, width: i32, height: i32) -> anyhow::Result<()> {
        if self.fail_init {
            anyhow::bail!("{} refused to initialize", self.name);
        }
        self.log(format!("init {width}x{height}"));
        Ok(())
    }

    fn on_resize(&mut self, _ctx: &StageCtx<'_>, width: i32, height: i32) {
        self.log(format!("resize {width}x{height}"));
    }

    fn on_update(&mut self, _ctx: &StageCtx<'_>, _dt: f32) {
        self.log("update");
    }

    fn on_render(&mut self, _ctx: &StageCtx<'_>, _width: i32, _height: i32) {
        self.log("render");
    }

    fn on_pointer(&mut self, _ctx: &StageCtx<'_>, event: &PointerEvent) {
        self.log(format!("pointer {} {} seq {}", event.action, event.pointer_id, event.seq));
    }

    fn on_destroy(&mut self, _ctx: &StageCtx<'_>) {
        self.log("destroy");
    }
}
