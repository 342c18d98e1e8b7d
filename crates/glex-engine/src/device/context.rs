use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::thread::{self, ThreadId};

use parking_lot::Mutex;

use super::{
    Backend, ConfigProfile, ContextConfig, ContextHandle, DisplayHandle,
    FeatureLevel, Gl, GlString, NativeSurface, Platform, SurfaceHandle,
};
use crate::error::{EngineError, EngineResult};

/// Strings captured while the context was first bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlInfo {
    pub version: String,
    pub renderer: String,
    pub vendor: String,
    pub feature_level: FeatureLevel,
}

#[derive(Debug, Copy, Clone)]
struct Handles {
    display: DisplayHandle,
    surface: SurfaceHandle,
    context: ContextHandle,
}

#[derive(Default)]
struct State {
    handles: Option<Handles>,
    bound_to: Option<ThreadId>,
    info: Option<GlInfo>,
}

/// Owns the display/surface/context triple for one host surface.
///
/// This type is the low-level GL context:
/// - negotiates a config (ES3, then ES2) and a context version (3.2, 3.0, 2.0)
/// - binds/unbinds the context to the calling thread on request only
/// - presents frames via `swap_buffers`
///
/// All methods take `&self` so the context can be shared between the caller
/// thread and the render thread. Only the thread currently holding the bind
/// may issue GL calls.
pub struct GraphicsContext {
    platform: Arc<dyn Platform>,
    gl: Arc<dyn Gl>,
    state: Mutex<State>,
    initialized: AtomicBool,
    width: AtomicI32,
    height: AtomicI32,
}

impl GraphicsContext {
    pub fn new(backend: Backend) -> Self {
        Self {
            platform: backend.platform,
            gl: backend.gl,
            state: Mutex::new(State::default()),
            initialized: AtomicBool::new(false),
            width: AtomicI32::new(0),
            height: AtomicI32::new(0),
        }
    }

    /// GL entry points for the thread holding the bind.
    pub fn gl(&self) -> &Arc<dyn Gl> {
        &self.gl
    }

    /// Creates the context for `window` and leaves it bound to the calling thread.
    ///
    /// Calling this again while initialized is a no-op. On failure every
    /// partially created native object is released.
    pub fn initialize(&self, window: &NativeSurface, config: &ContextConfig) -> EngineResult<()> {
        let mut state = self.state.lock();
        if state.handles.is_some() {
            log::debug!("graphics context already initialized");
            return Ok(());
        }

        let mut partial = Partial::new(&*self.platform);
        let (handles, created_level) = partial.negotiate(window, config)?;

        if !self
            .platform
            .make_current(handles.display, Some((handles.surface, handles.context)))
        {
            return Err(EngineError::ContextNegotiation(format!(
                "initial make current failed (0x{:04x})",
                self.platform.error_code()
            )));
        }
        partial.disarm();

        let version = self.gl.get_string(GlString::Version).unwrap_or_default();
        let feature_level = match FeatureLevel::parse_version(&version) {
            Some(level) => level,
            None => {
                log::warn!("unparsable GL_VERSION {version:?}; assuming {created_level}");
                created_level
            }
        };
        let info = GlInfo {
            renderer: self.gl.get_string(GlString::Renderer).unwrap_or_default(),
            vendor: self.gl.get_string(GlString::Vendor).unwrap_or_default(),
            version,
            feature_level,
        };

        let (w, h) = self
            .platform
            .query_surface_size(handles.display, handles.surface)
            .unwrap_or((0, 0));
        self.width.store(w, Ordering::Release);
        self.height.store(h, Ordering::Release);

        if !self
            .platform
            .set_swap_interval(handles.display, config.swap_interval())
        {
            log::warn!("swap interval {} rejected", config.swap_interval());
        }

        log::info!(
            "GL context ready: {} / {} (level {}), {w}x{h}",
            info.version,
            info.renderer,
            info.feature_level
        );

        state.handles = Some(handles);
        state.bound_to = Some(thread::current().id());
        state.info = Some(info);
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Binds the context to the calling thread.
    ///
    /// Fails if the context is not initialized or is still bound to another
    /// thread (it must be unbound there first).
    pub fn bind_to_current_thread(&self) -> EngineResult<()> {
        let mut state = self.state.lock();
        let handles = state
            .handles
            .ok_or_else(|| EngineError::precondition("bind on uninitialized context"))?;

        let me = thread::current().id();
        match state.bound_to {
            Some(owner) if owner == me => return Ok(()),
            Some(owner) => {
                return Err(EngineError::precondition(format!(
                    "context still bound to {owner:?}"
                )));
            }
            None => {}
        }

        if !self
            .platform
            .make_current(handles.display, Some((handles.surface, handles.context)))
        {
            return Err(EngineError::precondition(format!(
                "make current failed (0x{:04x})",
                self.platform.error_code()
            )));
        }

        state.bound_to = Some(me);
        log::trace!("context bound to {me:?}");
        Ok(())
    }

    /// Releases the bind held by the calling thread.
    ///
    /// Returns `false` (and does nothing) if the calling thread does not hold it.
    pub fn unbind_from_current_thread(&self) -> bool {
        let mut state = self.state.lock();
        let me = thread::current().id();
        let Some(handles) = state.handles else {
            return false;
        };
        if state.bound_to != Some(me) {
            return false;
        }

        if !self.platform.make_current(handles.display, None) {
            log::warn!("release current failed (0x{:04x})", self.platform.error_code());
        }
        state.bound_to = None;
        log::trace!("context unbound from {me:?}");
        true
    }

    pub fn is_bound_to_current_thread(&self) -> bool {
        self.state.lock().bound_to == Some(thread::current().id())
    }

    /// Presents the back buffer.
    pub fn swap_buffers(&self) -> EngineResult<()> {
        let handles = self
            .state
            .lock()
            .handles
            .ok_or_else(|| EngineError::precondition("swap on uninitialized context"))?;

        if self.platform.swap_buffers(handles.display, handles.surface) {
            Ok(())
        } else {
            Err(EngineError::SwapFailed(self.platform.error_code()))
        }
    }

    /// Changes the swap interval; the calling thread must hold the bind.
    pub fn set_vsync(&self, enabled: bool) -> EngineResult<()> {
        let state = self.state.lock();
        let handles = state
            .handles
            .ok_or_else(|| EngineError::precondition("vsync on uninitialized context"))?;
        if state.bound_to != Some(thread::current().id()) {
            return Err(EngineError::precondition("vsync requires the context bind"));
        }
        if self.platform.set_swap_interval(handles.display, i32::from(enabled)) {
            Ok(())
        } else {
            Err(EngineError::precondition(format!(
                "swap interval rejected (0x{:04x})",
                self.platform.error_code()
            )))
        }
    }

    /// Releases all native objects. Safe to call repeatedly.
    pub fn destroy(&self) {
        let mut state = self.state.lock();
        let Some(h) = state.handles.take() else {
            return;
        };

        if state.bound_to.take().is_some_and(|t| t != thread::current().id()) {
            log::warn!("destroying a context still bound to another thread");
        }

        self.platform.make_current(h.display, None);
        self.platform.destroy_context(h.display, h.context);
        self.platform.destroy_surface(h.display, h.surface);
        self.platform.terminate(h.display);

        state.info = None;
        self.initialized.store(false, Ordering::Release);
        self.width.store(0, Ordering::Release);
        self.height.store(0, Ordering::Release);
        log::info!("graphics context destroyed");
    }

    // ── queries ───────────────────────────────────────────────────────────

    pub fn size(&self) -> (i32, i32) {
        (
            self.width.load(Ordering::Acquire),
            self.height.load(Ordering::Acquire),
        )
    }

    /// Records the drawable size after a host resize.
    pub fn set_surface_size(&self, width: i32, height: i32) {
        self.width.store(width, Ordering::Release);
        self.height.store(height, Ordering::Release);
    }

    pub fn info(&self) -> Option<GlInfo> {
        self.state.lock().info.clone()
    }

    pub fn feature_level(&self) -> Option<FeatureLevel> {
        self.state.lock().info.as_ref().map(|i| i.feature_level)
    }

    pub fn version(&self) -> Option<String> {
        self.state.lock().info.as_ref().map(|i| i.version.clone())
    }

    pub fn renderer(&self) -> Option<String> {
        self.state.lock().info.as_ref().map(|i| i.renderer.clone())
    }
}

impl Drop for GraphicsContext {
    fn drop(&mut self) {
        self.destroy();
    }
}

// ── negotiation ───────────────────────────────────────────────────────────

/// Native objects created so far during `initialize`; released on drop unless
/// disarmed.
struct Partial<'p> {
    platform: &'p dyn Platform,
    display: Option<DisplayHandle>,
    surface: Option<SurfaceHandle>,
    context: Option<ContextHandle>,
}

impl<'p> Partial<'p> {
    fn new(platform: &'p dyn Platform) -> Self {
        Self {
            platform,
            display: None,
            surface: None,
            context: None,
        }
    }

    fn fail(&self, what: &str) -> EngineError {
        let msg = format!("{what} (0x{:04x})", self.platform.error_code());
        log::error!("context negotiation: {msg}");
        EngineError::ContextNegotiation(msg)
    }

    fn negotiate(
        &mut self,
        window: &NativeSurface,
        config: &ContextConfig,
    ) -> EngineResult<(Handles, FeatureLevel)> {
        let p = self.platform;

        let display = p
            .default_display()
            .ok_or_else(|| self.fail("no default display"))?;
        if !p.initialize_display(display) {
            return Err(self.fail("display initialization failed"));
        }
        self.display = Some(display);

        let (profile, chosen) = ConfigProfile::SELECTION_ORDER
            .into_iter()
            .find_map(|profile| p.choose_config(display, profile, config).map(|c| (profile, c)))
            .ok_or_else(|| self.fail("no matching framebuffer config"))?;
        if profile != ConfigProfile::Es3 {
            log::warn!("ES3 config unavailable; falling back to {profile:?}");
        }

        let surface = p
            .create_window_surface(display, chosen, window)
            .ok_or_else(|| self.fail("window surface creation failed"))?;
        self.surface = Some(surface);

        let (level, context) = FeatureLevel::NEGOTIATION_ORDER
            .into_iter()
            .find_map(|level| p.create_context(display, chosen, level).map(|c| (level, c)))
            .ok_or_else(|| self.fail("no context version accepted"))?;
        self.context = Some(context);
        if level != FeatureLevel::ES_3_2 {
            log::warn!("context created at level {level}");
        }

        Ok((
            Handles {
                display,
                surface,
                context,
            },
            level,
        ))
    }

    fn disarm(&mut self) {
        self.display = None;
        self.surface = None;
        self.context = None;
    }
}

impl Drop for Partial<'_> {
    fn drop(&mut self) {
        let Some(display) = self.display else {
            return;
        };
        if let Some(context) = self.context.take() {
            self.platform.destroy_context(display, context);
        }
        if let Some(surface) = self.surface.take() {
            self.platform.destroy_surface(display, surface);
        }
        self.platform.terminate(display);
    }
}
