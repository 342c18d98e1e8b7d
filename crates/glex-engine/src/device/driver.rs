use std::fmt;
use std::sync::Arc;

use super::{ContextConfig, NativeSurface};

// ── handles ───────────────────────────────────────────────────────────────

macro_rules! native_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub const fn raw(self) -> u64 {
                self.0
            }
        }
    };
}

native_handle!(
    /// Opaque display connection (EGLDisplay).
    DisplayHandle
);
native_handle!(
    /// Opaque framebuffer configuration (EGLConfig).
    ConfigHandle
);
native_handle!(
    /// Opaque window surface (EGLSurface).
    SurfaceHandle
);
native_handle!(
    /// Opaque rendering context (EGLContext).
    ContextHandle
);

// ── feature levels ────────────────────────────────────────────────────────

/// Negotiated GLES version.
///
/// Ordering compares `major` first, then `minor`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureLevel {
    pub major: u8,
    pub minor: u8,
}

impl FeatureLevel {
    pub const ES_2_0: FeatureLevel = FeatureLevel::new(2, 0);
    pub const ES_3_0: FeatureLevel = FeatureLevel::new(3, 0);
    pub const ES_3_2: FeatureLevel = FeatureLevel::new(3, 2);

    /// Context versions tried during negotiation, best first.
    pub const NEGOTIATION_ORDER: [FeatureLevel; 3] = [Self::ES_3_2, Self::ES_3_0, Self::ES_2_0];

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Parses a `GL_VERSION` string.
    ///
    /// Accepts the GLES form (`"OpenGL ES 3.2 v1.r32p1"`) as well as a bare
    /// `"major.minor[.patch] ..."` prefix.
    pub fn parse_version(version: &str) -> Option<Self> {
        let rest = version.trim();
        let rest = match rest.strip_prefix("OpenGL ES") {
            // "OpenGL ES-CM 1.1" style profiles carry a suffix before the number.
            Some(tail) => tail.trim_start_matches(|c: char| c != ' ').trim_start(),
            None => rest,
        };

        let number = rest.split_whitespace().next()?;
        let mut parts = number.split('.');
        let major = leading_digits(parts.next()?)?;
        let minor = parts.next().and_then(leading_digits).unwrap_or(0);
        Some(Self::new(major, minor))
    }

    /// True when this level supports GLSL ES 3.00 shaders and VAOs.
    pub fn supports_es3(self) -> bool {
        self >= Self::ES_3_0
    }
}

fn leading_digits(s: &str) -> Option<u8> {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s[..end].parse().ok()
}

impl fmt::Display for FeatureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Framebuffer configuration family requested from the platform.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConfigProfile {
    /// Renderable with GLES 3.x contexts.
    Es3,
    /// Renderable with GLES 2.0 contexts only.
    Es2,
}

impl ConfigProfile {
    /// Profiles tried during config selection, best first.
    pub const SELECTION_ORDER: [ConfigProfile; 2] = [Self::Es3, Self::Es2];
}

// ── GL enums ──────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShaderKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// `glGetString` names.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GlString {
    Vendor,
    Renderer,
    Version,
    ShadingLanguageVersion,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawMode {
    Triangles,
    TriangleStrip,
}

// ── driver traits ─────────────────────────────────────────────────────────

/// Native display/surface/context entry points (EGL shaped).
///
/// All methods report failure through their return value; `error_code`
/// returns the platform's last error for diagnostics. Implementations must be
/// callable from any thread; `make_current` affects the calling thread only.
pub trait Platform: Send + Sync {
    fn default_display(&self) -> Option<DisplayHandle>;
    fn initialize_display(&self, display: DisplayHandle) -> bool;
    fn choose_config(
        &self,
        display: DisplayHandle,
        profile: ConfigProfile,
        config: &ContextConfig,
    ) -> Option<ConfigHandle>;
    fn create_window_surface(
        &self,
        display: DisplayHandle,
        config: ConfigHandle,
        window: &NativeSurface,
    ) -> Option<SurfaceHandle>;
    fn create_context(
        &self,
        display: DisplayHandle,
        config: ConfigHandle,
        level: FeatureLevel,
    ) -> Option<ContextHandle>;

    /// Binds `target` to the calling thread, or releases the calling thread's
    /// current context when `target` is `None`.
    fn make_current(
        &self,
        display: DisplayHandle,
        target: Option<(SurfaceHandle, ContextHandle)>,
    ) -> bool;

    fn query_surface_size(&self, display: DisplayHandle, surface: SurfaceHandle)
        -> Option<(i32, i32)>;
    fn set_swap_interval(&self, display: DisplayHandle, interval: i32) -> bool;
    fn swap_buffers(&self, display: DisplayHandle, surface: SurfaceHandle) -> bool;
    fn destroy_context(&self, display: DisplayHandle, context: ContextHandle);
    fn destroy_surface(&self, display: DisplayHandle, surface: SurfaceHandle);
    fn terminate(&self, display: DisplayHandle);
    fn error_code(&self) -> i32;
}

/// GLES entry points used by the core.
///
/// Object names are raw GL names; creation returns `None` on failure.
/// Calls act on whatever context is current on the calling thread.
pub trait Gl: Send + Sync {
    fn get_string(&self, name: GlString) -> Option<String>;

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32);
    /// Clears color and depth.
    fn clear(&self);

    fn create_shader(&self, kind: ShaderKind) -> Option<u32>;
    fn shader_source(&self, shader: u32, source: &str);
    /// Returns the info log on failure.
    fn compile_shader(&self, shader: u32) -> Result<(), String>;
    fn delete_shader(&self, shader: u32);

    fn create_program(&self) -> Option<u32>;
    fn attach_shader(&self, program: u32, shader: u32);
    /// Returns the info log on failure.
    fn link_program(&self, program: u32) -> Result<(), String>;
    fn delete_program(&self, program: u32);
    fn use_program(&self, program: Option<u32>);

    fn uniform_location(&self, program: u32, name: &str) -> Option<u32>;
    fn attrib_location(&self, program: u32, name: &str) -> Option<u32>;
    fn uniform_1i(&self, location: u32, v: i32);
    fn uniform_1f(&self, location: u32, v: f32);
    fn uniform_2f(&self, location: u32, x: f32, y: f32);
    fn uniform_3f(&self, location: u32, x: f32, y: f32, z: f32);
    fn uniform_4f(&self, location: u32, x: f32, y: f32, z: f32, w: f32);
    fn uniform_matrix_4fv(&self, location: u32, transpose: bool, value: &[f32; 16]);

    fn create_buffer(&self) -> Option<u32>;
    fn delete_buffer(&self, buffer: u32);
    fn bind_array_buffer(&self, buffer: Option<u32>);
    /// Uploads `data` into the bound array buffer with static usage.
    fn array_buffer_data(&self, data: &[u8]);

    fn create_vertex_array(&self) -> Option<u32>;
    fn delete_vertex_array(&self, vao: u32);
    fn bind_vertex_array(&self, vao: Option<u32>);
    fn enable_vertex_attrib_array(&self, index: u32);
    /// Float attribute of `size` components; `stride`/`offset` in bytes.
    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32);

    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32);
}

/// Driver pair shared by every component of an engine.
#[derive(Clone)]
pub struct Backend {
    pub platform: Arc<dyn Platform>,
    pub gl: Arc<dyn Gl>,
}

impl Backend {
    pub fn new(platform: Arc<dyn Platform>, gl: Arc<dyn Gl>) -> Self {
        Self { platform, gl }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
