use std::num::NonZeroU32;

use glow::HasContext;

use super::{DrawMode, Gl, GlString, ShaderKind};

/// [`Gl`] implementation backed by a `glow::Context`.
///
/// The host creates the `glow::Context` with its EGL loader; every call goes
/// to whatever context is current on the calling thread.
pub struct GlowGl {
    gl: glow::Context,
}

// SAFETY: glow::Context is a table of function pointers. GL itself enforces
// nothing across threads; the engine only calls through this on the thread
// holding the context bind.
unsafe impl Send for GlowGl {}
unsafe impl Sync for GlowGl {}

impl GlowGl {
    pub fn new(gl: glow::Context) -> Self {
        Self { gl }
    }
}

fn name(raw: u32) -> Option<NonZeroU32> {
    NonZeroU32::new(raw)
}

fn shader(raw: u32) -> Option<glow::NativeShader> {
    name(raw).map(glow::NativeShader)
}

fn program(raw: u32) -> Option<glow::NativeProgram> {
    name(raw).map(glow::NativeProgram)
}

fn buffer(raw: u32) -> Option<glow::NativeBuffer> {
    name(raw).map(glow::NativeBuffer)
}

fn vertex_array(raw: u32) -> Option<glow::NativeVertexArray> {
    name(raw).map(glow::NativeVertexArray)
}

fn location(raw: u32) -> glow::NativeUniformLocation {
    glow::NativeUniformLocation(raw)
}

impl Gl for GlowGl {
    fn get_string(&self, name: GlString) -> Option<String> {
        let param = match name {
            GlString::Vendor => glow::VENDOR,
            GlString::Renderer => glow::RENDERER,
            GlString::Version => glow::VERSION,
            GlString::ShadingLanguageVersion => glow::SHADING_LANGUAGE_VERSION,
        };
        let s = unsafe { self.gl.get_parameter_string(param) };
        (!s.is_empty()).then_some(s)
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) }
    }

    fn clear_color(&self, r: f32, g: f32, b: f32, a: f32) {
        unsafe { self.gl.clear_color(r, g, b, a) }
    }

    fn clear(&self) {
        unsafe { self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT) }
    }

    // ── shaders & programs ────────────────────────────────────────────────

    fn create_shader(&self, kind: ShaderKind) -> Option<u32> {
        let ty = match kind {
            ShaderKind::Vertex => glow::VERTEX_SHADER,
            ShaderKind::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe { self.gl.create_shader(ty) }.ok().map(|s| s.0.get())
    }

    fn shader_source(&self, raw: u32, source: &str) {
        if let Some(s) = shader(raw) {
            unsafe { self.gl.shader_source(s, source) }
        }
    }

    fn compile_shader(&self, raw: u32) -> Result<(), String> {
        let s = shader(raw).ok_or_else(|| "invalid shader name".to_string())?;
        unsafe {
            self.gl.compile_shader(s);
            if self.gl.get_shader_compile_status(s) {
                Ok(())
            } else {
                Err(self.gl.get_shader_info_log(s))
            }
        }
    }

    fn delete_shader(&self, raw: u32) {
        if let Some(s) = shader(raw) {
            unsafe { self.gl.delete_shader(s) }
        }
    }

    fn create_program(&self) -> Option<u32> {
        unsafe { self.gl.create_program() }.ok().map(|p| p.0.get())
    }

    fn attach_shader(&self, prog: u32, sh: u32) {
        if let (Some(p), Some(s)) = (program(prog), shader(sh)) {
            unsafe { self.gl.attach_shader(p, s) }
        }
    }

    fn link_program(&self, raw: u32) -> Result<(), String> {
        let p = program(raw).ok_or_else(|| "invalid program name".to_string())?;
        unsafe {
            self.gl.link_program(p);
            if self.gl.get_program_link_status(p) {
                Ok(())
            } else {
                Err(self.gl.get_program_info_log(p))
            }
        }
    }

    fn delete_program(&self, raw: u32) {
        if let Some(p) = program(raw) {
            unsafe { self.gl.delete_program(p) }
        }
    }

    fn use_program(&self, raw: Option<u32>) {
        unsafe { self.gl.use_program(raw.and_then(program)) }
    }

    // ── uniforms & attributes ─────────────────────────────────────────────

    fn uniform_location(&self, prog: u32, name: &str) -> Option<u32> {
        let p = program(prog)?;
        unsafe { self.gl.get_uniform_location(p, name) }.map(|l| l.0)
    }

    fn attrib_location(&self, prog: u32, name: &str) -> Option<u32> {
        let p = program(prog)?;
        unsafe { self.gl.get_attrib_location(p, name) }
    }

    fn uniform_1i(&self, loc: u32, v: i32) {
        unsafe { self.gl.uniform_1_i32(Some(&location(loc)), v) }
    }

    fn uniform_1f(&self, loc: u32, v: f32) {
        unsafe { self.gl.uniform_1_f32(Some(&location(loc)), v) }
    }

    fn uniform_2f(&self, loc: u32, x: f32, y: f32) {
        unsafe { self.gl.uniform_2_f32(Some(&location(loc)), x, y) }
    }

    fn uniform_3f(&self, loc: u32, x: f32, y: f32, z: f32) {
        unsafe { self.gl.uniform_3_f32(Some(&location(loc)), x, y, z) }
    }

    fn uniform_4f(&self, loc: u32, x: f32, y: f32, z: f32, w: f32) {
        unsafe { self.gl.uniform_4_f32(Some(&location(loc)), x, y, z, w) }
    }

    fn uniform_matrix_4fv(&self, loc: u32, transpose: bool, value: &[f32; 16]) {
        unsafe {
            self.gl
                .uniform_matrix_4_f32_slice(Some(&location(loc)), transpose, value)
        }
    }

    // ── buffers & vertex arrays ───────────────────────────────────────────

    fn create_buffer(&self) -> Option<u32> {
        unsafe { self.gl.create_buffer() }.ok().map(|b| b.0.get())
    }

    fn delete_buffer(&self, raw: u32) {
        if let Some(b) = buffer(raw) {
            unsafe { self.gl.delete_buffer(b) }
        }
    }

    fn bind_array_buffer(&self, raw: Option<u32>) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, raw.and_then(buffer)) }
    }

    fn array_buffer_data(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        }
    }

    fn create_vertex_array(&self) -> Option<u32> {
        unsafe { self.gl.create_vertex_array() }.ok().map(|v| v.0.get())
    }

    fn delete_vertex_array(&self, raw: u32) {
        if let Some(v) = vertex_array(raw) {
            unsafe { self.gl.delete_vertex_array(v) }
        }
    }

    fn bind_vertex_array(&self, raw: Option<u32>) {
        unsafe { self.gl.bind_vertex_array(raw.and_then(vertex_array)) }
    }

    fn enable_vertex_attrib_array(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) }
    }

    fn vertex_attrib_pointer_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, glow::FLOAT, false, stride, offset)
        }
    }

    fn draw_arrays(&self, mode: DrawMode, first: i32, count: i32) {
        let mode = match mode {
            DrawMode::Triangles => glow::TRIANGLES,
            DrawMode::TriangleStrip => glow::TRIANGLE_STRIP,
        };
        unsafe { self.gl.draw_arrays(mode, first, count) }
    }
}
