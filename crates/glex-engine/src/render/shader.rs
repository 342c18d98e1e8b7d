use std::collections::HashMap;

use crate::device::{Gl, ShaderKind};
use crate::error::{EngineError, EngineResult};
use crate::resources::{tracker, ResourceKind};

use super::UniformValue;

/// Vertex + fragment source pair.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: vertex.into(),
            fragment: fragment.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.vertex.is_empty() && self.fragment.is_empty()
    }
}

/// A linked GL program with a uniform-location cache.
///
/// Every call takes the `Gl` of the thread holding the context bind. The
/// program must be released with [`destroy`](Self::destroy) on that thread;
/// dropping a live program leaks it.
#[derive(Debug, Default)]
pub struct ShaderProgram {
    program: Option<u32>,
    locations: HashMap<String, Option<u32>>,
}

impl ShaderProgram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and links `sources`, replacing any previous program.
    ///
    /// On failure the previous program is already gone and `is_valid` is false.
    pub fn build(&mut self, gl: &dyn Gl, sources: &ShaderSources) -> EngineResult<()> {
        self.destroy(gl);

        let vs = compile(gl, ShaderKind::Vertex, &sources.vertex)?;
        let fs = match compile(gl, ShaderKind::Fragment, &sources.fragment) {
            Ok(fs) => fs,
            Err(e) => {
                delete_shader(gl, vs);
                return Err(e);
            }
        };

        let linked = link(gl, vs, fs);
        delete_shader(gl, vs);
        delete_shader(gl, fs);

        let program = linked?;
        self.program = Some(program);
        log::debug!("shader program {program} linked");
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.program.is_some()
    }

    pub fn id(&self) -> Option<u32> {
        self.program
    }

    pub fn bind(&self, gl: &dyn Gl) {
        if let Some(p) = self.program {
            gl.use_program(Some(p));
        }
    }

    pub fn unbind(&self, gl: &dyn Gl) {
        gl.use_program(None);
    }

    /// Looks up (and caches) a uniform location. Misses are cached too.
    pub fn uniform_location(&mut self, gl: &dyn Gl, name: &str) -> Option<u32> {
        let program = self.program?;
        if let Some(&loc) = self.locations.get(name) {
            return loc;
        }
        let loc = gl.uniform_location(program, name);
        self.locations.insert(name.to_owned(), loc);
        loc
    }

    pub fn attrib_location(&self, gl: &dyn Gl, name: &str) -> Option<u32> {
        gl.attrib_location(self.program?, name)
    }

    // ── typed setters ─────────────────────────────────────────────────────
    // Unknown uniforms are silently skipped, matching GL's location -1.

    pub fn set_int(&mut self, gl: &dyn Gl, name: &str, v: i32) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_1i(loc, v);
        }
    }

    pub fn set_float(&mut self, gl: &dyn Gl, name: &str, v: f32) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_1f(loc, v);
        }
    }

    pub fn set_vec2(&mut self, gl: &dyn Gl, name: &str, x: f32, y: f32) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_2f(loc, x, y);
        }
    }

    pub fn set_vec3(&mut self, gl: &dyn Gl, name: &str, x: f32, y: f32, z: f32) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_3f(loc, x, y, z);
        }
    }

    pub fn set_vec4(&mut self, gl: &dyn Gl, name: &str, v: [f32; 4]) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_4f(loc, v[0], v[1], v[2], v[3]);
        }
    }

    /// Uploads a column-major matrix.
    pub fn set_mat4(&mut self, gl: &dyn Gl, name: &str, m: &[f32; 16]) {
        if let Some(loc) = self.uniform_location(gl, name) {
            gl.uniform_matrix_4fv(loc, false, m);
        }
    }

    pub fn set_uniform(&mut self, gl: &dyn Gl, name: &str, value: &UniformValue) {
        match value {
            UniformValue::Float(v) => self.set_float(gl, name, *v),
            UniformValue::Vec2([x, y]) => self.set_vec2(gl, name, *x, *y),
            UniformValue::Vec3([x, y, z]) => self.set_vec3(gl, name, *x, *y, *z),
            UniformValue::Vec4(v) => self.set_vec4(gl, name, *v),
            UniformValue::Mat4(m) => self.set_mat4(gl, name, m),
        }
    }

    /// Deletes the program. Safe to call repeatedly.
    pub fn destroy(&mut self, gl: &dyn Gl) {
        self.locations.clear();
        if let Some(p) = self.program.take() {
            gl.delete_program(p);
            tracker().on_delete(ResourceKind::Program);
        }
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let Some(p) = self.program {
            log::warn!("shader program {p} dropped without destroy; GL object leaked");
        }
    }
}

fn compile(gl: &dyn Gl, kind: ShaderKind, source: &str) -> EngineResult<u32> {
    let shader = gl.create_shader(kind).ok_or_else(|| EngineError::ShaderCompile {
        kind,
        log: "glCreateShader returned 0".into(),
    })?;
    tracker().on_create(ResourceKind::Shader);

    gl.shader_source(shader, source);
    if let Err(log) = gl.compile_shader(shader) {
        delete_shader(gl, shader);
        return Err(EngineError::ShaderCompile { kind, log });
    }
    Ok(shader)
}

fn link(gl: &dyn Gl, vs: u32, fs: u32) -> EngineResult<u32> {
    let program = gl
        .create_program()
        .ok_or_else(|| EngineError::ShaderLink("glCreateProgram returned 0".into()))?;
    tracker().on_create(ResourceKind::Program);

    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    if let Err(log) = gl.link_program(program) {
        gl.delete_program(program);
        tracker().on_delete(ResourceKind::Program);
        return Err(EngineError::ShaderLink(log));
    }
    Ok(program)
}

fn delete_shader(gl: &dyn Gl, shader: u32) {
    gl.delete_shader(shader);
    tracker().on_delete(ResourceKind::Shader);
}
