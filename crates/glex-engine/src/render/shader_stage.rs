use anyhow::Context as _;
use bytemuck::{Pod, Zeroable};

use crate::device::{DrawMode, FeatureLevel, Gl};
use crate::resources::{tracker, ResourceKind};

use super::{RenderStage, ShaderProgram, ShaderSources, StageCtx, UniformMap};

const DEFAULT_VERTEX: &str = r#"#version 300 es
layout(location = 0) in vec2 a_position;
out vec2 v_uv;
void main() {
    v_uv = a_position * 0.5 + 0.5;
    gl_Position = vec4(a_position, 0.0, 1.0);
}
"#;

const DEFAULT_FRAGMENT: &str = r#"#version 300 es
precision highp float;
in vec2 v_uv;
out vec4 fragColor;
uniform float u_time;
uniform vec2 u_resolution;
void main() {
    vec3 top = vec3(0.05, 0.07, 0.12);
    vec3 bottom = vec3(0.02, 0.02, 0.04);
    vec3 color = mix(bottom, top, v_uv.y);
    color += 0.03 * sin(u_time + v_uv.xyx * 12.0);
    fragColor = vec4(color, 1.0);
}
"#;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct QuadVertex {
    pos: [f32; 2],
}

/// Full-screen triangle strip in clip space.
const QUAD: [QuadVertex; 4] = [
    QuadVertex { pos: [-1.0, -1.0] },
    QuadVertex { pos: [1.0, -1.0] },
    QuadVertex { pos: [-1.0, 1.0] },
    QuadVertex { pos: [1.0, 1.0] },
];

/// Programmable full-screen stage.
///
/// Draws one quad with host-supplied shaders (or a subtle animated gradient
/// when none are set). Feeds `u_time` (seconds since init) and
/// `u_resolution` (pixels) every frame, then the host uniforms by name.
pub struct ShaderStage {
    program: ShaderProgram,
    vao: Option<u32>,
    vbo: Option<u32>,
    sources: ShaderSources,
    uniforms: UniformMap,
    needs_rebuild: bool,
    time: f32,
}

impl ShaderStage {
    pub const NAME: &'static str = "ShaderStage";

    pub fn new() -> Self {
        Self {
            program: ShaderProgram::new(),
            vao: None,
            vbo: None,
            sources: ShaderSources::default(),
            uniforms: UniformMap::new(),
            needs_rebuild: false,
            time: 0.0,
        }
    }

    /// Built-in source pair used while the host has not supplied one.
    pub fn default_sources() -> ShaderSources {
        ShaderSources::new(DEFAULT_VERTEX, DEFAULT_FRAGMENT)
    }

    /// Sources the next build will use; empty halves fall back to defaults.
    pub fn effective_sources(&self) -> ShaderSources {
        let pick = |s: &str, default: &str| {
            if s.is_empty() { default.to_owned() } else { s.to_owned() }
        };
        ShaderSources::new(
            pick(&self.sources.vertex, DEFAULT_VERTEX),
            pick(&self.sources.fragment, DEFAULT_FRAGMENT),
        )
    }

    pub fn has_program(&self) -> bool {
        self.program.is_valid()
    }

    fn build_program(&mut self, ctx: &StageCtx<'_>) {
        let sources = self.effective_sources();
        if let Err(e) = self.program.build(ctx.gl(), &sources) {
            ctx.report(e);
        }
    }

    fn create_quad(&mut self, gl: &dyn Gl) -> anyhow::Result<()> {
        let vao = gl.create_vertex_array().context("glGenVertexArrays failed")?;
        tracker().on_create(ResourceKind::VertexArray);
        self.vao = Some(vao);

        let vbo = gl.create_buffer().context("glGenBuffers failed")?;
        tracker().on_create(ResourceKind::Buffer);
        self.vbo = Some(vbo);

        gl.bind_vertex_array(Some(vao));
        gl.bind_array_buffer(Some(vbo));
        gl.array_buffer_data(bytemuck::cast_slice(&QUAD));
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 2, std::mem::size_of::<QuadVertex>() as i32, 0);
        gl.bind_vertex_array(None);
        Ok(())
    }

    fn release_quad(&mut self, gl: &dyn Gl) {
        if let Some(vbo) = self.vbo.take() {
            gl.delete_buffer(vbo);
            tracker().on_delete(ResourceKind::Buffer);
        }
        if let Some(vao) = self.vao.take() {
            gl.delete_vertex_array(vao);
            tracker().on_delete(ResourceKind::VertexArray);
        }
    }
}

impl Default for ShaderStage {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderStage for ShaderStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn required_level(&self) -> FeatureLevel {
        FeatureLevel::ES_3_0
    }

    fn on_initialize(&mut self, ctx: &StageCtx<'_>, _width: i32, _height: i32) -> anyhow::Result<()> {
        if let Err(e) = self.create_quad(ctx.gl()) {
            self.release_quad(ctx.gl());
            return Err(e);
        }

        self.build_program(ctx);
        self.needs_rebuild = false;
        log::info!("shader stage initialized");
        Ok(())
    }

    fn on_update(&mut self, _ctx: &StageCtx<'_>, dt: f32) {
        self.time += dt;
    }

    fn on_render(&mut self, ctx: &StageCtx<'_>, width: i32, height: i32) {
        if self.needs_rebuild {
            self.needs_rebuild = false;
            self.build_program(ctx);
        }
        if !self.program.is_valid() {
            return;
        }

        let gl = ctx.gl();
        self.program.bind(gl);
        self.program.set_float(gl, "u_time", self.time);
        self.program
            .set_vec2(gl, "u_resolution", width as f32, height as f32);
        for (name, value) in &self.uniforms {
            self.program.set_uniform(gl, name, value);
        }

        gl.bind_vertex_array(self.vao);
        gl.draw_arrays(DrawMode::TriangleStrip, 0, QUAD.len() as i32);
        gl.bind_vertex_array(None);
    }

    fn on_destroy(&mut self, ctx: &StageCtx<'_>) {
        self.program.destroy(ctx.gl());
        self.release_quad(ctx.gl());
    }

    fn set_shader_sources(&mut self, sources: &ShaderSources) -> bool {
        if self.sources == *sources && self.program.is_valid() {
            return true;
        }
        self.sources = sources.clone();
        self.needs_rebuild = true;
        true
    }

    fn set_uniforms(&mut self, uniforms: &UniformMap) {
        self.uniforms = uniforms.clone();
    }
}
