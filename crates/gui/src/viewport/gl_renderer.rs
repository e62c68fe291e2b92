use glow::HasContext;

use exhibit_lib::engine::Camera;
use exhibit_lib::model::{Aabb, MeshData, Primitive};
use glam::{DVec3, Vec3};

/// GLSL dialect a renderer is compiled for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderDialect {
    /// Desktop OpenGL 3.3 core
    Core330,
    /// OpenGL ES 3.0 / WebGL2
    Es300,
}

impl ShaderDialect {
    fn header(&self) -> &'static str {
        match self {
            ShaderDialect::Core330 => "#version 330 core\n",
            ShaderDialect::Es300 => "#version 300 es\nprecision mediump float;\n",
        }
    }
}

// ── Render parameters ────────────────────────────────────────

/// Everything the shaders read that comes from view settings
#[derive(Debug, Clone)]
pub struct RenderParams {
    pub bg_color: [f32; 3],
    pub model_color: [f32; 3],
    pub opacity: f32,
    pub light_intensity: f32,
    pub roughness: f32,
    pub point_size: f32,
    pub grid_visible: bool,
    /// Grid through the world origin instead of under the model
    pub grid_absolute: bool,
    pub grid_color: [f32; 3],
    pub up: DVec3,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            bg_color: [1.0; 3],
            model_color: [1.0; 3],
            opacity: 1.0,
            light_intensity: 1.0,
            roughness: 0.3,
            point_size: 1.0,
            grid_visible: true,
            grid_absolute: false,
            grid_color: [0.0; 3],
            up: DVec3::Y,
        }
    }
}

// ── GPU mesh handles ─────────────────────────────────────────

struct GpuMesh {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    ibo: Option<glow::Buffer>,
    count: i32,
    primitive: Primitive,
}

struct GpuLines {
    vao: glow::VertexArray,
    vbo: glow::Buffer,
    vertex_count: i32,
}

// ── Main GL renderer ─────────────────────────────────────────

/// GPU side of the scene. Shared between the engine (which queues uploads)
/// and the paint callback (which owns the GL calls).
pub struct GlRenderer {
    mesh_program: glow::Program,
    line_program: glow::Program,
    meshes: Vec<GpuMesh>,
    /// CPU meshes waiting for the next paint
    pending: Option<Vec<MeshData>>,
    grid: Option<GpuLines>,
    grid_key: Option<[i64; 7]>,
    pub params: RenderParams,
    pub bounds: Aabb,
}

impl GlRenderer {
    pub fn new(gl: &glow::Context, dialect: ShaderDialect) -> Result<Self, String> {
        let mesh_program = compile_program(gl, dialect, MESH_VERT, MESH_FRAG)?;
        let line_program = match compile_program(gl, dialect, LINE_VERT, LINE_FRAG) {
            Ok(p) => p,
            Err(e) => {
                unsafe { gl.delete_program(mesh_program) };
                return Err(e);
            }
        };
        if dialect == ShaderDialect::Core330 {
            unsafe { gl.enable(glow::PROGRAM_POINT_SIZE) };
        }
        Ok(Self {
            mesh_program,
            line_program,
            meshes: Vec::new(),
            pending: None,
            grid: None,
            grid_key: None,
            params: RenderParams::default(),
            bounds: Aabb::EMPTY,
        })
    }

    /// Replace the scene at the next paint
    pub fn set_scene(&mut self, meshes: Vec<MeshData>, bounds: Aabb) {
        self.pending = Some(meshes);
        self.bounds = bounds;
    }

    fn sync(&mut self, gl: &glow::Context) {
        if let Some(meshes) = self.pending.take() {
            for mesh in self.meshes.drain(..) {
                delete_mesh(gl, &mesh);
            }
            self.meshes = meshes
                .iter()
                .filter_map(|m| match upload_mesh(gl, m) {
                    Ok(gpu) => Some(gpu),
                    Err(e) => {
                        tracing::error!("Failed to upload '{}': {e}", m.name);
                        None
                    }
                })
                .collect();
        }

        let key = grid_key(&self.params, &self.bounds);
        if self.grid_key != Some(key) {
            if let Some(old) = self.grid.take() {
                delete_lines(gl, &old);
            }
            let vertices = grid_lines(&self.params, &self.bounds);
            match upload_lines(gl, &vertices) {
                Ok(lines) => self.grid = Some(lines),
                Err(e) => tracing::error!("Failed to upload grid: {e}"),
            }
            self.grid_key = Some(key);
        }
    }

    /// Draw the scene into the currently bound framebuffer
    pub fn paint(&mut self, gl: &glow::Context, camera: &Camera, viewport: [i32; 4]) {
        self.sync(gl);
        let aspect = viewport[2] as f32 / viewport[3].max(1) as f32;
        let vp = camera.view_projection(aspect);
        let eye = camera.position.as_vec3();
        let p = &self.params;

        unsafe {
            gl.viewport(viewport[0], viewport[1], viewport[2], viewport[3]);
            gl.scissor(viewport[0], viewport[1], viewport[2], viewport[3]);
            gl.enable(glow::SCISSOR_TEST);

            gl.clear_color(p.bg_color[0], p.bg_color[1], p.bg_color[2], 1.0);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);

            if p.grid_visible {
                if let Some(ref grid) = self.grid {
                    gl.use_program(Some(self.line_program));
                    set_uniform_mat4(gl, self.line_program, "u_mvp", &vp);
                    draw_lines(gl, grid);
                }
            }

            gl.use_program(Some(self.mesh_program));
            set_uniform_mat4(gl, self.mesh_program, "u_mvp", &vp);
            // Headlight slightly above the eye
            let light_dir = (eye - camera.focal_point.as_vec3() + p.up.as_vec3() * 0.3)
                .try_normalize()
                .unwrap_or(Vec3::Z);
            set_uniform_vec3(gl, self.mesh_program, "u_light_dir", &light_dir);
            set_uniform_vec3(gl, self.mesh_program, "u_eye", &eye);
            set_uniform_vec3(gl, self.mesh_program, "u_color", &Vec3::from(p.model_color));
            set_uniform_f32(gl, self.mesh_program, "u_opacity", p.opacity);
            set_uniform_f32(gl, self.mesh_program, "u_light", p.light_intensity);
            set_uniform_f32(gl, self.mesh_program, "u_roughness", p.roughness);
            set_uniform_f32(gl, self.mesh_program, "u_point_size", p.point_size);

            if p.opacity < 1.0 {
                gl.enable(glow::BLEND);
                gl.blend_func(glow::SRC_ALPHA, glow::ONE_MINUS_SRC_ALPHA);
            }
            for mesh in &self.meshes {
                draw_mesh(gl, mesh);
            }

            gl.disable(glow::BLEND);
            gl.disable(glow::DEPTH_TEST);
            gl.disable(glow::SCISSOR_TEST);
            gl.use_program(None);
        }
    }

    /// Draw into an offscreen framebuffer and read it back as RGBA rows,
    /// top row first.
    pub fn paint_offscreen(
        &mut self,
        gl: &glow::Context,
        camera: &Camera,
        width: i32,
        height: i32,
    ) -> Result<Vec<u8>, String> {
        unsafe {
            let fbo = gl.create_framebuffer()?;
            let color = gl.create_renderbuffer()?;
            let depth = gl.create_renderbuffer()?;

            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(color));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::RGBA8, width, height);
            gl.bind_renderbuffer(glow::RENDERBUFFER, Some(depth));
            gl.renderbuffer_storage(glow::RENDERBUFFER, glow::DEPTH_COMPONENT24, width, height);
            gl.bind_renderbuffer(glow::RENDERBUFFER, None);

            gl.bind_framebuffer(glow::FRAMEBUFFER, Some(fbo));
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::RENDERBUFFER,
                Some(color),
            );
            gl.framebuffer_renderbuffer(
                glow::FRAMEBUFFER,
                glow::DEPTH_ATTACHMENT,
                glow::RENDERBUFFER,
                Some(depth),
            );

            let result = if gl.check_framebuffer_status(glow::FRAMEBUFFER)
                == glow::FRAMEBUFFER_COMPLETE
            {
                self.paint(gl, camera, [0, 0, width, height]);
                let mut pixels = vec![0u8; (width * height * 4) as usize];
                gl.read_pixels(
                    0,
                    0,
                    width,
                    height,
                    glow::RGBA,
                    glow::UNSIGNED_BYTE,
                    glow::PixelPackData::Slice(Some(&mut pixels)),
                );
                Ok(flip_rows(pixels, width as usize * 4))
            } else {
                Err("offscreen framebuffer incomplete".to_string())
            };

            gl.bind_framebuffer(glow::FRAMEBUFFER, None);
            gl.delete_framebuffer(fbo);
            gl.delete_renderbuffer(color);
            gl.delete_renderbuffer(depth);
            result
        }
    }

    pub fn destroy(&mut self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.mesh_program);
            gl.delete_program(self.line_program);
        }
        for mesh in self.meshes.drain(..) {
            delete_mesh(gl, &mesh);
        }
        if let Some(grid) = self.grid.take() {
            delete_lines(gl, &grid);
        }
    }
}

fn flip_rows(pixels: Vec<u8>, stride: usize) -> Vec<u8> {
    pixels
        .chunks_exact(stride)
        .rev()
        .flatten()
        .copied()
        .collect()
}

// ── Grid ─────────────────────────────────────────────────────

const GRID_DIVISIONS: i32 = 10;

fn grid_key(params: &RenderParams, bounds: &Aabb) -> [i64; 7] {
    let q = |v: f64| (v * 1000.0).round() as i64;
    let center = bounds.center();
    [
        q(bounds.radius()),
        q(center.x),
        q(center.y),
        q(center.z),
        q(params.up.dot(DVec3::new(1.0, 2.0, 3.0))),
        params.grid_absolute as i64,
        q(params.grid_color.iter().map(|c| *c as f64).sum()),
    ]
}

/// Square grid on the plane orthogonal to the up axis. Vertices are
/// position (3) + colour (4).
fn grid_lines(params: &RenderParams, bounds: &Aabb) -> Vec<f32> {
    let up = params.up.try_normalize().unwrap_or(DVec3::Y);
    let (u, v) = up.any_orthonormal_pair();
    let radius = if bounds.is_empty() { 1.0 } else { bounds.radius().max(1e-3) };
    let center = if params.grid_absolute || bounds.is_empty() {
        DVec3::ZERO
    } else {
        // Under the model along the up axis
        let c = bounds.center();
        let low = [bounds.min, bounds.max]
            .iter()
            .map(|p| p.dot(up))
            .fold(f64::INFINITY, f64::min);
        c - up * (c.dot(up) - low)
    };

    let step = nice_step(2.0 * radius / GRID_DIVISIONS as f64);
    let half = step * GRID_DIVISIONS as f64;
    let [r, g, b] = params.grid_color;
    let mut out = Vec::new();
    for i in -GRID_DIVISIONS..=GRID_DIVISIONS {
        let t = i as f64 * step;
        let alpha = if i == 0 { 0.8 } else { 0.35 };
        for (a, b_) in [
            (center + u * t - v * half, center + u * t + v * half),
            (center + v * t - u * half, center + v * t + u * half),
        ] {
            for p in [a, b_] {
                out.extend([p.x as f32, p.y as f32, p.z as f32, r, g, b, alpha]);
            }
        }
    }
    out
}

/// Round up to 1, 2 or 5 times a power of ten
fn nice_step(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

// ── GPU upload ───────────────────────────────────────────────

fn upload_mesh(gl: &glow::Context, data: &MeshData) -> Result<GpuMesh, String> {
    let mut vertices = Vec::with_capacity(data.positions.len() * 6);
    for (i, p) in data.positions.iter().enumerate() {
        let n = data.normals.get(i).copied().unwrap_or([0.0, 0.0, 0.0]);
        vertices.extend_from_slice(p);
        vertices.extend_from_slice(&n);
    }

    unsafe {
        let vao = gl.create_vertex_array()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(&vertices), glow::STATIC_DRAW);

        let stride = 6 * 4;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 3, glow::FLOAT, false, stride, 3 * 4);

        let (ibo, count) = match data.primitive {
            Primitive::Triangles => {
                let ibo = gl.create_buffer()?;
                gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
                gl.buffer_data_u8_slice(
                    glow::ELEMENT_ARRAY_BUFFER,
                    cast_slice(&data.indices),
                    glow::STATIC_DRAW,
                );
                (Some(ibo), data.indices.len() as i32)
            }
            Primitive::Points => (None, data.positions.len() as i32),
        };

        gl.bind_vertex_array(None);
        Ok(GpuMesh {
            vao,
            vbo,
            ibo,
            count,
            primitive: data.primitive,
        })
    }
}

fn upload_lines(gl: &glow::Context, vertices: &[f32]) -> Result<GpuLines, String> {
    unsafe {
        let vao = gl.create_vertex_array()?;
        gl.bind_vertex_array(Some(vao));

        let vbo = gl.create_buffer()?;
        gl.bind_buffer(glow::ARRAY_BUFFER, Some(vbo));
        gl.buffer_data_u8_slice(glow::ARRAY_BUFFER, cast_slice(vertices), glow::STATIC_DRAW);

        let stride = 7 * 4;
        gl.enable_vertex_attrib_array(0);
        gl.vertex_attrib_pointer_f32(0, 3, glow::FLOAT, false, stride, 0);
        gl.enable_vertex_attrib_array(1);
        gl.vertex_attrib_pointer_f32(1, 4, glow::FLOAT, false, stride, 3 * 4);

        gl.bind_vertex_array(None);
        Ok(GpuLines {
            vao,
            vbo,
            vertex_count: (vertices.len() / 7) as i32,
        })
    }
}

fn delete_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    unsafe {
        gl.delete_vertex_array(mesh.vao);
        gl.delete_buffer(mesh.vbo);
        if let Some(ibo) = mesh.ibo {
            gl.delete_buffer(ibo);
        }
    }
}

fn delete_lines(gl: &glow::Context, lines: &GpuLines) {
    unsafe {
        gl.delete_vertex_array(lines.vao);
        gl.delete_buffer(lines.vbo);
    }
}

// ── Draw calls ───────────────────────────────────────────────

unsafe fn draw_mesh(gl: &glow::Context, mesh: &GpuMesh) {
    gl.bind_vertex_array(Some(mesh.vao));
    match (mesh.primitive, mesh.ibo) {
        (Primitive::Triangles, Some(ibo)) => {
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(ibo));
            gl.draw_elements(glow::TRIANGLES, mesh.count, glow::UNSIGNED_INT, 0);
        }
        _ => gl.draw_arrays(glow::POINTS, 0, mesh.count),
    }
    gl.bind_vertex_array(None);
}

unsafe fn draw_lines(gl: &glow::Context, lines: &GpuLines) {
    gl.bind_vertex_array(Some(lines.vao));
    gl.draw_arrays(glow::LINES, 0, lines.vertex_count);
    gl.bind_vertex_array(None);
}

// ── Shader compilation ───────────────────────────────────────

fn compile_shader(
    gl: &glow::Context,
    kind: u32,
    source: &str,
) -> Result<glow::Shader, String> {
    unsafe {
        let shader = gl.create_shader(kind)?;
        gl.shader_source(shader, source);
        gl.compile_shader(shader);
        if gl.get_shader_compile_status(shader) {
            Ok(shader)
        } else {
            let log = gl.get_shader_info_log(shader);
            gl.delete_shader(shader);
            Err(log)
        }
    }
}

fn compile_program(
    gl: &glow::Context,
    dialect: ShaderDialect,
    vert_src: &str,
    frag_src: &str,
) -> Result<glow::Program, String> {
    let vert_src = format!("{}{vert_src}", dialect.header());
    let frag_src = format!("{}{frag_src}", dialect.header());
    unsafe {
        let vert = compile_shader(gl, glow::VERTEX_SHADER, &vert_src)
            .map_err(|log| format!("vertex shader: {log}"))?;
        let frag = match compile_shader(gl, glow::FRAGMENT_SHADER, &frag_src) {
            Ok(f) => f,
            Err(log) => {
                gl.delete_shader(vert);
                return Err(format!("fragment shader: {log}"));
            }
        };

        let program = gl.create_program()?;
        gl.attach_shader(program, vert);
        gl.attach_shader(program, frag);
        gl.link_program(program);
        let linked = gl.get_program_link_status(program);
        gl.delete_shader(vert);
        gl.delete_shader(frag);
        if linked {
            Ok(program)
        } else {
            let log = gl.get_program_info_log(program);
            gl.delete_program(program);
            Err(format!("link: {log}"))
        }
    }
}

// ── Uniform setters ──────────────────────────────────────────

fn set_uniform_mat4(gl: &glow::Context, program: glow::Program, name: &str, mat: &glam::Mat4) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_matrix_4_f32_slice(loc.as_ref(), false, &mat.to_cols_array());
    }
}

fn set_uniform_vec3(gl: &glow::Context, program: glow::Program, name: &str, v: &Vec3) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_3_f32(loc.as_ref(), v.x, v.y, v.z);
    }
}

fn set_uniform_f32(gl: &glow::Context, program: glow::Program, name: &str, v: f32) {
    unsafe {
        let loc = gl.get_uniform_location(program, name);
        gl.uniform_1_f32(loc.as_ref(), v);
    }
}

// ── Byte cast helper ─────────────────────────────────────────

fn cast_slice<T: Copy>(slice: &[T]) -> &[u8] {
    unsafe { std::slice::from_raw_parts(slice.as_ptr() as *const u8, std::mem::size_of_val(slice)) }
}

// ── Shaders (version header prepended per dialect) ───────────

const MESH_VERT: &str = r#"
uniform mat4 u_mvp;
uniform float u_point_size;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec3 a_normal;

out vec3 v_normal;
out vec3 v_position;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    gl_PointSize = u_point_size;
    v_normal = a_normal;
    v_position = a_position;
}
"#;

const MESH_FRAG: &str = r#"
uniform vec3 u_light_dir;
uniform vec3 u_eye;
uniform vec3 u_color;
uniform float u_opacity;
uniform float u_light;
uniform float u_roughness;

in vec3 v_normal;
in vec3 v_position;

out vec4 frag_color;

void main() {
    vec3 n = v_normal;
    if (dot(n, n) < 1e-8) {
        frag_color = vec4(u_color * min(u_light, 1.0), u_opacity);
        return;
    }
    n = normalize(n);
    vec3 view = normalize(u_eye - v_position);
    if (dot(n, view) < 0.0) {
        n = -n;
    }
    float diffuse = max(dot(n, u_light_dir), 0.0);
    vec3 h = normalize(u_light_dir + view);
    float shininess = mix(64.0, 4.0, clamp(u_roughness, 0.0, 1.0));
    float specular = pow(max(dot(n, h), 0.0), shininess) * (1.0 - u_roughness) * 0.5;
    float light = 0.2 + (diffuse * 0.7 + specular) * u_light;
    frag_color = vec4(u_color * light, u_opacity);
}
"#;

const LINE_VERT: &str = r#"
uniform mat4 u_mvp;

layout(location = 0) in vec3 a_position;
layout(location = 1) in vec4 a_color;

out vec4 v_color;

void main() {
    gl_Position = u_mvp * vec4(a_position, 1.0);
    v_color = a_color;
}
"#;

const LINE_FRAG: &str = r#"
in vec4 v_color;
out vec4 frag_color;

void main() {
    frag_color = v_color;
}
"#;
