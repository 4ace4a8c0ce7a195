//! WebGL2 implementation of [`FrameRenderer`]: one canvas, one program per
//! pass, one vertex array per entity.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    Document, Element, HtmlCanvasElement, WebGl2RenderingContext as GL, WebGlBuffer,
    WebGlProgram, WebGlShader, WebGlUniformLocation, WebGlVertexArrayObject,
};

use super::shaders;
use super::targets::{Target, Targets};
use crate::camera::FlightCamera;
use crate::config::MAX_STREAK_TAPS;
use crate::error::StageError;
use crate::lifecycle::FrameRenderer;
use crate::post::{bloom_kernel_radius, gaussian_weights, PostPipeline, BLOOM_SMOOTH_WIDTH};
use crate::scene::{Entity, Scene, Topology};

const POSITION_LOCATION: u32 = 0;
const COLOR_LOCATION: u32 = 1;
const COMPOSITE_MIPS: usize = 5;

struct Program {
    program: WebGlProgram,
    uniforms: HashMap<&'static str, WebGlUniformLocation>,
}

impl Program {
    fn new(gl: &GL, vert: &str, frag: &str, names: &[&'static str]) -> Result<Self, StageError> {
        let vs = compile(gl, GL::VERTEX_SHADER, vert)?;
        let fs = match compile(gl, GL::FRAGMENT_SHADER, frag) {
            Ok(fs) => fs,
            Err(e) => {
                gl.delete_shader(Some(&vs));
                return Err(e);
            }
        };
        let linked = link(gl, &vs, &fs);
        gl.delete_shader(Some(&vs));
        gl.delete_shader(Some(&fs));
        let program = linked?;

        let uniforms = names
            .iter()
            .filter_map(|name| gl.get_uniform_location(&program, name).map(|loc| (*name, loc)))
            .collect();
        Ok(Self { program, uniforms })
    }

    /// Location of `name`, or `None` when the compiler stripped it.
    fn loc(&self, name: &str) -> Option<&WebGlUniformLocation> {
        self.uniforms.get(name)
    }
}

fn compile(gl: &GL, kind: u32, src: &str) -> Result<WebGlShader, StageError> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| StageError::Resource("shader".into()))?;
    gl.shader_source(&shader, src);
    gl.compile_shader(&shader);
    if gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(StageError::Shader(log))
    }
}

fn link(gl: &GL, vs: &WebGlShader, fs: &WebGlShader) -> Result<WebGlProgram, StageError> {
    let program = gl
        .create_program()
        .ok_or_else(|| StageError::Resource("program".into()))?;
    gl.attach_shader(&program, vs);
    gl.attach_shader(&program, fs);
    gl.link_program(&program);
    if gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false)
    {
        Ok(program)
    } else {
        let log = gl.get_program_info_log(&program).unwrap_or_default();
        gl.delete_program(Some(&program));
        Err(StageError::Shader(log))
    }
}

struct Programs {
    scene: Program,
    highpass: Program,
    blur: Program,
    composite: Program,
    streak: Program,
    barrel: Program,
}

impl Programs {
    fn new(gl: &GL) -> Result<Self, StageError> {
        let mut built = Vec::new();
        let sources: [(&str, &str, &[&'static str]); 6] = [
            (
                shaders::SCENE_VERT,
                shaders::SCENE_FRAG,
                &[
                    "u_model",
                    "u_view",
                    "u_projection",
                    "u_point_size",
                    "u_point_scale",
                    "u_tint",
                    "u_opacity",
                ],
            ),
            (
                shaders::FULLSCREEN_VERT,
                shaders::HIGHPASS_FRAG,
                &["u_input", "u_threshold", "u_smooth_width"],
            ),
            (
                shaders::FULLSCREEN_VERT,
                shaders::BLUR_FRAG,
                &["u_input", "u_texel", "u_radius", "u_weights"],
            ),
            (
                shaders::FULLSCREEN_VERT,
                shaders::COMPOSITE_FRAG,
                &[
                    "u_scene", "u_mip0", "u_mip1", "u_mip2", "u_mip3", "u_mip4", "u_weights",
                    "u_strength",
                ],
            ),
            (
                shaders::FULLSCREEN_VERT,
                shaders::STREAK_FRAG,
                &["u_input", "u_intensity", "u_direction", "u_spacing", "u_taps"],
            ),
            (
                shaders::FULLSCREEN_VERT,
                shaders::BARREL_FRAG,
                &["u_input", "u_amount"],
            ),
        ];
        for (vert, frag, names) in sources {
            match Program::new(gl, vert, frag, names) {
                Ok(program) => built.push(program),
                Err(e) => {
                    for program in &built {
                        gl.delete_program(Some(&program.program));
                    }
                    return Err(e);
                }
            }
        }
        let mut it = built.into_iter();
        match (it.next(), it.next(), it.next(), it.next(), it.next(), it.next()) {
            (
                Some(scene),
                Some(highpass),
                Some(blur),
                Some(composite),
                Some(streak),
                Some(barrel),
            ) => Ok(Self {
                scene,
                highpass,
                blur,
                composite,
                streak,
                barrel,
            }),
            _ => Err(StageError::Shader("post chain is incomplete".into())),
        }
    }

    fn delete(&self, gl: &GL) {
        for program in [
            &self.scene,
            &self.highpass,
            &self.blur,
            &self.composite,
            &self.streak,
            &self.barrel,
        ] {
            gl.delete_program(Some(&program.program));
        }
    }
}

/// GPU copy of one entity's geometry.
struct Mesh {
    vao: WebGlVertexArrayObject,
    positions: WebGlBuffer,
    colors: WebGlBuffer,
    count: i32,
    mode: u32,
    revision: u64,
}

impl Mesh {
    fn delete(&self, gl: &GL) {
        gl.delete_vertex_array(Some(&self.vao));
        gl.delete_buffer(Some(&self.positions));
        gl.delete_buffer(Some(&self.colors));
    }
}

pub struct GlRenderer {
    canvas: HtmlCanvasElement,
    gl: GL,
    programs: Programs,
    fullscreen: WebGlVertexArrayObject,
    meshes: Vec<Mesh>,
    targets: Option<Targets>,
    background: Vec3,
    scratch: Vec<f32>,
    released: bool,
}

impl GlRenderer {
    /// Appends a canvas to `container` and compiles the pass programs.
    /// On error the canvas is removed again.
    pub fn new(document: &Document, container: &Element, background: Vec3) -> Result<Self, StageError> {
        let canvas = document
            .create_element("canvas")
            .map_err(|e| StageError::Resource(format!("canvas: {e:?}")))?
            .dyn_into::<HtmlCanvasElement>()
            .map_err(|_| StageError::Resource("canvas".into()))?;
        let style = canvas.style();
        for (prop, value) in [("display", "block"), ("width", "100%"), ("height", "100%")] {
            style.set_property(prop, value).ok();
        }
        container
            .append_child(&canvas)
            .map_err(|e| StageError::Resource(format!("canvas attachment: {e:?}")))?;

        match Self::with_canvas(canvas.clone(), background) {
            Ok(renderer) => Ok(renderer),
            Err(e) => {
                canvas.remove();
                Err(e)
            }
        }
    }

    fn with_canvas(canvas: HtmlCanvasElement, background: Vec3) -> Result<Self, StageError> {
        let options = js_sys::Object::new();
        js_sys::Reflect::set(&options, &"antialias".into(), &JsValue::TRUE).ok();
        js_sys::Reflect::set(&options, &"alpha".into(), &JsValue::FALSE).ok();
        let gl: GL = canvas
            .get_context_with_context_options("webgl2", &options)
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into().ok())
            .ok_or(StageError::UnsupportedContext)?;

        let programs = Programs::new(&gl)?;
        let Some(fullscreen) = gl.create_vertex_array() else {
            programs.delete(&gl);
            return Err(StageError::Resource("vertex array".into()));
        };
        log::debug!("WebGL2 context ready");

        Ok(Self {
            canvas,
            gl,
            programs,
            fullscreen,
            meshes: Vec::new(),
            targets: None,
            background,
            scratch: Vec::new(),
            released: false,
        })
    }

    fn upload_mesh(&mut self, entity: &Entity) -> Result<Mesh, StageError> {
        let gl = &self.gl;
        let vao = gl
            .create_vertex_array()
            .ok_or_else(|| StageError::Resource("vertex array".into()))?;
        let (Some(positions), Some(colors)) = (gl.create_buffer(), gl.create_buffer()) else {
            gl.delete_vertex_array(Some(&vao));
            return Err(StageError::Resource("vertex buffer".into()));
        };
        gl.bind_vertex_array(Some(&vao));

        let geometry = &entity.geometry;
        for (buffer, location, data, usage) in [
            (&positions, POSITION_LOCATION, &geometry.positions, GL::DYNAMIC_DRAW),
            (&colors, COLOR_LOCATION, &geometry.colors, GL::STATIC_DRAW),
        ] {
            flatten(data, &mut self.scratch);
            gl.bind_buffer(GL::ARRAY_BUFFER, Some(buffer));
            let array = js_sys::Float32Array::from(self.scratch.as_slice());
            gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, usage);
            gl.enable_vertex_attrib_array(location);
            gl.vertex_attrib_pointer_with_i32(location, 3, GL::FLOAT, false, 0, 0);
        }
        gl.bind_vertex_array(None);
        gl.bind_buffer(GL::ARRAY_BUFFER, None);

        Ok(Mesh {
            vao,
            positions,
            colors,
            count: geometry.vertex_count() as i32,
            mode: match geometry.topology {
                Topology::Lines => GL::LINES,
                Topology::Points => GL::POINTS,
            },
            revision: geometry.revision(),
        })
    }

    fn delete_meshes(&mut self) {
        for mesh in self.meshes.drain(..) {
            mesh.delete(&self.gl);
        }
    }

    fn draw_scene(&mut self, scene: &Scene, camera: &FlightCamera, target: &Target) {
        let gl = &self.gl;
        target.bind(gl);
        let bg = self.background;
        gl.clear_color(bg.x, bg.y, bg.z, 1.0);
        gl.clear(GL::COLOR_BUFFER_BIT | GL::DEPTH_BUFFER_BIT);
        gl.enable(GL::DEPTH_TEST);

        let program = &self.programs.scene;
        gl.use_program(Some(&program.program));
        gl.uniform_matrix4fv_with_f32_array(
            program.loc("u_view"),
            false,
            &camera.view().to_cols_array(),
        );
        gl.uniform_matrix4fv_with_f32_array(
            program.loc("u_projection"),
            false,
            &camera.projection().to_cols_array(),
        );
        gl.uniform1f(program.loc("u_point_scale"), target.size.height as f32 * 0.5);

        // Opaque entities first, then the blended ones without depth writes.
        for transparent in [false, true] {
            if transparent {
                gl.enable(GL::BLEND);
                gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);
                gl.depth_mask(false);
            }
            for (id, entity) in scene.iter() {
                if entity.material.is_transparent() != transparent {
                    continue;
                }
                let Some(mesh) = self.meshes.get_mut(id.index()) else {
                    continue;
                };
                if mesh.revision != entity.geometry.revision() {
                    flatten(&entity.geometry.positions, &mut self.scratch);
                    gl.bind_buffer(GL::ARRAY_BUFFER, Some(&mesh.positions));
                    let array = js_sys::Float32Array::from(self.scratch.as_slice());
                    gl.buffer_data_with_array_buffer_view(GL::ARRAY_BUFFER, &array, GL::DYNAMIC_DRAW);
                    mesh.revision = entity.geometry.revision();
                }
                let material = &entity.material;
                gl.uniform_matrix4fv_with_f32_array(
                    program.loc("u_model"),
                    false,
                    &entity.transform.matrix().to_cols_array(),
                );
                gl.uniform3f(
                    program.loc("u_tint"),
                    material.tint.x,
                    material.tint.y,
                    material.tint.z,
                );
                gl.uniform1f(program.loc("u_opacity"), material.opacity);
                gl.uniform1f(program.loc("u_point_size"), material.point_size);
                gl.bind_vertex_array(Some(&mesh.vao));
                gl.draw_arrays(mesh.mode, 0, mesh.count);
            }
        }
        gl.bind_vertex_array(None);
        gl.bind_buffer(GL::ARRAY_BUFFER, None);
        gl.depth_mask(true);
        gl.disable(GL::BLEND);
        gl.disable(GL::DEPTH_TEST);
    }

    fn draw_post(&self, targets: &Targets, pipeline: &PostPipeline) {
        let gl = &self.gl;
        gl.bind_vertex_array(Some(&self.fullscreen));
        let bloom = pipeline.bloom();

        let p = &self.programs.highpass;
        targets.bright().bind(gl);
        gl.use_program(Some(&p.program));
        bind_texture(gl, p.loc("u_input"), 0, &targets.scene().texture);
        gl.uniform1f(p.loc("u_threshold"), bloom.threshold);
        gl.uniform1f(p.loc("u_smooth_width"), BLOOM_SMOOTH_WIDTH);
        fullscreen(gl);

        let p = &self.programs.blur;
        gl.use_program(Some(&p.program));
        let mut source = targets.bright();
        for level in 0..targets.level_count() {
            let radius = bloom_kernel_radius(level).min(shaders::MAX_BLUR_RADIUS);
            let mut weights = gaussian_weights(radius);
            weights.resize(shaders::MAX_BLUR_RADIUS + 1, 0.0);
            gl.uniform1i(p.loc("u_radius"), radius as i32);
            gl.uniform1fv_with_f32_array(p.loc("u_weights"), &weights);

            let (horizontal, vertical) = targets.level(level);
            for (dst, src, direction) in [
                (horizontal, source, Vec2::X),
                (vertical, horizontal, Vec2::Y),
            ] {
                dst.bind(gl);
                bind_texture(gl, p.loc("u_input"), 0, &src.texture);
                let texel = direction / Vec2::new(dst.size.width as f32, dst.size.height as f32);
                gl.uniform2f(p.loc("u_texel"), texel.x, texel.y);
                fullscreen(gl);
            }
            source = vertical;
        }

        let p = &self.programs.composite;
        targets.bloom().bind(gl);
        gl.use_program(Some(&p.program));
        bind_texture(gl, p.loc("u_scene"), 0, &targets.scene().texture);
        let mut weights = pipeline.bloom_level_weights();
        weights.resize(COMPOSITE_MIPS, 0.0);
        for (k, name) in ["u_mip0", "u_mip1", "u_mip2", "u_mip3", "u_mip4"]
            .into_iter()
            .enumerate()
        {
            // Unused slots get weight 0 and sample the deepest real level.
            let level = k.min(targets.level_count().saturating_sub(1));
            bind_texture(gl, p.loc(name), 1 + k as u32, &targets.level(level).1.texture);
        }
        gl.uniform1fv_with_f32_array(p.loc("u_weights"), &weights);
        gl.uniform1f(p.loc("u_strength"), bloom.strength);
        fullscreen(gl);

        let streak = pipeline.streak();
        let p = &self.programs.streak;
        targets.streak().bind(gl);
        gl.use_program(Some(&p.program));
        bind_texture(gl, p.loc("u_input"), 0, &targets.bloom().texture);
        gl.uniform1f(p.loc("u_intensity"), streak.intensity);
        gl.uniform2f(p.loc("u_direction"), streak.direction.x, streak.direction.y);
        gl.uniform1f(p.loc("u_spacing"), streak.spacing);
        gl.uniform1i(
            p.loc("u_taps"),
            streak.taps.clamp(1, MAX_STREAK_TAPS) as i32,
        );
        fullscreen(gl);

        let p = &self.programs.barrel;
        let size = pipeline.size();
        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        gl.viewport(0, 0, size.width as i32, size.height as i32);
        gl.use_program(Some(&p.program));
        bind_texture(gl, p.loc("u_input"), 0, &targets.streak().texture);
        gl.uniform1f(p.loc("u_amount"), pipeline.distortion().amount);
        fullscreen(gl);

        gl.bind_vertex_array(None);
        for unit in 0..=COMPOSITE_MIPS as u32 {
            gl.active_texture(GL::TEXTURE0 + unit);
            gl.bind_texture(GL::TEXTURE_2D, None);
        }
        gl.active_texture(GL::TEXTURE0);
    }
}

impl FrameRenderer for GlRenderer {
    fn upload(&mut self, scene: &Scene) -> Result<(), StageError> {
        self.delete_meshes();
        for (_, entity) in scene.iter() {
            match self.upload_mesh(entity) {
                Ok(mesh) => self.meshes.push(mesh),
                Err(e) => {
                    self.delete_meshes();
                    return Err(e);
                }
            }
        }
        log::debug!("Uploaded {} meshes", self.meshes.len());
        Ok(())
    }

    fn resize(&mut self, css: (u32, u32), pipeline: &PostPipeline) {
        if self.released {
            return;
        }
        let size = pipeline.size();
        self.canvas.set_width(size.width);
        self.canvas.set_height(size.height);
        let style = self.canvas.style();
        style.set_property("width", &format!("{}px", css.0)).ok();
        style.set_property("height", &format!("{}px", css.1)).ok();

        if let Some(old) = self.targets.take() {
            old.delete(&self.gl);
        }
        match Targets::new(&self.gl, pipeline) {
            Ok(targets) => self.targets = Some(targets),
            Err(e) => log::error!("Render targets unavailable at {}x{}: {e}", size.width, size.height),
        }
    }

    fn render(&mut self, scene: &Scene, camera: &FlightCamera, pipeline: &PostPipeline) {
        if self.released {
            return;
        }
        let Some(targets) = self.targets.take() else {
            return;
        };
        self.draw_scene(scene, camera, targets.scene());
        self.draw_post(&targets, pipeline);
        self.targets = Some(targets);
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.delete_meshes();
        if let Some(targets) = self.targets.take() {
            targets.delete(&self.gl);
        }
        self.programs.delete(&self.gl);
        self.gl.delete_vertex_array(Some(&self.fullscreen));
        if let Some(ext) = self
            .gl
            .get_extension("WEBGL_lose_context")
            .ok()
            .flatten()
            .map(|ext| ext.unchecked_into::<web_sys::WebglLoseContext>())
        {
            ext.lose_context();
        }
        self.canvas.remove();
        log::debug!("Renderer released");
    }
}

fn flatten(points: &[Vec3], out: &mut Vec<f32>) {
    out.clear();
    out.extend(points.iter().flat_map(|p| p.to_array()));
}

fn bind_texture(gl: &GL, loc: Option<&WebGlUniformLocation>, unit: u32, texture: &web_sys::WebGlTexture) {
    gl.active_texture(GL::TEXTURE0 + unit);
    gl.bind_texture(GL::TEXTURE_2D, Some(texture));
    gl.uniform1i(loc, unit as i32);
}

fn fullscreen(gl: &GL) {
    gl.draw_arrays(GL::TRIANGLES, 0, 3);
}
