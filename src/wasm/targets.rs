//! Offscreen render targets for the post chain.

use web_sys::{WebGl2RenderingContext as GL, WebGlFramebuffer, WebGlRenderbuffer, WebGlTexture};

use crate::error::StageError;
use crate::post::{FrameSize, PassKind, PostPipeline};

/// A color texture attached to a framebuffer, optionally with depth.
pub struct Target {
    pub framebuffer: WebGlFramebuffer,
    pub texture: WebGlTexture,
    depth: Option<WebGlRenderbuffer>,
    pub size: FrameSize,
}

impl Target {
    pub fn new(gl: &GL, size: FrameSize, with_depth: bool) -> Result<Self, StageError> {
        let texture = gl
            .create_texture()
            .ok_or_else(|| StageError::Resource("texture".into()))?;
        gl.bind_texture(GL::TEXTURE_2D, Some(&texture));
        gl.tex_image_2d_with_i32_and_i32_and_i32_and_format_and_type_and_opt_u8_array(
            GL::TEXTURE_2D,
            0,
            GL::RGBA8 as i32,
            size.width as i32,
            size.height as i32,
            0,
            GL::RGBA,
            GL::UNSIGNED_BYTE,
            None,
        )
        .map_err(|e| StageError::Resource(format!("texture storage: {e:?}")))?;
        for (param, value) in [
            (GL::TEXTURE_MIN_FILTER, GL::LINEAR),
            (GL::TEXTURE_MAG_FILTER, GL::LINEAR),
            (GL::TEXTURE_WRAP_S, GL::CLAMP_TO_EDGE),
            (GL::TEXTURE_WRAP_T, GL::CLAMP_TO_EDGE),
        ] {
            gl.tex_parameteri(GL::TEXTURE_2D, param, value as i32);
        }

        let framebuffer = gl
            .create_framebuffer()
            .ok_or_else(|| StageError::Resource("framebuffer".into()))?;
        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&framebuffer));
        gl.framebuffer_texture_2d(
            GL::FRAMEBUFFER,
            GL::COLOR_ATTACHMENT0,
            GL::TEXTURE_2D,
            Some(&texture),
            0,
        );

        let depth = if with_depth {
            let rb = gl
                .create_renderbuffer()
                .ok_or_else(|| StageError::Resource("depth renderbuffer".into()))?;
            gl.bind_renderbuffer(GL::RENDERBUFFER, Some(&rb));
            gl.renderbuffer_storage(
                GL::RENDERBUFFER,
                GL::DEPTH_COMPONENT24,
                size.width as i32,
                size.height as i32,
            );
            gl.framebuffer_renderbuffer(
                GL::FRAMEBUFFER,
                GL::DEPTH_ATTACHMENT,
                GL::RENDERBUFFER,
                Some(&rb),
            );
            Some(rb)
        } else {
            None
        };

        let status = gl.check_framebuffer_status(GL::FRAMEBUFFER);
        gl.bind_framebuffer(GL::FRAMEBUFFER, None);
        gl.bind_texture(GL::TEXTURE_2D, None);
        let target = Self {
            framebuffer,
            texture,
            depth,
            size,
        };
        if status != GL::FRAMEBUFFER_COMPLETE {
            target.delete(gl);
            return Err(StageError::Resource(format!(
                "complete framebuffer {}x{} (status {status:#x})",
                size.width, size.height
            )));
        }
        Ok(target)
    }

    /// Binds the framebuffer and sets the viewport to its size.
    pub fn bind(&self, gl: &GL) {
        gl.bind_framebuffer(GL::FRAMEBUFFER, Some(&self.framebuffer));
        gl.viewport(0, 0, self.size.width as i32, self.size.height as i32);
    }

    pub fn delete(&self, gl: &GL) {
        gl.delete_framebuffer(Some(&self.framebuffer));
        gl.delete_texture(Some(&self.texture));
        if let Some(rb) = &self.depth {
            gl.delete_renderbuffer(Some(rb));
        }
    }
}

/// Every offscreen buffer the chain needs, sized from one [`PostPipeline`].
///
/// Layout of `all`: scene, bright pass, then a horizontal/vertical pair
/// per bloom level, then the bloom composite and the streak output.
pub struct Targets {
    all: Vec<Target>,
    levels: usize,
}

impl Targets {
    /// Creates every target or none: a failure deletes what was made.
    pub fn new(gl: &GL, pipeline: &PostPipeline) -> Result<Self, StageError> {
        let bloom_size = pipeline.pass(PassKind::Bloom).size;
        let mut layout = vec![(pipeline.pass(PassKind::Scene).size, true), (bloom_size, false)];
        for mip in pipeline.bloom_mips() {
            layout.push((*mip, false));
            layout.push((*mip, false));
        }
        layout.push((bloom_size, false));
        layout.push((pipeline.pass(PassKind::Streak).size, false));

        let mut all = Vec::with_capacity(layout.len());
        for (size, depth) in layout {
            match Target::new(gl, size, depth) {
                Ok(target) => all.push(target),
                Err(e) => {
                    for target in &all {
                        target.delete(gl);
                    }
                    return Err(e);
                }
            }
        }
        Ok(Self {
            all,
            levels: pipeline.bloom_mips().len(),
        })
    }

    pub fn scene(&self) -> &Target {
        &self.all[0]
    }

    pub fn bright(&self) -> &Target {
        &self.all[1]
    }

    pub fn level_count(&self) -> usize {
        self.levels
    }

    /// Horizontal and vertical blur targets of bloom level `level`.
    pub fn level(&self, level: usize) -> (&Target, &Target) {
        (&self.all[2 + 2 * level], &self.all[3 + 2 * level])
    }

    pub fn bloom(&self) -> &Target {
        &self.all[2 + 2 * self.levels]
    }

    pub fn streak(&self) -> &Target {
        &self.all[3 + 2 * self.levels]
    }

    pub fn delete(&self, gl: &GL) {
        for target in &self.all {
            target.delete(gl);
        }
    }
}
