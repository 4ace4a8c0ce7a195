//! Mount, resize, tick and teardown of the flight stage.
//!
//! [`FlightController`] owns every piece of mutable state: scene arena,
//! camera, post pipeline, overlay signal, frame loop, the document-height
//! effect and the window subscriptions. The page side is reached only
//! through the [`Host`] and [`FrameRenderer`] seams, so the whole lifecycle
//! runs on the host target against fakes.

use crate::animate;
use crate::camera::FlightCamera;
use crate::config::StageConfig;
use crate::error::StageError;
use crate::frame::{FrameLoop, LoopState, TickOutcome};
use crate::path::CameraPath;
use crate::post::{FrameSize, PostPipeline};
use crate::progress::{scroll_progress, ScrollExtent};
use crate::scene::{Scene, SceneBuilder};
use crate::sections::{OverlayState, SectionMarker};

/// The page the stage lives in.
///
/// Readings return `None` while layout is not ready; the controller treats
/// that as a neutral value and tries again next tick.
pub trait Host {
    /// Container size in CSS pixels.
    fn container_size(&self) -> Option<(u32, u32)>;

    fn pixel_ratio(&self) -> f64 {
        1.0
    }

    fn scroll_offset(&self) -> Option<f64>;

    fn viewport_height(&self) -> Option<f64>;

    /// Sets the document height and returns the inline value it replaced.
    fn impose_document_height(&mut self, css: &str) -> Option<String>;

    /// Puts back a value returned by [`Host::impose_document_height`].
    /// `None` means the document had no inline height.
    fn restore_document_height(&mut self, previous: Option<String>);

    /// Registers the resize and scroll listeners.
    fn subscribe(&mut self) -> Result<(), StageError>;

    fn unsubscribe(&mut self);

    fn set_overlay_opacity(&mut self, id: &str, opacity: f32);
}

/// The render surface and its GPU resources.
pub trait FrameRenderer {
    /// Creates GPU buffers for every entity in the scene.
    fn upload(&mut self, scene: &Scene) -> Result<(), StageError>;

    /// Resizes the surface to `css` pixels and every pass buffer to the
    /// sizes `pipeline` now reports.
    fn resize(&mut self, css: (u32, u32), pipeline: &PostPipeline);

    fn render(&mut self, scene: &Scene, camera: &FlightCamera, pipeline: &PostPipeline);

    /// Frees every GPU resource and detaches the surface from the page.
    fn release(&mut self);
}

pub struct FlightController<H: Host, R: FrameRenderer> {
    config: StageConfig,
    host: H,
    renderer: R,
    scene: Scene,
    camera: FlightCamera,
    path: CameraPath,
    pipeline: PostPipeline,
    sections: Vec<SectionMarker>,
    overlays: OverlayState,
    frame_loop: FrameLoop,
    extent: ScrollExtent,
    subscribed: bool,
    released: bool,
    progress: f32,
}

impl<H: Host, R: FrameRenderer> FlightController<H, R> {
    /// Builds the stage inside the host container and starts the loop.
    ///
    /// On error nothing stays behind: the renderer is released and no
    /// listener or document style is left in place.
    pub fn mount(mut host: H, mut renderer: R, config: StageConfig) -> Result<Self, StageError> {
        let prepared = Self::prepare(&mut host, &mut renderer, &config);
        let (path, scene, pipeline, css) = match prepared {
            Ok(parts) => parts,
            Err(e) => {
                renderer.release();
                return Err(e);
            }
        };

        if let Err(e) = host.subscribe() {
            host.unsubscribe();
            renderer.release();
            return Err(e);
        }

        let mut extent = ScrollExtent::new(config.scroll.virtual_extent);
        let previous = host.impose_document_height(&extent.css_value());
        extent.apply(previous);

        let camera_config = &config.camera;
        let mut camera = FlightCamera::new(
            camera_config.fov_degrees,
            1.0,
            camera_config.near,
            camera_config.far,
        );
        camera.set_viewport(css.0, css.1);
        let progress = scroll_progress(host.scroll_offset(), extent.extent(), host.viewport_height());
        let start = path.sample(progress);
        camera.position = start.position;
        camera.look_at(start.look_at);

        let mut frame_loop = FrameLoop::new(config.max_frame_delta);
        frame_loop.start();

        log::info!(
            "Stage mounted: {}x{} css, {}x{} buffers, {} entities",
            css.0,
            css.1,
            pipeline.size().width,
            pipeline.size().height,
            scene.len()
        );

        Ok(Self {
            sections: config.sections.clone(),
            overlays: OverlayState::new(&config.sections),
            config,
            host,
            renderer,
            scene,
            camera,
            path,
            pipeline,
            frame_loop,
            extent,
            subscribed: true,
            released: false,
            progress,
        })
    }

    fn prepare(
        host: &mut H,
        renderer: &mut R,
        config: &StageConfig,
    ) -> Result<(CameraPath, Scene, PostPipeline, (u32, u32)), StageError> {
        config.validate()?;
        let css = host
            .container_size()
            .filter(|(w, h)| *w > 0 && *h > 0)
            .ok_or(StageError::MissingContainer)?;
        let path = CameraPath::new(
            config.path.positions.clone(),
            config.path.look_at.clone(),
            config.path.tension,
        )?;
        let scene = SceneBuilder::new(&config.scene, config.seed).build();
        let size = device_size(host, config, css);
        let pipeline = PostPipeline::new(config.post.clone(), size);
        renderer.upload(&scene)?;
        renderer.resize(css, &pipeline);
        Ok((path, scene, pipeline, css))
    }

    /// Runs one tick at `now_ms` (display timestamp in milliseconds).
    pub fn frame(&mut self, now_ms: f64) -> TickOutcome {
        if self.released {
            return TickOutcome::Halt;
        }
        let Some(time) = self.frame_loop.advance(now_ms) else {
            return TickOutcome::Halt;
        };

        let t = scroll_progress(
            self.host.scroll_offset(),
            self.extent.extent(),
            self.host.viewport_height(),
        );
        self.progress = t;

        let goal = self.path.sample(t);
        self.camera.approach(goal.position, self.config.camera.smoothing);
        self.camera.look_at(goal.look_at);

        for index in self.overlays.update(&self.sections, t) {
            let (id, opacity) = &self.overlays.entries()[index];
            self.host.set_overlay_opacity(id, *opacity);
        }

        animate::advance(&mut self.scene, time);
        self.renderer.render(&self.scene, &self.camera, &self.pipeline);
        TickOutcome::Reschedule
    }

    /// Re-reads the container size and resizes the surface, the camera
    /// projection and every pass buffer in one step. Returns `false` when
    /// stopped or when the container has no size yet.
    pub fn resize(&mut self) -> bool {
        if self.released || !self.frame_loop.is_running() {
            return false;
        }
        let Some(css) = self.host.container_size().filter(|(w, h)| *w > 0 && *h > 0) else {
            return false;
        };
        let size = device_size(&self.host, &self.config, css);
        self.camera.set_viewport(css.0, css.1);
        self.pipeline.resize(size);
        self.renderer.resize(css, &self.pipeline);
        log::debug!(
            "Stage resized: {}x{} css, {}x{} buffers",
            css.0,
            css.1,
            size.width,
            size.height
        );
        true
    }

    /// Stops the loop, drops the listeners, restores the document height and
    /// releases the renderer. Safe to call more than once.
    pub fn unmount(&mut self) {
        if self.released {
            return;
        }
        self.frame_loop.stop();
        if self.subscribed {
            self.host.unsubscribe();
            self.subscribed = false;
        }
        if let Some(previous) = self.extent.revert() {
            self.host.restore_document_height(previous);
        }
        self.renderer.release();
        self.scene.clear();
        self.released = true;
        log::info!("Stage unmounted after {} ticks", self.frame_loop.ticks());
    }

    pub fn state(&self) -> LoopState {
        self.frame_loop.state()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Progress computed by the latest tick.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn camera(&self) -> &FlightCamera {
        &self.camera
    }

    pub fn overlays(&self) -> &OverlayState {
        &self.overlays
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn pipeline(&self) -> &PostPipeline {
        &self.pipeline
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

impl<H: Host, R: FrameRenderer> Drop for FlightController<H, R> {
    fn drop(&mut self) {
        self.unmount();
    }
}

fn device_size<H: Host>(host: &H, config: &StageConfig, css: (u32, u32)) -> FrameSize {
    let ratio = host.pixel_ratio().min(config.camera.max_pixel_ratio);
    FrameSize::scaled(css.0, css.1, ratio)
}
