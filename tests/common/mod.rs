//! In-memory page and renderer for driving `FlightController` on the host.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use neon_grid::camera::FlightCamera;
use neon_grid::lifecycle::{FrameRenderer, Host};
use neon_grid::post::{FrameSize, PostPipeline};
use neon_grid::scene::Scene;
use neon_grid::StageError;

#[derive(Debug)]
pub struct Page {
    pub container: Option<(u32, u32)>,
    pub pixel_ratio: f64,
    pub scroll: Option<f64>,
    pub viewport: Option<f64>,
    /// Inline height of the document body; `None` means unset.
    pub body_height: Option<String>,
    pub subscribed: bool,
    pub fail_subscribe: bool,
    pub overlay_writes: Vec<(String, f32)>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            container: Some((800, 600)),
            pixel_ratio: 1.0,
            scroll: Some(0.0),
            viewport: Some(1000.0),
            body_height: None,
            subscribed: false,
            fail_subscribe: false,
            overlay_writes: Vec::new(),
        }
    }
}

/// Shares its `Page` with the test, so effects stay visible after the
/// controller consumed the host.
#[derive(Clone, Default)]
pub struct FakeHost {
    pub page: Rc<RefCell<Page>>,
}

impl Host for FakeHost {
    fn container_size(&self) -> Option<(u32, u32)> {
        self.page.borrow().container
    }

    fn pixel_ratio(&self) -> f64 {
        self.page.borrow().pixel_ratio
    }

    fn scroll_offset(&self) -> Option<f64> {
        self.page.borrow().scroll
    }

    fn viewport_height(&self) -> Option<f64> {
        self.page.borrow().viewport
    }

    fn impose_document_height(&mut self, css: &str) -> Option<String> {
        self.page.borrow_mut().body_height.replace(css.to_string())
    }

    fn restore_document_height(&mut self, previous: Option<String>) {
        self.page.borrow_mut().body_height = previous;
    }

    fn subscribe(&mut self) -> Result<(), StageError> {
        let mut page = self.page.borrow_mut();
        if page.fail_subscribe {
            return Err(StageError::Subscription("listener refused".into()));
        }
        page.subscribed = true;
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.page.borrow_mut().subscribed = false;
    }

    fn set_overlay_opacity(&mut self, id: &str, opacity: f32) {
        self.page
            .borrow_mut()
            .overlay_writes
            .push((id.to_string(), opacity));
    }
}

#[derive(Debug, Default)]
pub struct Frames {
    pub uploads: usize,
    pub uploaded_entities: usize,
    /// CSS size, pass buffer sizes and bloom mips of each resize.
    pub resizes: Vec<((u32, u32), Vec<FrameSize>, Vec<FrameSize>)>,
    pub renders: usize,
    pub last_camera: Option<FlightCamera>,
    pub releases: usize,
    pub fail_upload: bool,
}

#[derive(Clone, Default)]
pub struct RecordingRenderer {
    pub frames: Rc<RefCell<Frames>>,
}

impl FrameRenderer for RecordingRenderer {
    fn upload(&mut self, scene: &Scene) -> Result<(), StageError> {
        let mut frames = self.frames.borrow_mut();
        if frames.fail_upload {
            return Err(StageError::Resource("vertex buffer".into()));
        }
        frames.uploads += 1;
        frames.uploaded_entities = scene.len();
        Ok(())
    }

    fn resize(&mut self, css: (u32, u32), pipeline: &PostPipeline) {
        let passes = pipeline.passes().iter().map(|p| p.size).collect();
        self.frames
            .borrow_mut()
            .resizes
            .push((css, passes, pipeline.bloom_mips().to_vec()));
    }

    fn render(&mut self, _scene: &Scene, camera: &FlightCamera, _pipeline: &PostPipeline) {
        let mut frames = self.frames.borrow_mut();
        frames.renders += 1;
        frames.last_camera = Some(camera.clone());
    }

    fn release(&mut self) {
        self.frames.borrow_mut().releases += 1;
    }
}
