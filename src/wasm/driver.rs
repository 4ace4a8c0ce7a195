//! requestAnimationFrame driver and the JS-facing `Stage` handle.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::{Document, Window};

use super::host::WebHost;
use super::render::GlRenderer;
use crate::config::StageConfig;
use crate::error::StageError;
use crate::frame::TickOutcome;
use crate::lifecycle::FlightController;

type Controller = FlightController<WebHost, GlRenderer>;

struct Shared {
    window: Window,
    controller: RefCell<Option<Controller>>,
    frame_id: Cell<Option<i32>>,
    tick: RefCell<Option<Closure<dyn FnMut(f64)>>>,
}

impl Shared {
    fn request_frame(&self) {
        let tick = self.tick.borrow();
        let Some(callback) = tick.as_ref() else {
            return;
        };
        match self
            .window
            .request_animation_frame(callback.as_ref().unchecked_ref())
        {
            Ok(id) => self.frame_id.set(Some(id)),
            Err(e) => log::warn!("animation frame not scheduled: {e:?}"),
        }
    }

    fn tick(weak: &Weak<Shared>, now_ms: f64) {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        shared.frame_id.set(None);
        let outcome = {
            let Ok(mut slot) = shared.controller.try_borrow_mut() else {
                return;
            };
            let Some(controller) = slot.as_mut() else {
                return;
            };
            if controller.host().take_resize() {
                controller.resize();
            }
            controller.frame(now_ms)
        };
        if outcome == TickOutcome::Reschedule {
            shared.request_frame();
        }
    }
}

/// A mounted flight stage. Dropping or destroying it tears the stage down.
#[wasm_bindgen]
pub struct Stage {
    shared: Rc<Shared>,
}

#[wasm_bindgen]
impl Stage {
    /// Mounts into the element with id `container_id`. `config_json` may
    /// override any subset of the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(container_id: &str, config_json: Option<String>) -> Result<Stage, JsValue> {
        let config = match config_json {
            Some(src) => StageConfig::from_json(&src).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => StageConfig::default(),
        };
        Self::mount_with(container_id, config).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Progress computed by the latest tick, or 0 once destroyed.
    pub fn progress(&self) -> f32 {
        self.shared
            .controller
            .try_borrow()
            .ok()
            .and_then(|slot| slot.as_ref().map(|c| c.progress()))
            .unwrap_or(0.0)
    }

    #[wasm_bindgen(js_name = sectionOpacity)]
    pub fn section_opacity(&self, id: &str) -> f32 {
        self.shared
            .controller
            .try_borrow()
            .ok()
            .and_then(|slot| slot.as_ref().and_then(|c| c.overlays().opacity(id)))
            .unwrap_or(0.0)
    }

    /// Cancels the pending frame and unmounts. Safe to call repeatedly.
    pub fn destroy(&self) {
        if let Some(id) = self.shared.frame_id.take() {
            self.shared.window.cancel_animation_frame(id).ok();
        }
        let controller = self.shared.controller.borrow_mut().take();
        if let Some(mut controller) = controller {
            controller.unmount();
        }
        self.shared.tick.borrow_mut().take();
    }
}

impl Stage {
    pub fn mount_with(container_id: &str, config: StageConfig) -> Result<Stage, StageError> {
        let window = web_sys::window().ok_or(StageError::MissingContainer)?;
        let document = window.document().ok_or(StageError::MissingContainer)?;
        let container = document
            .get_element_by_id(container_id)
            .ok_or(StageError::MissingContainer)?;

        let renderer = GlRenderer::new(&document, &container, config.scene.palette.background)?;
        let host = WebHost::new(window.clone(), document, container);
        let controller = FlightController::mount(host, renderer, config)?;

        let shared = Rc::new(Shared {
            window,
            controller: RefCell::new(Some(controller)),
            frame_id: Cell::new(None),
            tick: RefCell::new(None),
        });
        let weak = Rc::downgrade(&shared);
        let tick = Closure::wrap(Box::new(move |now: f64| Shared::tick(&weak, now)) as Box<dyn FnMut(f64)>);
        *shared.tick.borrow_mut() = Some(tick);
        shared.request_frame();

        Ok(Stage { shared })
    }
}

impl Drop for Stage {
    fn drop(&mut self) {
        self.destroy();
    }
}

/// Reads the JSON config block with id `id`. A missing block yields the
/// defaults; a broken one is logged and also yields the defaults.
pub fn page_config(document: &Document, id: &str) -> StageConfig {
    let Some(src) = document.get_element_by_id(id).and_then(|el| el.text_content()) else {
        return StageConfig::default();
    };
    StageConfig::from_json(&src).unwrap_or_else(|e| {
        log::warn!("ignoring #{id}: {e}");
        StageConfig::default()
    })
}
