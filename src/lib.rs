//! Scroll-driven camera flight through a procedural neon city.
//!
//! The page scroll offset is mapped to a progress value in `[0, 1]`; the
//! camera trails a scripted Catmull-Rom path, overlays switch on per section,
//! the scene animates and a four-pass post chain renders each frame.
//!
//! Everything outside `wasm` is platform neutral and is driven on the host
//! by tests through the [`lifecycle::Host`] and [`lifecycle::FrameRenderer`]
//! seams.

pub mod animate;
pub mod camera;
pub mod config;
pub mod error;
pub mod frame;
pub mod lifecycle;
pub mod path;
pub mod post;
pub mod progress;
pub mod scene;
pub mod sections;

pub use config::StageConfig;
pub use error::StageError;
pub use lifecycle::{FlightController, FrameRenderer, Host};

// Only compile wasm-specific code when targeting wasm32.

#[cfg(target_arch = "wasm32")]
mod wasm {
    mod driver;
    mod host;
    mod render;
    mod shaders;
    mod targets;

    pub use driver::Stage;

    use wasm_bindgen::prelude::*;

    const CONTAINER_ID: &str = "neon-grid";
    const CONFIG_ID: &str = "neon-grid-config";

    thread_local! {
        static AUTO_STAGE: std::cell::RefCell<Option<Stage>> = const { std::cell::RefCell::new(None) };
    }

    #[wasm_bindgen(start)]
    pub fn main() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).ok();

        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::warn!("no document; stage not mounted");
            return Ok(());
        };
        if document.get_element_by_id(CONTAINER_ID).is_none() {
            log::info!("no #{CONTAINER_ID} container on this page");
            return Ok(());
        }

        let config = driver::page_config(&document, CONFIG_ID);
        match Stage::mount_with(CONTAINER_ID, config) {
            Ok(stage) => AUTO_STAGE.with(|slot| *slot.borrow_mut() = Some(stage)),
            Err(e) => log::warn!("stage not mounted: {e}"),
        }
        Ok(())
    }

    /// Tears down the stage mounted at startup, if any.
    #[wasm_bindgen(js_name = unmountAutoStage)]
    pub fn unmount_auto_stage() {
        AUTO_STAGE.with(|slot| {
            if let Some(stage) = slot.borrow_mut().take() {
                stage.destroy();
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::Stage;
