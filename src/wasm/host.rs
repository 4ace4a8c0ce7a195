//! Browser implementation of [`Host`] on top of `window` and `document`.

use std::cell::Cell;
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{AddEventListenerOptions, Document, Element, HtmlElement, Window};

use crate::error::StageError;
use crate::lifecycle::Host;

struct Listeners {
    resize: Closure<dyn FnMut()>,
    scroll: Closure<dyn FnMut()>,
}

/// The resize listener only flags the event; the driver applies it on the
/// next tick, before that tick samples progress or renders.
pub struct WebHost {
    window: Window,
    document: Document,
    container: Element,
    /// Latest `scrollY` seen by the scroll listener.
    scroll: Rc<Cell<Option<f64>>>,
    resize_pending: Rc<Cell<bool>>,
    listeners: Option<Listeners>,
}

impl WebHost {
    pub fn new(window: Window, document: Document, container: Element) -> Self {
        Self {
            window,
            document,
            container,
            scroll: Rc::new(Cell::new(None)),
            resize_pending: Rc::new(Cell::new(false)),
            listeners: None,
        }
    }

    /// Returns whether a resize event arrived since the last call.
    pub fn take_resize(&self) -> bool {
        self.resize_pending.replace(false)
    }

    fn body_style(&self) -> Option<web_sys::CssStyleDeclaration> {
        self.document.body().map(|body| body.style())
    }
}

impl Host for WebHost {
    fn container_size(&self) -> Option<(u32, u32)> {
        let (w, h) = (self.container.client_width(), self.container.client_height());
        (w > 0 && h > 0).then_some((w as u32, h as u32))
    }

    fn pixel_ratio(&self) -> f64 {
        self.window.device_pixel_ratio()
    }

    fn scroll_offset(&self) -> Option<f64> {
        self.scroll.get().or_else(|| self.window.scroll_y().ok())
    }

    fn viewport_height(&self) -> Option<f64> {
        self.window.inner_height().ok()?.as_f64()
    }

    fn impose_document_height(&mut self, css: &str) -> Option<String> {
        let style = self.body_style()?;
        let previous = style
            .get_property_value("height")
            .ok()
            .filter(|v| !v.is_empty());
        if let Err(e) = style.set_property("height", css) {
            log::warn!("document height not applied: {e:?}");
        }
        previous
    }

    fn restore_document_height(&mut self, previous: Option<String>) {
        let Some(style) = self.body_style() else {
            return;
        };
        let restored = match previous {
            Some(value) => style.set_property("height", &value),
            None => style.remove_property("height").map(|_| ()),
        };
        if let Err(e) = restored {
            log::warn!("document height not restored: {e:?}");
        }
    }

    fn subscribe(&mut self) -> Result<(), StageError> {
        if self.listeners.is_some() {
            return Ok(());
        }
        let pending = self.resize_pending.clone();
        let resize = Closure::wrap(Box::new(move || pending.set(true)) as Box<dyn FnMut()>);

        let cache = self.scroll.clone();
        let window = self.window.clone();
        let scroll = Closure::wrap(Box::new(move || {
            cache.set(window.scroll_y().ok());
        }) as Box<dyn FnMut()>);

        self.window
            .add_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())
            .map_err(|e| StageError::Subscription(format!("resize: {e:?}")))?;

        let options = AddEventListenerOptions::new();
        options.set_passive(true);
        if let Err(e) = self
            .window
            .add_event_listener_with_callback_and_add_event_listener_options(
                "scroll",
                scroll.as_ref().unchecked_ref(),
                &options,
            )
        {
            self.window
                .remove_event_listener_with_callback("resize", resize.as_ref().unchecked_ref())
                .ok();
            return Err(StageError::Subscription(format!("scroll: {e:?}")));
        }

        self.listeners = Some(Listeners { resize, scroll });
        Ok(())
    }

    fn unsubscribe(&mut self) {
        let Some(listeners) = self.listeners.take() else {
            return;
        };
        self.window
            .remove_event_listener_with_callback("resize", listeners.resize.as_ref().unchecked_ref())
            .ok();
        self.window
            .remove_event_listener_with_callback("scroll", listeners.scroll.as_ref().unchecked_ref())
            .ok();
        self.scroll.set(None);
        self.resize_pending.set(false);
    }

    fn set_overlay_opacity(&mut self, id: &str, opacity: f32) {
        let Ok(nodes) = self
            .document
            .query_selector_all(&format!("[data-section=\"{id}\"]"))
        else {
            return;
        };
        for i in 0..nodes.length() {
            if let Some(el) = nodes.item(i).and_then(|n| n.dyn_into::<HtmlElement>().ok()) {
                el.style().set_property("opacity", &opacity.to_string()).ok();
            }
        }
    }
}
