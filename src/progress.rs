//! Scroll progress source and the virtual scroll extent the stage imposes on
//! the document for as long as it is mounted.

/// Normalized progress for a scroll offset.
///
/// `clamp(offset / (extent - viewport_height), 0, 1)`. Missing readings,
/// non-finite values and a non-positive scroll range all yield `0.0`.
pub fn scroll_progress(offset: Option<f64>, extent: f64, viewport_height: Option<f64>) -> f32 {
    let (Some(offset), Some(viewport)) = (offset, viewport_height) else {
        return 0.0;
    };
    let range = extent - viewport;
    if !offset.is_finite() || !range.is_finite() || range <= 0.0 {
        return 0.0;
    }
    (offset / range).clamp(0.0, 1.0) as f32
}

/// The document-height side effect, scoped to one mount.
///
/// [`ScrollExtent::apply`] remembers whatever height style the document had
/// before; [`ScrollExtent::revert`] hands it back exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollExtent {
    extent: f64,
    saved: Option<Option<String>>,
}

impl ScrollExtent {
    pub fn new(extent: f64) -> Self {
        Self {
            extent,
            saved: None,
        }
    }

    pub fn extent(&self) -> f64 {
        self.extent
    }

    pub fn is_applied(&self) -> bool {
        self.saved.is_some()
    }

    /// CSS value written to the document height.
    pub fn css_value(&self) -> String {
        format!("{}px", self.extent)
    }

    /// Records the previous value. A second apply keeps the first snapshot.
    pub fn apply(&mut self, previous: Option<String>) {
        if self.saved.is_none() {
            self.saved = Some(previous);
        }
    }

    /// Returns the value to restore, or `None` if nothing was applied.
    pub fn revert(&mut self) -> Option<Option<String>> {
        self.saved.take()
    }
}
