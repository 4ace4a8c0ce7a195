//! Section markers: progress intervals that decide which text overlay is
//! shown. Visibility is a discrete switch; any fade is owned by the page.

use serde::{Deserialize, Serialize};

/// One end of a marker interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    /// Excludes the value itself.
    Open(f32),
    /// Includes the value itself.
    Closed(f32),
}

impl Bound {
    pub fn value(self) -> f32 {
        match self {
            Bound::Open(v) | Bound::Closed(v) => v,
        }
    }

    fn admits_above(self, t: f32) -> bool {
        match self {
            Bound::Open(v) => t > v,
            Bound::Closed(v) => t >= v,
        }
    }

    fn admits_below(self, t: f32) -> bool {
        match self {
            Bound::Open(v) => t < v,
            Bound::Closed(v) => t <= v,
        }
    }
}

/// A named progress interval bound to one overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMarker {
    pub id: String,
    pub start: Bound,
    pub end: Bound,
}

impl SectionMarker {
    pub fn new(id: impl Into<String>, start: Bound, end: Bound) -> Self {
        Self {
            id: id.into(),
            start,
            end,
        }
    }

    pub fn contains(&self, t: f32) -> bool {
        self.start.admits_above(t) && self.end.admits_below(t)
    }
}

/// The markers the landing page ships with. Gaps between them show nothing.
pub fn default_markers() -> Vec<SectionMarker> {
    vec![
        SectionMarker::new("landing", Bound::Closed(0.0), Bound::Open(0.15)),
        SectionMarker::new("web", Bound::Open(0.22), Bound::Open(0.45)),
        SectionMarker::new("design", Bound::Open(0.47), Bound::Open(0.70)),
        SectionMarker::new("video", Bound::Open(0.72), Bound::Open(0.95)),
        SectionMarker::new("contact", Bound::Open(0.96), Bound::Closed(1.0)),
    ]
}

/// Per-section opacity targets, in marker order.
///
/// This is the signal external overlays read. [`OverlayState::update`]
/// reports which entries changed so hosts can skip redundant style writes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayState {
    entries: Vec<(String, f32)>,
    primed: bool,
}

impl OverlayState {
    pub fn new(markers: &[SectionMarker]) -> Self {
        Self {
            entries: markers.iter().map(|m| (m.id.clone(), 0.0)).collect(),
            primed: false,
        }
    }

    /// Re-evaluates every marker at `t`. Returns the indices whose opacity
    /// changed; the first call reports all of them.
    pub fn update(&mut self, markers: &[SectionMarker], t: f32) -> Vec<usize> {
        let mut changed = Vec::new();
        for (i, (marker, entry)) in markers.iter().zip(self.entries.iter_mut()).enumerate() {
            let opacity = if marker.contains(t) { 1.0 } else { 0.0 };
            if !self.primed || entry.1 != opacity {
                entry.1 = opacity;
                changed.push(i);
            }
        }
        self.primed = true;
        changed
    }

    pub fn opacity(&self, id: &str) -> Option<f32> {
        self.entries
            .iter()
            .find(|(entry_id, _)| entry_id == id)
            .map(|(_, o)| *o)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.opacity(id) == Some(1.0)
    }

    pub fn entries(&self) -> &[(String, f32)] {
        &self.entries
    }

    /// Ids currently at full opacity.
    pub fn visible(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, o)| *o == 1.0)
            .map(|(id, _)| id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible_at(t: f32) -> Vec<String> {
        let markers = default_markers();
        let mut state = OverlayState::new(&markers);
        state.update(&markers, t);
        state.visible().map(str::to_owned).collect()
    }

    #[test]
    fn literal_thresholds_pick_one_section() {
        assert_eq!(visible_at(0.10), vec!["landing"]);
        assert_eq!(visible_at(0.30), vec!["web"]);
        assert_eq!(visible_at(0.60), vec!["design"]);
        assert_eq!(visible_at(0.80), vec!["video"]);
        assert_eq!(visible_at(0.99), vec!["contact"]);
    }

    #[test]
    fn gaps_show_nothing() {
        for t in [0.15, 0.20, 0.22, 0.46, 0.71, 0.955] {
            assert!(visible_at(t).is_empty(), "t={t} should be a gap");
        }
    }

    #[test]
    fn closed_ends_include_extremes() {
        assert_eq!(visible_at(0.0), vec!["landing"]);
        assert_eq!(visible_at(1.0), vec!["contact"]);
    }

    #[test]
    fn update_reports_only_changes_after_first_call() {
        let markers = default_markers();
        let mut state = OverlayState::new(&markers);
        assert_eq!(state.update(&markers, 0.05), vec![0, 1, 2, 3, 4]);
        assert!(state.update(&markers, 0.06).is_empty());
        assert_eq!(state.update(&markers, 0.30), vec![0, 1]);
        assert!(state.is_visible("web"));
        assert_eq!(state.opacity("landing"), Some(0.0));
        assert_eq!(state.opacity("missing"), None);
    }

    #[test]
    fn bounds_deserialize_from_tagged_json() {
        let marker: SectionMarker =
            serde_json::from_str(r#"{"id":"web","start":{"open":0.22},"end":{"closed":0.45}}"#)
                .unwrap();
        assert_eq!(marker.start, Bound::Open(0.22));
        assert!(marker.contains(0.45));
        assert!(!marker.contains(0.22));
    }
}
