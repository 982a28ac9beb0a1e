use crate::display::Display;
use crate::geometry::{Point, Rect};

/// Result of testing one pointer sample against a display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ZoneHit {
    pub in_trigger_zone: bool,
    pub in_overlay: bool,
}

impl ZoneHit {
    /// Either region keeps the overlay wanted
    pub fn wants_overlay(&self) -> bool {
        self.in_trigger_zone || self.in_overlay
    }
}

/// Test `point` against the centered trigger band of `display` and against the
/// open overlay, if any. `trigger_width_ratio` is expected to be precomputed by
/// the overlay layout (band floors already applied).
pub fn evaluate(
    point: Point,
    display: &Display,
    trigger_width_ratio: f64,
    overlay_bounds: Option<Rect>,
) -> ZoneHit {
    ZoneHit {
        in_trigger_zone: in_trigger_band(point, display, trigger_width_ratio),
        in_overlay: overlay_bounds.is_some_and(|bounds| bounds.contains(point)),
    }
}

fn in_trigger_band(point: Point, display: &Display, ratio: f64) -> bool {
    let bounds = display.bounds;
    if bounds.is_empty() {
        return false;
    }

    let strip_top = bounds.top();
    let strip_bottom = bounds.top() + display.reserved_strip_height.max(0.0);
    let in_strip = point.y >= strip_top && point.y <= strip_bottom;

    let half_width = bounds.width * ratio / 2.0;
    let in_center = (point.x - bounds.center_x()).abs() <= half_width;

    in_strip && in_center
}
