//! Overlay sizing and trigger band floors
//!
//! The panel grows out of the top edge of a display. It must always be wider
//! than a physical cutout, and the trigger band feeding the evaluator must never
//! be narrower than what the user can reasonably hit.

use serde::{Deserialize, Serialize};

use crate::constants::layout;
use crate::display::Display;
use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySizing {
    /// Narrowest opened panel, in pixels
    pub min_width: f64,
    /// Extra width added around a cutout
    pub min_width_extra: f64,
    /// Opened height as a multiple of the reserved strip
    pub height_multiplier: f64,
    pub corner_radius: f64,
}

impl Default for OverlaySizing {
    fn default() -> Self {
        Self {
            min_width: layout::MIN_WIDTH,
            min_width_extra: layout::MIN_WIDTH_EXTRA,
            height_multiplier: layout::HEIGHT_MULTIPLIER,
            corner_radius: layout::CORNER_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OverlayLayout {
    pub sizing: OverlaySizing,
    /// Absolute floor for the trigger band width
    pub min_trigger_width: f64,
    /// Margin added on top of the cutout width for the band floor
    pub trigger_margin: f64,
}

impl OverlayLayout {
    /// Opened panel size (without corner flares) for `display`
    pub fn opened_size(&self, display: &Display) -> (f64, f64) {
        let cutout = display.cutout_width.max(0.0);
        let width = self
            .sizing
            .min_width
            .max(cutout + self.sizing.min_width_extra)
            .max(cutout * layout::CUTOUT_WIDEN_FACTOR);
        let strip = display.reserved_strip_height.max(0.0);
        let height = (strip * self.sizing.height_multiplier).max(strip);
        (width, height)
    }

    /// Screen-space frame of the opened panel, centered on the top edge
    pub fn frame(&self, display: &Display) -> Rect {
        let (width, height) = self.opened_size(display);
        let total_width = width + self.sizing.corner_radius.max(0.0) * 2.0;
        Rect::new(
            display.bounds.center_x() - total_width / 2.0,
            display.bounds.top(),
            total_width,
            height,
        )
    }

    /// Raise `configured` so the band covers the cutout plus margin and the
    /// configured minimum. Capped at the full display width.
    pub fn trigger_ratio(&self, display: &Display, configured: f64) -> f64 {
        let width = display.bounds.width;
        if width <= 0.0 {
            return configured;
        }
        let floor_px = (display.cutout_width.max(0.0) + self.trigger_margin.max(0.0))
            .max(self.min_trigger_width.max(0.0));
        configured.max(floor_px / width).min(1.0)
    }
}
