//! Boundary between the hover coordinator and whatever draws the panel

pub mod layout;

use crate::actions::SwitchAction;
use crate::display::Display;
use crate::geometry::{Point, Rect};

pub use layout::{OverlayLayout, OverlaySizing};

/// Content hosted by the overlay: a row of action buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchPanel {
    pub buttons: Vec<SwitchAction>,
}

impl Default for SwitchPanel {
    fn default() -> Self {
        Self {
            buttons: vec![
                SwitchAction::Left,
                SwitchAction::MissionControl,
                SwitchAction::Right,
            ],
        }
    }
}

impl SwitchPanel {
    /// Horizontal cells of equal width, one per button
    pub fn cells(&self, bounds: Rect) -> Vec<(SwitchAction, Rect)> {
        let count = self.buttons.len().max(1) as f64;
        let cell_width = bounds.width / count;
        self.buttons
            .iter()
            .enumerate()
            .map(|(i, action)| {
                let x = bounds.x + cell_width * i as f64;
                (*action, Rect::new(x, bounds.y, cell_width, bounds.height))
            })
            .collect()
    }

    /// Which button sits under `point`, if any
    pub fn hit_test(&self, bounds: Rect, point: Point) -> Option<SwitchAction> {
        self.cells(bounds)
            .into_iter()
            .find(|(_, cell)| cell.contains(point))
            .map(|(action, _)| action)
    }
}

/// Controls the presented panel. Implementations own the window/surface.
///
/// `is_visible` must flip to `false` as soon as `dismiss` is called, even if
/// the surface keeps animating out for a while before its resources go away.
/// `present` is only called while nothing is shown; same-display
/// re-presentation is filtered out by the coordinator, not here.
pub trait OverlaySurface {
    fn present(&mut self, display: &Display, content: &SwitchPanel);

    fn dismiss(&mut self);

    fn is_visible(&self) -> bool;

    fn current_bounds(&self) -> Option<Rect>;

    /// Move the panel to another display as a single step
    fn retarget(&mut self, display: &Display, content: &SwitchPanel) {
        self.dismiss();
        self.present(display, content);
    }
}
