//! Display model and enumeration seam
//!
//! Displays are queried fresh on every pointer evaluation because outputs can
//! be plugged and unplugged at any time. Nothing here caches geometry.

use std::fmt;

use crate::geometry::{Point, Rect};

/// Stable identity of a physical output (RandR monitor name atom on X11)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayId(pub u32);

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Display {
    pub id: DisplayId,
    pub name: String,
    pub bounds: Rect,
    /// Height of the system bar band at the top edge
    pub reserved_strip_height: f64,
    /// Width of a physical notch/cutout, 0 when the panel has none
    pub cutout_width: f64,
    pub primary: bool,
}

impl Display {
    pub fn same_output(&self, other: &Display) -> bool {
        self.id == other.id
    }

    /// Frame, strip and cutout match; identity is not compared
    pub fn same_geometry(&self, other: &Display) -> bool {
        self.bounds == other.bounds
            && self.reserved_strip_height == other.reserved_strip_height
            && self.cutout_width == other.cutout_width
    }
}

/// Host query for the current set of displays
pub trait DisplaySource {
    fn displays(&mut self) -> Vec<Display>;
}

/// Pick the display under `point`, falling back to the primary display and
/// then to whatever was enumerated first
pub fn resolve_display(displays: &[Display], point: Point) -> Option<&Display> {
    displays
        .iter()
        .find(|display| display.bounds.contains(point))
        .or_else(|| displays.iter().find(|display| display.primary))
        .or_else(|| displays.first())
}
