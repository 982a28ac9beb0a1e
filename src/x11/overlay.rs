use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use x11rb::connection::Connection;
use x11rb::protocol::Event;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use crate::actions::SwitchAction;
use crate::color::HexColor;
use crate::config::Config;
use crate::constants::x11;
use crate::display::{Display, DisplayId};
use crate::geometry::{Point, Rect};
use crate::overlay::{OverlayLayout, OverlaySurface, SwitchPanel};

use super::{to_i16, to_u16, AppContext, CachedAtoms};

/// Gap between button cells and around the row, in pixels
const BUTTON_GAP: f64 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub background: HexColor,
    pub button: HexColor,
    /// How long a dismissed window lingers before it is destroyed
    pub release_delay: Duration,
}

impl OverlayStyle {
    pub fn from_config(config: &Config) -> Self {
        Self {
            background: config.background(),
            button: config.button(),
            release_delay: config.release_delay(),
        }
    }
}

/// One mapped (or retiring) overlay window and its server-side resources
struct Panel {
    window: Window,
    gc: Gcontext,
    display: DisplayId,
    bounds: Rect,
    content: SwitchPanel,
}

/// Button row area: the frame minus the rounded shoulders on each side
fn content_area(bounds: Rect, corner_radius: f64) -> Rect {
    Rect::new(
        bounds.x + corner_radius,
        bounds.y,
        (bounds.width - 2.0 * corner_radius).max(0.0),
        bounds.height,
    )
}

/// Cell rectangle shrunk by the gap, relative to the window origin
fn button_rect(cell: Rect, origin: Rect) -> Rectangle {
    Rectangle {
        x: to_i16(cell.x - origin.x + BUTTON_GAP / 2.0),
        y: to_i16(cell.y - origin.y + BUTTON_GAP),
        width: to_u16(cell.width - BUTTON_GAP),
        height: to_u16(cell.height - 2.0 * BUTTON_GAP),
    }
}

/// Override-redirect panel window at the top center of a display
pub struct X11Overlay<'a> {
    conn: &'a RustConnection,
    screen: &'a Screen,
    atoms: &'a CachedAtoms,
    layout: OverlayLayout,
    style: OverlayStyle,
    shown: Option<Panel>,
    retiring: Vec<(Panel, Instant)>,
}

impl<'a> X11Overlay<'a> {
    pub fn new(ctx: &AppContext<'a>, layout: OverlayLayout, style: OverlayStyle) -> Self {
        Self {
            conn: ctx.conn,
            screen: ctx.screen,
            atoms: ctx.atoms,
            layout,
            style,
            shown: None,
            retiring: Vec::new(),
        }
    }

    /// Applies from the next presentation on
    pub fn set_appearance(&mut self, layout: OverlayLayout, style: OverlayStyle) {
        self.layout = layout;
        self.style = style;
    }

    fn open(&self, display: &Display, content: &SwitchPanel) -> Result<Panel> {
        let bounds = self.layout.frame(display);
        let window = self
            .conn
            .generate_id()
            .context("Failed to generate X11 window ID")?;
        self.conn
            .create_window(
                self.screen.root_depth,
                window,
                self.screen.root,
                to_i16(bounds.x),
                to_i16(bounds.y),
                to_u16(bounds.width),
                to_u16(bounds.height),
                0,
                WindowClass::INPUT_OUTPUT,
                self.screen.root_visual,
                &CreateWindowAux::new()
                    .override_redirect(x11::OVERRIDE_REDIRECT)
                    .background_pixel(self.style.background.rgb24())
                    .event_mask(EventMask::BUTTON_PRESS | EventMask::EXPOSURE),
            )
            .context(format!("Failed to create overlay window on {}", display.name))?;

        let gc = self
            .conn
            .generate_id()
            .context("Failed to generate ID for overlay graphics context")?;
        self.conn
            .create_gc(gc, window, &CreateGCAux::new().foreground(self.style.button.rgb24()))
            .context("Failed to create overlay graphics context")?;

        let panel = Panel {
            window,
            gc,
            display: display.id,
            bounds,
            content: content.clone(),
        };

        // Window exists from here on; hand it to `release` if setup fails
        if let Err(e) = self.setup_window(&panel) {
            self.release(&panel);
            return Err(e);
        }
        Ok(panel)
    }

    fn setup_window(&self, panel: &Panel) -> Result<()> {
        self.conn
            .change_property8(
                PropMode::REPLACE,
                panel.window,
                AtomEnum::WM_CLASS,
                AtomEnum::STRING,
                x11::WM_CLASS,
            )
            .context("Failed to set WM_CLASS on overlay window")?;
        self.conn
            .change_property32(
                PropMode::REPLACE,
                panel.window,
                self.atoms.net_wm_state,
                AtomEnum::ATOM,
                &[self.atoms.net_wm_state_above],
            )
            .context("Failed to set overlay window always-on-top")?;
        if self.style.background.alpha() < u8::MAX {
            self.conn
                .change_property32(
                    PropMode::REPLACE,
                    panel.window,
                    self.atoms.net_wm_window_opacity,
                    AtomEnum::CARDINAL,
                    &[self.style.background.opacity_cardinal()],
                )
                .context("Failed to set overlay window opacity")?;
        }

        self.conn
            .map_window(panel.window)
            .context("Failed to map overlay window")?;
        self.conn
            .configure_window(
                panel.window,
                &ConfigureWindowAux::new().stack_mode(StackMode::ABOVE),
            )
            .context("Failed to raise overlay window")?;
        self.draw(panel)?;
        self.conn.flush().context("Failed to flush overlay setup")?;
        Ok(())
    }

    fn draw(&self, panel: &Panel) -> Result<()> {
        let area = content_area(panel.bounds, self.layout.sizing.corner_radius);
        let rects: Vec<Rectangle> = panel
            .content
            .cells(area)
            .into_iter()
            .map(|(_, cell)| button_rect(cell, panel.bounds))
            .collect();
        self.conn
            .poly_fill_rectangle(panel.window, panel.gc, &rects)
            .context("Failed to draw overlay buttons")?;
        Ok(())
    }

    fn release(&self, panel: &Panel) {
        // Each resource independently so one failure doesn't leak the rest
        if let Err(e) = self.conn.free_gc(panel.gc) {
            error!(gc = panel.gc, error = %e, "Failed to free overlay GC");
        }
        if let Err(e) = self.conn.destroy_window(panel.window) {
            error!(window = panel.window, error = %e, "Failed to destroy overlay window");
        }
        let _ = self.conn.flush();
    }

    /// Unmap now, destroy once the release delay has passed
    fn retire(&mut self, panel: Panel) {
        if let Err(e) = self.conn.unmap_window(panel.window) {
            error!(window = panel.window, error = %e, "Failed to unmap overlay window");
        }
        let _ = self.conn.flush();
        self.retiring
            .push((panel, Instant::now() + self.style.release_delay));
    }

    /// Destroy windows whose exit window has passed
    pub fn release_expired(&mut self, now: Instant) {
        let (expired, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.retiring)
            .into_iter()
            .partition(|(_, deadline)| *deadline <= now);
        self.retiring = kept;
        for (panel, _) in expired {
            debug!(window = panel.window, "releasing dismissed overlay window");
            self.release(&panel);
        }
    }

    /// Tear everything down at once (shutdown)
    pub fn release_all(&mut self) {
        if let Some(panel) = self.shown.take() {
            self.release(&panel);
        }
        for (panel, _) in std::mem::take(&mut self.retiring) {
            self.release(&panel);
        }
    }

    /// Route an X event. Returns the action under a left click on the panel.
    pub fn handle_event(&mut self, event: &Event) -> Option<SwitchAction> {
        let panel = self.shown.as_ref()?;
        match event {
            Event::Expose(ev) if ev.window == panel.window && ev.count == 0 => {
                if let Err(e) = self.draw(panel).and_then(|()| {
                    self.conn.flush().context("Failed to flush overlay redraw")?;
                    Ok(())
                }) {
                    warn!(error = ?e, "Failed to redraw overlay");
                }
                None
            }
            Event::ButtonPress(ev) if ev.event == panel.window && ev.detail == x11::BUTTON_LEFT => {
                let point = Point::new(f64::from(ev.root_x), f64::from(ev.root_y));
                let area = content_area(panel.bounds, self.layout.sizing.corner_radius);
                let action = panel.content.hit_test(area, point);
                debug!(x = point.x, y = point.y, ?action, "overlay click");
                action
            }
            _ => None,
        }
    }
}

impl OverlaySurface for X11Overlay<'_> {
    fn present(&mut self, display: &Display, content: &SwitchPanel) {
        // Callers dismiss first; a leftover panel is a caller bug, not a no-op
        if let Some(stale) = self.shown.take() {
            let display_name = &display.name;
            warn!(
                window = stale.window,
                shown_on = %stale.display,
                display = %display_name,
                "present called while a panel is still shown"
            );
            self.retire(stale);
        }
        match self.open(display, content) {
            Ok(panel) => {
                let display_name = &display.name;
                info!(display = %display_name, window = panel.window, bounds = ?panel.bounds, "Overlay presented");
                self.shown = Some(panel);
            }
            Err(e) => {
                let display_name = &display.name;
                error!(display = %display_name, error = ?e, "Failed to present overlay");
            }
        }
    }

    fn dismiss(&mut self) {
        let Some(panel) = self.shown.take() else {
            return;
        };
        debug!(window = panel.window, "Overlay dismissed");
        self.retire(panel);
    }

    fn is_visible(&self) -> bool {
        self.shown.is_some()
    }

    fn current_bounds(&self) -> Option<Rect> {
        self.shown.as_ref().map(|panel| panel.bounds)
    }
}

impl Drop for X11Overlay<'_> {
    fn drop(&mut self) {
        self.release_all();
    }
}
