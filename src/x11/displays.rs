use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use x11rb::protocol::randr::{ConnectionExt as _, MonitorInfo};
use x11rb::protocol::xproto::{Atom, ConnectionExt as _, Screen};
use x11rb::rust_connection::RustConnection;

use crate::config::Config;
use crate::display::{Display, DisplayId, DisplaySource};
use crate::geometry::Rect;

use super::AppContext;

/// Displays from RandR monitor objects, asked for on every call so hotplug
/// shows up on the next pointer sample
pub struct X11Displays<'a> {
    conn: &'a RustConnection,
    screen: &'a Screen,
    config: Config,
    /// Monitor name atoms never change meaning, so one lookup each
    names: HashMap<Atom, String>,
    query_failed: bool,
}

impl<'a> X11Displays<'a> {
    pub fn new(ctx: &AppContext<'a>, config: &Config) -> Self {
        Self {
            conn: ctx.conn,
            screen: ctx.screen,
            config: config.clone(),
            names: HashMap::new(),
            query_failed: false,
        }
    }

    /// Pick up new strip/cutout overrides after a config reload
    pub fn set_config(&mut self, config: &Config) {
        self.config = config.clone();
    }

    fn monitor_name(&mut self, atom: Atom) -> Result<String> {
        if let Some(name) = self.names.get(&atom) {
            return Ok(name.clone());
        }
        let reply = self
            .conn
            .get_atom_name(atom)
            .context("Failed to query monitor name atom")?
            .reply()
            .context("Failed to get monitor name atom reply")?;
        let name = String::from_utf8_lossy(&reply.name).into_owned();
        self.names.insert(atom, name.clone());
        Ok(name)
    }

    fn query_monitors(&mut self) -> Result<Vec<Display>> {
        let reply = self
            .conn
            .randr_get_monitors(self.screen.root, true)
            .context("Failed to query RandR monitors")?
            .reply()
            .context("Failed to get RandR monitors reply")?;

        let mut displays = Vec::with_capacity(reply.monitors.len());
        for monitor in &reply.monitors {
            let name = self.monitor_name(monitor.name)?;
            displays.push(monitor_to_display(monitor, name, &self.config));
        }
        Ok(displays)
    }
}

impl DisplaySource for X11Displays<'_> {
    fn displays(&mut self) -> Vec<Display> {
        match self.query_monitors() {
            Ok(displays) if !displays.is_empty() => {
                if self.query_failed {
                    debug!(count = displays.len(), "RandR monitor query recovered");
                    self.query_failed = false;
                }
                displays
            }
            Ok(_) => vec![root_display(self.screen, &self.config)],
            Err(e) => {
                // Polled at frame rate; report once until it recovers
                if !self.query_failed {
                    warn!(error = %e, "RandR monitor query failed, using the whole root window");
                    self.query_failed = true;
                }
                vec![root_display(self.screen, &self.config)]
            }
        }
    }
}

fn monitor_to_display(monitor: &MonitorInfo, name: String, config: &Config) -> Display {
    let (reserved_strip_height, cutout_width) = config.display_geometry(&name);
    Display {
        id: DisplayId(monitor.name),
        name,
        bounds: Rect::new(
            f64::from(monitor.x),
            f64::from(monitor.y),
            f64::from(monitor.width),
            f64::from(monitor.height),
        ),
        reserved_strip_height,
        cutout_width,
        primary: monitor.primary,
    }
}

/// The root window as a single display
fn root_display(screen: &Screen, config: &Config) -> Display {
    let name = "screen".to_string();
    let (reserved_strip_height, cutout_width) = config.display_geometry(&name);
    Display {
        id: DisplayId(0),
        name,
        bounds: Rect::new(
            0.0,
            0.0,
            f64::from(screen.width_in_pixels),
            f64::from(screen.height_in_pixels),
        ),
        reserved_strip_height,
        cutout_width,
        primary: true,
    }
}
