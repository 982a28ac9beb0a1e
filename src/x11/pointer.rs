use anyhow::{Context, Result};
use x11rb::protocol::xproto::{ConnectionExt as _, Window};
use x11rb::rust_connection::RustConnection;

use crate::geometry::Point;
use crate::pointer::PointerSource;

use super::AppContext;

/// Global pointer position via `QueryPointer` on the root window.
/// Works no matter which client has focus or grabs motion events.
pub struct X11Pointer<'a> {
    conn: &'a RustConnection,
    root: Window,
}

impl<'a> X11Pointer<'a> {
    pub fn new(ctx: &AppContext<'a>) -> Self {
        Self {
            conn: ctx.conn,
            root: ctx.screen.root,
        }
    }
}

impl PointerSource for X11Pointer<'_> {
    fn sample(&mut self) -> Result<Option<Point>> {
        let reply = self
            .conn
            .query_pointer(self.root)
            .context("Failed to query pointer position")?
            .reply()
            .context("Failed to get pointer position reply")?;

        // Pointer is on another X screen; nothing to say about ours
        if !reply.same_screen {
            return Ok(None);
        }
        Ok(Some(Point::new(f64::from(reply.root_x), f64::from(reply.root_y))))
    }
}
