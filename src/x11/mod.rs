//! X11 host integration: pointer polling, RandR display enumeration and the
//! override-redirect overlay window

mod displays;
mod overlay;
mod pointer;

pub use displays::X11Displays;
pub use overlay::{OverlayStyle, X11Overlay};
pub use pointer::X11Pointer;

use anyhow::{Context, Result};
use x11rb::protocol::randr::ConnectionExt as RandrExt;
use x11rb::protocol::xproto::*;
use x11rb::rust_connection::RustConnection;

/// Application context holding immutable shared state
pub struct AppContext<'a> {
    pub conn: &'a RustConnection,
    pub screen: &'a Screen,
    pub atoms: &'a CachedAtoms,
}

/// Pre-cached X11 atoms to avoid repeated roundtrips
pub struct CachedAtoms {
    pub net_wm_state: Atom,
    pub net_wm_state_above: Atom,
    pub net_wm_window_opacity: Atom,
}

fn intern(conn: &RustConnection, name: &str) -> Result<Atom> {
    Ok(conn
        .intern_atom(false, name.as_bytes())
        .with_context(|| format!("Failed to intern {} atom", name))?
        .reply()
        .with_context(|| format!("Failed to get reply for {} atom", name))?
        .atom)
}

impl CachedAtoms {
    pub fn new(conn: &RustConnection) -> Result<Self> {
        Ok(Self {
            net_wm_state: intern(conn, "_NET_WM_STATE")?,
            net_wm_state_above: intern(conn, "_NET_WM_STATE_ABOVE")?,
            net_wm_window_opacity: intern(conn, "_NET_WM_WINDOW_OPACITY")?,
        })
    }
}

/// Make sure the server speaks RandR 1.5 (monitor objects)
pub fn check_randr(conn: &RustConnection) -> Result<()> {
    let version = conn
        .randr_query_version(1, 5)
        .context("Failed to query RandR version. Is the RANDR extension available?")?
        .reply()
        .context("Failed to get RandR version reply")?;
    if (version.major_version, version.minor_version) < (1, 5) {
        anyhow::bail!(
            "RandR {}.{} is too old, monitor enumeration needs 1.5",
            version.major_version,
            version.minor_version
        );
    }
    Ok(())
}

/// Round a screen-space length into the X11 u16 range
pub(crate) fn to_u16(v: f64) -> u16 {
    v.round().clamp(1.0, f64::from(u16::MAX)) as u16
}

/// Round a screen-space coordinate into the X11 i16 range
pub(crate) fn to_i16(v: f64) -> i16 {
    v.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
