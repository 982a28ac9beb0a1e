//! Application-wide constants
//!
//! Magic numbers and string literals used throughout the application,
//! kept in one place.

/// Hover trigger defaults
pub mod trigger {
    /// Fraction of the display width covered by the centered trigger band
    pub const DEFAULT_WIDTH_RATIO: f64 = 0.15;

    /// Delay before the overlay appears
    pub const DEFAULT_SHOW_DELAY_MS: u64 = 0;

    /// Delay before the overlay goes away after the pointer leaves
    pub const DEFAULT_HIDE_DELAY_MS: u64 = 80;

    /// Lifetime of a programmatic one-shot presentation
    pub const DEFAULT_SHOW_ONCE_MS: u64 = 1200;
}

/// Overlay panel sizing
pub mod layout {
    pub const MIN_WIDTH: f64 = 260.0;

    pub const MIN_WIDTH_EXTRA: f64 = 80.0;

    pub const HEIGHT_MULTIPLIER: f64 = 2.0;

    pub const CORNER_RADIUS: f64 = 12.0;

    /// Panels are at least this much wider than a physical cutout
    pub const CUTOUT_WIDEN_FACTOR: f64 = 1.25;

    /// Reserved strip used when nothing more specific is configured
    pub const DEFAULT_STRIP_HEIGHT: f64 = 32.0;
}

/// Event loop timing
pub mod timing {
    /// Pointer polling period (~60 Hz)
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 16;

    /// Time the overlay window lingers after dismissal before being destroyed
    pub const DEFAULT_RELEASE_DELAY_MS: u64 = 450;

    /// How long an IPC client waits for the event loop to answer
    pub const IPC_REPLY_TIMEOUT_MS: u64 = 2000;
}

/// X11 protocol constants
pub mod x11 {
    /// Override redirect flag for unmanaged windows
    pub const OVERRIDE_REDIRECT: u32 = 1;

    /// Left mouse button number
    pub const BUTTON_LEFT: u8 = 1;

    /// WM_CLASS for the overlay window (instance\0class\0)
    pub const WM_CLASS: &[u8] = b"notch-switch\0notch-switch\0";
}

/// Config file location
pub mod config {
    pub const APP_DIR: &str = "notch-switch";

    pub const FILENAME: &str = "config.json";
}

/// Control socket location
pub mod ipc {
    pub const SOCKET_NAME: &str = "notch-switch/control.sock";

    /// Control messages are tiny; anything bigger is garbage
    pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;
}

/// Validation ranges for config values
pub mod validation {
    pub const MAX_DELAY_MS: f64 = 10_000.0;

    pub const MIN_POLL_INTERVAL_MS: u64 = 4;

    pub const MAX_POLL_INTERVAL_MS: u64 = 250;
}
