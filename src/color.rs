//! Hex color parsing for overlay paint
//!
//! Accepts `RRGGBB` or `AARRGGBB`, with or without a leading `#`.
//! Six-digit colors are fully opaque.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexColor(u32);

impl HexColor {
    pub fn from_argb32(argb: u32) -> Self {
        Self(argb)
    }

    pub fn parse(input: &str) -> Option<Self> {
        let hex = input.trim().trim_start_matches('#');
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let value = u32::from_str_radix(hex, 16).ok()?;
        match hex.len() {
            6 => Some(Self(0xFF00_0000 | value)),
            8 => Some(Self(value)),
            _ => None,
        }
    }

    pub fn argb32(&self) -> u32 {
        self.0
    }

    pub fn alpha(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Pixel value for a 24-bit TrueColor visual (alpha dropped)
    pub fn rgb24(&self) -> u32 {
        self.0 & 0x00FF_FFFF
    }

    /// Alpha as the `_NET_WM_WINDOW_OPACITY` cardinal
    pub fn opacity_cardinal(&self) -> u32 {
        u32::from(self.alpha()) * 0x0101_0101
    }
}
