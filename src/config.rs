//! User configuration
//!
//! A single JSON file under the XDG config dir. Missing keys take defaults,
//! out-of-range values are clamped with a warning rather than rejected.
//! The daemon re-reads the file on SIGHUP.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::actions::ActionBindings;
use crate::color::HexColor;
use crate::constants::{layout, timing, trigger, validation};
use crate::coordinator::{clamp_delay, clamp_ratio, TriggerConfig};
use crate::overlay::{OverlayLayout, OverlaySizing};

/// Per-output geometry the X server cannot tell us
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reserved_strip_height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutout_width: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_show_delay_ms")]
    pub show_delay_ms: f64,

    #[serde(default = "default_hide_delay_ms")]
    pub hide_delay_ms: f64,

    /// Fraction of the display width forming the centered trigger band
    #[serde(default = "default_trigger_width_ratio")]
    pub trigger_width_ratio: f64,

    /// Height of the top bar band, in pixels
    #[serde(default = "default_reserved_strip_height")]
    pub reserved_strip_height: f64,

    #[serde(default)]
    pub cutout_width: f64,

    /// Trigger band never narrower than this, in pixels (0 = no floor)
    #[serde(default)]
    pub min_trigger_width: f64,

    /// Extra band width around a cutout, in pixels
    #[serde(default)]
    pub trigger_margin: f64,

    #[serde(default)]
    pub sizing: OverlaySizing,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_show_once_duration_ms")]
    pub show_once_duration_ms: u64,

    /// Exit animation window before overlay resources are released
    #[serde(default = "default_release_delay_ms")]
    pub release_delay_ms: u64,

    #[serde(default = "default_background_color")]
    pub background_color: String,

    #[serde(default = "default_button_color")]
    pub button_color: String,

    /// Overrides keyed by output name (e.g. "eDP-1")
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub displays: HashMap<String, DisplayOverride>,

    #[serde(default)]
    pub actions: ActionBindings,
}

fn default_show_delay_ms() -> f64 {
    trigger::DEFAULT_SHOW_DELAY_MS as f64
}

fn default_hide_delay_ms() -> f64 {
    trigger::DEFAULT_HIDE_DELAY_MS as f64
}

fn default_trigger_width_ratio() -> f64 {
    trigger::DEFAULT_WIDTH_RATIO
}

fn default_reserved_strip_height() -> f64 {
    layout::DEFAULT_STRIP_HEIGHT
}

fn default_poll_interval_ms() -> u64 {
    timing::DEFAULT_POLL_INTERVAL_MS
}

fn default_show_once_duration_ms() -> u64 {
    trigger::DEFAULT_SHOW_ONCE_MS
}

fn default_release_delay_ms() -> u64 {
    timing::DEFAULT_RELEASE_DELAY_MS
}

fn default_background_color() -> String {
    "#E6101010".to_string()
}

fn default_button_color() -> String {
    "#FF3A3A3C".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            show_delay_ms: default_show_delay_ms(),
            hide_delay_ms: default_hide_delay_ms(),
            trigger_width_ratio: default_trigger_width_ratio(),
            reserved_strip_height: default_reserved_strip_height(),
            cutout_width: 0.0,
            min_trigger_width: 0.0,
            trigger_margin: 0.0,
            sizing: OverlaySizing::default(),
            poll_interval_ms: default_poll_interval_ms(),
            show_once_duration_ms: default_show_once_duration_ms(),
            release_delay_ms: default_release_delay_ms(),
            background_color: default_background_color(),
            button_color: default_button_color(),
            displays: HashMap::new(),
            actions: ActionBindings::default(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(crate::constants::config::APP_DIR);
        path.push(crate::constants::config::FILENAME);
        path
    }

    /// Load from `path`, writing a default file first if there is none
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "Config file not found, creating default");
            let config = Config::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?;
        config.validate_and_clamp();

        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize config to JSON")?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write config to {}", path.display()))?;
        info!(path = %path.display(), "Saved config");
        Ok(())
    }

    /// Clamp values to safe ranges, logging every correction
    pub fn validate_and_clamp(&mut self) {
        for (name, value) in [
            ("show_delay_ms", &mut self.show_delay_ms),
            ("hide_delay_ms", &mut self.hide_delay_ms),
        ] {
            if !value.is_finite() || *value < 0.0 {
                warn!(field = name, value = *value, "negative or invalid delay, using 0");
                *value = 0.0;
            } else if *value > validation::MAX_DELAY_MS {
                warn!(field = name, value = *value, max = validation::MAX_DELAY_MS, "delay exceeds maximum, clamping");
                *value = validation::MAX_DELAY_MS;
            }
        }

        let ratio = clamp_ratio(self.trigger_width_ratio);
        if ratio != self.trigger_width_ratio {
            warn!(trigger_width_ratio = self.trigger_width_ratio, using = ratio, "trigger_width_ratio outside (0, 1], clamping");
            self.trigger_width_ratio = ratio;
        }

        for (name, value) in [
            ("reserved_strip_height", &mut self.reserved_strip_height),
            ("cutout_width", &mut self.cutout_width),
            ("min_trigger_width", &mut self.min_trigger_width),
            ("trigger_margin", &mut self.trigger_margin),
        ] {
            if !value.is_finite() || *value < 0.0 {
                warn!(field = name, value = *value, "negative or invalid length, using 0");
                *value = 0.0;
            }
        }

        if self.poll_interval_ms < validation::MIN_POLL_INTERVAL_MS
            || self.poll_interval_ms > validation::MAX_POLL_INTERVAL_MS
        {
            let clamped = self
                .poll_interval_ms
                .clamp(validation::MIN_POLL_INTERVAL_MS, validation::MAX_POLL_INTERVAL_MS);
            warn!(poll_interval_ms = self.poll_interval_ms, using = clamped, "poll_interval_ms out of range, clamping");
            self.poll_interval_ms = clamped;
        }

        if HexColor::parse(&self.background_color).is_none() {
            warn!(background_color = %self.background_color, "Invalid background_color hex, using default");
            self.background_color = default_background_color();
        }
        if HexColor::parse(&self.button_color).is_none() {
            warn!(button_color = %self.button_color, "Invalid button_color hex, using default");
            self.button_color = default_button_color();
        }
    }

    pub fn trigger_config(&self) -> TriggerConfig {
        TriggerConfig {
            trigger_width_ratio: self.trigger_width_ratio,
            show_delay: clamp_delay(self.show_delay_ms / 1000.0),
            hide_delay: clamp_delay(self.hide_delay_ms / 1000.0),
        }
    }

    pub fn layout(&self) -> OverlayLayout {
        OverlayLayout {
            sizing: self.sizing,
            min_trigger_width: self.min_trigger_width,
            trigger_margin: self.trigger_margin,
        }
    }

    /// Reserved strip height and cutout width for the output called `name`
    pub fn display_geometry(&self, name: &str) -> (f64, f64) {
        let overrides = self.displays.get(name).copied().unwrap_or_default();
        (
            overrides
                .reserved_strip_height
                .filter(|h| h.is_finite() && *h >= 0.0)
                .unwrap_or(self.reserved_strip_height),
            overrides
                .cutout_width
                .filter(|w| w.is_finite() && *w >= 0.0)
                .unwrap_or(self.cutout_width),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn show_once_duration(&self) -> Duration {
        Duration::from_millis(self.show_once_duration_ms)
    }

    pub fn release_delay(&self) -> Duration {
        Duration::from_millis(self.release_delay_ms)
    }

    pub fn background(&self) -> HexColor {
        HexColor::parse(&self.background_color).unwrap_or(HexColor::from_argb32(0xE610_1010))
    }

    pub fn button(&self) -> HexColor {
        HexColor::parse(&self.button_color).unwrap_or(HexColor::from_argb32(0xFF3A_3A3C))
    }
}
