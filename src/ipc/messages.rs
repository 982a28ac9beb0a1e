//! IPC message types for CLI ↔ daemon communication

use serde::{Deserialize, Serialize};

use crate::coordinator::OverlayPhase;

/// Requests sent from the CLI to the running daemon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ControlRequest {
    /// Present the overlay now and dismiss it after the duration
    /// (configured default when absent)
    ShowOnce { duration_ms: Option<u64> },

    /// Collapse the overlay immediately
    Hide,

    /// Replace both hover delays (negative values clamp to 0)
    UpdateDelays { show_ms: f64, hide_ms: f64 },

    /// Report the coordinator state
    Status,

    /// Health check
    Ping,

    /// Request graceful shutdown
    Shutdown,
}

/// Responses sent from the daemon back to the CLI
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ControlResponse {
    /// Request was applied
    Ready,

    /// Health check response
    Pong,

    Status {
        phase: OverlayPhase,
        visible: bool,
        display: Option<String>,
        show_delay_ms: f64,
        hide_delay_ms: f64,
    },

    /// Error occurred
    Error(String),
}
