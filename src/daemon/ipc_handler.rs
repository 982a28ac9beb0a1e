//! IPC listener thread for the daemon
//!
//! The listener never touches coordinator state. Each request is forwarded to
//! the event loop together with a reply channel, and whatever the loop answers
//! is written back to the client.

use anyhow::{Context, Result};
use std::sync::mpsc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::constants::timing;
use crate::ipc::{ControlClient, ControlRequest, ControlResponse, ControlServer};

/// A request waiting for the event loop
pub struct ControlEnvelope {
    pub request: ControlRequest,
    pub reply: mpsc::Sender<ControlResponse>,
}

impl ControlEnvelope {
    pub fn respond(self, response: ControlResponse) {
        // Client may have given up waiting
        if self.reply.send(response).is_err() {
            debug!("IPC client went away before reply");
        }
    }
}

/// Spawn IPC listener thread forwarding requests into `commands`
pub fn spawn_ipc_listener(
    server: ControlServer,
    commands: mpsc::Sender<ControlEnvelope>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        if let Err(e) = run_ipc_loop(&server, &commands) {
            error!(error = ?e, "IPC listener thread crashed");
        }
    })
}

fn run_ipc_loop(server: &ControlServer, commands: &mpsc::Sender<ControlEnvelope>) -> Result<()> {
    info!(socket = %server.path().display(), "IPC listener started");

    loop {
        let mut client = match server.accept() {
            Ok(client) => client,
            Err(e) => {
                warn!(error = ?e, "Failed to accept IPC client");
                continue;
            }
        };

        match serve_client(&mut client, commands) {
            Ok(true) => {}
            Ok(false) => {
                info!("Event loop closed, stopping IPC listener");
                return Ok(());
            }
            Err(e) => warn!(error = ?e, "IPC client error"),
        }
    }
}

/// Serve one request. Returns `false` once the event loop is gone.
fn serve_client(client: &mut ControlClient, commands: &mpsc::Sender<ControlEnvelope>) -> Result<bool> {
    let reply_timeout = Duration::from_millis(timing::IPC_REPLY_TIMEOUT_MS);
    client.set_timeout(reply_timeout)?;

    let request = client.recv_request().context("Failed to read IPC request")?;
    debug!(request = ?request, "Received IPC request");

    let (reply_tx, reply_rx) = mpsc::channel();
    let (response, loop_alive) = match commands.send(ControlEnvelope {
        request,
        reply: reply_tx,
    }) {
        Ok(()) => (
            reply_rx
                .recv_timeout(reply_timeout)
                .unwrap_or_else(|_| ControlResponse::Error("daemon did not answer in time".to_string())),
            true,
        ),
        Err(_) => (ControlResponse::Error("daemon is shutting down".to_string()), false),
    };

    client
        .send_response(&response)
        .context("Failed to write IPC response")?;
    Ok(loop_alive)
}
