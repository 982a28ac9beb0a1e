//! IPC (Inter-Process Communication) via Unix sockets
//!
//! Lets the CLI drive a running daemon (show once, hide, retune delays).
//! Uses length-prefixed JSON over a Unix domain socket.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod messages;
pub use messages::{ControlRequest, ControlResponse};

use crate::constants::ipc::{MAX_MESSAGE_SIZE, SOCKET_NAME};

/// Get default socket path (XDG_RUNTIME_DIR with fallback to cache)
pub fn default_socket_path() -> Result<PathBuf> {
    if let Ok(runtime_dir) = std::env::var("XDG_RUNTIME_DIR") {
        return Ok(PathBuf::from(runtime_dir).join(SOCKET_NAME));
    }

    let cache = dirs::cache_dir()
        .context("Failed to determine cache directory (no XDG_RUNTIME_DIR or HOME)")?;
    Ok(cache.join(SOCKET_NAME))
}

/// Client connection to the daemon (used by CLI subcommands)
pub struct ControlClient {
    pub(crate) stream: UnixStream,
}

impl ControlClient {
    /// Connect to specific socket path
    pub fn connect_to(path: &Path) -> Result<Self> {
        let stream = UnixStream::connect(path)
            .with_context(|| format!("Failed to connect to daemon at {} (is it running?)", path.display()))?;
        Ok(Self { stream })
    }

    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        self.stream
            .set_read_timeout(Some(timeout))
            .context("Failed to set socket read timeout")?;
        self.stream
            .set_write_timeout(Some(timeout))
            .context("Failed to set socket write timeout")?;
        Ok(())
    }

    /// Send request and wait for response
    pub fn request(&mut self, req: &ControlRequest) -> Result<ControlResponse> {
        write_message(&mut self.stream, req)?;
        read_message(&mut self.stream)
    }

    pub(crate) fn recv_request(&mut self) -> Result<ControlRequest> {
        read_message(&mut self.stream)
    }

    pub(crate) fn send_response(&mut self, resp: &ControlResponse) -> Result<()> {
        write_message(&mut self.stream, resp)
    }
}

/// Server listener owned by the daemon
pub struct ControlServer {
    listener: UnixListener,
    socket_path: PathBuf,
}

impl ControlServer {
    /// Create server and bind to specific socket path
    pub fn bind_to(socket_path: PathBuf) -> Result<Self> {
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {}", parent.display()))?;
        }

        // Refuse to steal the socket from a live daemon
        if socket_path.exists() {
            if UnixStream::connect(&socket_path).is_ok() {
                anyhow::bail!("Another instance is already listening on {}", socket_path.display());
            }
            std::fs::remove_file(&socket_path)
                .with_context(|| format!("Failed to remove stale socket: {}", socket_path.display()))?;
        }

        let listener = UnixListener::bind(&socket_path)
            .with_context(|| format!("Failed to bind socket at {}", socket_path.display()))?;

        // Owner only
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&socket_path, std::fs::Permissions::from_mode(0o700))
                .context("Failed to set socket permissions")?;
        }

        Ok(Self {
            listener,
            socket_path,
        })
    }

    /// Accept incoming connection (blocking)
    pub fn accept(&self) -> Result<ControlClient> {
        let (stream, _addr) = self.listener.accept().context("Failed to accept IPC connection")?;
        Ok(ControlClient { stream })
    }

    pub fn path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Write length-prefixed message to stream
fn write_message<T: Serialize>(stream: &mut impl Write, msg: &T) -> Result<()> {
    let json = serde_json::to_vec(msg).context("Failed to serialize message to JSON")?;

    let len = u32::try_from(json.len()).context("Message does not fit a u32 length prefix")?;
    stream
        .write_all(&len.to_le_bytes())
        .context("Failed to write message length")?;
    stream.write_all(&json).context("Failed to write message payload")?;
    stream.flush().context("Failed to flush stream")?;

    Ok(())
}

/// Read length-prefixed message from stream
fn read_message<T: for<'de> Deserialize<'de>>(stream: &mut impl Read) -> Result<T> {
    let mut len_buf = [0u8; 4];
    stream
        .read_exact(&mut len_buf)
        .context("Failed to read message length")?;
    let len = u32::from_le_bytes(len_buf) as usize;

    if len > MAX_MESSAGE_SIZE {
        return Err(anyhow!("Message too large: {} bytes (max: {})", len, MAX_MESSAGE_SIZE));
    }

    let mut json_buf = vec![0u8; len];
    stream
        .read_exact(&mut json_buf)
        .context("Failed to read message payload")?;

    serde_json::from_slice(&json_buf).context("Failed to deserialize message from JSON")
}
