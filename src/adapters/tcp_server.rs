//! TCP server adapter.
//!
//! Implements [`Listener`] and [`Transport`] over `std::net`, which ESP-IDF
//! backs with lwIP, so the same code serves the firmware and host tests.
//!
//! ## Connection model
//!
//! 1. [`TcpServer::bind`] listens on `0.0.0.0:<port>` in non-blocking mode.
//!    A failed bind is retried once after a short pause, then reported as
//!    [`CommsError::BindFailed`].
//! 2. [`poll_accept`](Listener::poll_accept) returns immediately when no
//!    client is waiting.
//! 3. Client reads block for at most [`READ_TIMEOUT`]; an expired timeout
//!    reads as `Ok(0)`, an orderly close from the peer as an error.

use core::fmt;
use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use log::{info, warn};

use crate::error::CommsError;
use crate::rpc::transport::{Listener, Transport};

/// Upper bound on one client read.
pub const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Pause before the single bind retry.
const REBIND_PAUSE: Duration = Duration::from_millis(500);

// ───────────────────────────────────────────────────────────────
// Error type
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TcpError {
    /// Peer closed the connection.
    Closed,
    Io(ErrorKind),
}

impl fmt::Display for TcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "peer closed the connection"),
            Self::Io(kind) => write!(f, "socket I/O error: {}", kind),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Client connection
// ───────────────────────────────────────────────────────────────

pub struct TcpClient {
    stream: TcpStream,
}

impl TcpClient {
    fn new(stream: TcpStream) -> Result<Self, TcpError> {
        stream
            .set_nonblocking(false)
            .and_then(|()| stream.set_read_timeout(Some(READ_TIMEOUT)))
            .and_then(|()| stream.set_nodelay(true))
            .map_err(|e| TcpError::Io(e.kind()))?;
        Ok(Self { stream })
    }
}

impl Transport for TcpClient {
    type Error = TcpError;

    fn read(&mut self, buf: &mut [u8]) -> Result<usize, TcpError> {
        match self.stream.read(buf) {
            Ok(0) if !buf.is_empty() => Err(TcpError::Closed),
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => Ok(0),
            Err(e) => Err(TcpError::Io(e.kind())),
        }
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), TcpError> {
        self.stream
            .write_all(data)
            .and_then(|()| self.stream.flush())
            .map_err(|e| TcpError::Io(e.kind()))
    }
}

// ───────────────────────────────────────────────────────────────
// Listener
// ───────────────────────────────────────────────────────────────

pub struct TcpServer {
    listener: TcpListener,
    port: u16,
}

impl TcpServer {
    /// Listen on `0.0.0.0:<port>`.  Port `0` picks a free port.
    pub fn bind(port: u16) -> Result<Self, CommsError> {
        let listener = match Self::try_bind(port) {
            Ok(l) => l,
            Err(e) => {
                warn!("tcp: bind to {} failed ({}), retrying", port, e);
                std::thread::sleep(REBIND_PAUSE);
                Self::try_bind(port).map_err(|e| {
                    warn!("tcp: bind retry failed: {}", e);
                    CommsError::BindFailed(port)
                })?
            }
        };
        let port = listener
            .local_addr()
            .map(|a| a.port())
            .map_err(|_| CommsError::BindFailed(port))?;
        info!("tcp: listening on port {}", port);
        Ok(Self { listener, port })
    }

    fn try_bind(port: u16) -> std::io::Result<TcpListener> {
        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
        listener.set_nonblocking(true)?;
        Ok(listener)
    }
}

impl Listener for TcpServer {
    type Conn = TcpClient;

    fn poll_accept(&mut self) -> Option<(TcpClient, String)> {
        match self.listener.accept() {
            Ok((stream, addr)) => match TcpClient::new(stream) {
                Ok(client) => Some((client, addr.ip().to_string())),
                Err(e) => {
                    warn!("tcp: cannot configure client {}: {}", addr, e);
                    None
                }
            },
            Err(e) if e.kind() == ErrorKind::WouldBlock => None,
            Err(e) => {
                warn!("tcp: accept error: {}", e);
                None
            }
        }
    }

    fn port(&self) -> u16 {
        self.port
    }
}
