//! Transport abstraction: a listening socket and its byte-oriented client
//! connections.
//!
//! The protocol engine is generic over [`Listener`], so the TCP adapter
//! and the in-memory test doubles plug in without touching protocol logic.

/// Byte-oriented client connection.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    ///
    /// Returns `Ok(0)` when no data arrived within the transport's short
    /// read timeout.  A closed peer is reported as an error.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write all of `data`.
    fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;
}

/// A bound server socket that yields at most one client per poll.
pub trait Listener {
    type Conn: Transport;

    /// Poll for a pending client without blocking.
    /// Returns the connection and a printable peer address.
    fn poll_accept(&mut self) -> Option<(Self::Conn, String)>;

    /// Port the listener is bound to.
    fn port(&self) -> u16;
}
