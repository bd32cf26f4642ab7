//! Per-attempt dial parameters and the transport handed back by a dial

use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use crate::config::SocketOptions;

/// Byte stream positioned as if it were a direct connection to the target.
pub trait Stream: Read + Write + Send {
    /// Socket read/write timeout for the established stream.
    ///
    /// Streams without an underlying socket ignore it.
    fn set_io_timeout(&self, _timeout: Option<Duration>) -> io::Result<()> {
        Ok(())
    }
}

impl Stream for TcpStream {
    fn set_io_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.set_read_timeout(timeout)?;
        self.set_write_timeout(timeout)
    }
}

impl<S: Stream + ?Sized> Stream for Box<S> {
    fn set_io_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        (**self).set_io_timeout(timeout)
    }
}

impl Stream for Cursor<Vec<u8>> {}

/// An established transport, plain or TLS-wrapped.
pub type Transport = Box<dyn Stream>;

/// Identity of a connection, carried by dial errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl ConnectionId {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Target and socket settings for one dial attempt.
///
/// Built from a connection's configured state right before it dials and
/// dropped as soon as the attempt resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRequest {
    pub host: String,
    pub port: u16,
    /// Deadline for reaching the proxy and finishing the SOCKS and TLS handshakes
    pub timeout: Option<Duration>,
    pub source_address: Option<SocketAddr>,
    pub socket_options: SocketOptions,
}

impl ConnectionRequest {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: None,
            source_address: None,
            socket_options: SocketOptions::default(),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_source_address(mut self, addr: Option<SocketAddr>) -> Self {
        self.source_address = addr;
        self
    }

    #[must_use]
    pub fn with_socket_options(mut self, options: SocketOptions) -> Self {
        self.socket_options = options;
        self
    }
}
