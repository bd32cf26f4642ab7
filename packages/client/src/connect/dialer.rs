//! The proxy dial primitive and its error translation
//!
//! [`Dial`] is the seam between connection objects and whatever performs the
//! SOCKS negotiation. [`SocksDialer`] is the blocking implementation used by
//! default; tests and embedders may substitute their own.

use std::io;
use std::time::Duration;

use super::proxy::ProxyOptions;
use super::request::{ConnectionId, ConnectionRequest, Transport};
use super::tcp::{connect_to_address_list, resolve_host_sync, socks_handshake};
use crate::error::{self, Error};

/// Failure reported by a dial primitive.
#[derive(Debug, thiserror::Error)]
pub enum DialError {
    /// Socket-level failure: timeout, refusal, unreachable proxy, handshake rejection
    #[error(transparent)]
    Io(#[from] io::Error),

    /// Anything else; passed to the caller without reinterpretation
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Opens a transport to `request.host:request.port` by way of a SOCKS proxy.
pub trait Dial: Send + Sync {
    fn dial(&self, request: &ConnectionRequest, options: &ProxyOptions)
    -> Result<Transport, DialError>;
}

/// Blocking SOCKS4/SOCKS5 dialer over `std::net`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SocksDialer;

impl Dial for SocksDialer {
    fn dial(
        &self,
        request: &ConnectionRequest,
        options: &ProxyOptions,
    ) -> Result<Transport, DialError> {
        let addrs = resolve_host_sync(&options.proxy_host, options.proxy_port)?;
        let mut stream = connect_to_address_list(
            &addrs,
            request.timeout,
            request.source_address,
            &request.socket_options,
        )?;

        // The connect deadline stays on the socket until the owning
        // connection has finished any TLS handshake on top of the tunnel.
        stream.set_read_timeout(request.timeout)?;
        stream.set_write_timeout(request.timeout)?;

        socks_handshake(&mut stream, &request.host, request.port, options)?;

        tracing::debug!(
            proxy = %options.authority(),
            "SOCKS tunnel established to {}:{}",
            request.host,
            request.port
        );

        Ok(Box::new(stream))
    }
}

/// Map a dial failure onto the two connect error kinds.
///
/// Timeouts become `ConnectTimeout`, every other socket error becomes
/// `NewConnection`, and non-socket failures pass through as `Proxy`.
pub fn translate_dial_error(
    err: DialError,
    connection: ConnectionId,
    timeout: Option<Duration>,
) -> Error {
    match err {
        DialError::Io(e) if is_timeout(&e) => error::connect_timeout(connection, timeout).with(e),
        DialError::Io(e) => error::new_connection(connection, e),
        DialError::Other(e) => error::proxy(connection, e),
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
    )
}
