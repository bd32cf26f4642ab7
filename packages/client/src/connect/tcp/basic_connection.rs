//! Basic TCP connection establishment
//!
//! Connects to the first reachable proxy address with timeout support,
//! optional source address binding and socket options.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};

use super::socket_config::{configure_socket, configure_tcp_stream};
use crate::config::SocketOptions;

/// Connect to first available address with timeout support.
///
/// The error of the last attempt is returned when every address fails, so a
/// timeout on the final address still surfaces as `TimedOut`.
pub fn connect_to_address_list(
    addrs: &[SocketAddr],
    timeout: Option<Duration>,
    source_address: Option<SocketAddr>,
    options: &SocketOptions,
) -> io::Result<TcpStream> {
    let mut last_error = None;

    for addr in addrs {
        match connect_one(*addr, timeout, source_address, options) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                tracing::debug!("Failed to connect to {}: {}", addr, e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "No addresses to connect to")
    }))
}

fn connect_one(
    addr: SocketAddr,
    timeout: Option<Duration>,
    source_address: Option<SocketAddr>,
    options: &SocketOptions,
) -> io::Result<TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    configure_socket(&socket, options)?;

    if let Some(source) = source_address {
        socket.bind(&SockAddr::from(source))?;
    }

    let target = SockAddr::from(addr);
    match timeout {
        Some(t) => socket.connect_timeout(&target, t)?,
        None => socket.connect(&target)?,
    }

    let stream = TcpStream::from(socket);
    configure_tcp_stream(&stream, options)?;
    Ok(stream)
}
