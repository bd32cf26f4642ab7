//! DNS resolution and address handling utilities
//!
//! Resolves the proxy endpoint. Target hosts are never resolved locally; they
//! are handed to the proxy as names.

use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::str::FromStr;

/// Resolve hostname to socket addresses synchronously.
pub fn resolve_host_sync(host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
    if host.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "empty host name",
        ));
    }

    // Fast path for IP addresses
    if let Ok(ip) = IpAddr::from_str(host) {
        return Ok(vec![SocketAddr::new(ip, port)]);
    }

    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().map_err(|e| {
        io::Error::new(e.kind(), format!("DNS resolution failed for {host}: {e}"))
    })?.collect();

    if addrs.is_empty() {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("No addresses resolved for {host}"),
        ))
    } else {
        Ok(addrs)
    }
}
