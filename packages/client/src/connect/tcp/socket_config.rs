//! TCP socket configuration utilities
//!
//! Applies [`SocketOptions`] to the socket that carries the proxy tunnel.

use std::io;
use std::net::TcpStream;

use socket2::{Socket, TcpKeepalive};

use crate::config::SocketOptions;

/// Configure the raw socket before it connects.
pub fn configure_socket(socket: &Socket, options: &SocketOptions) -> io::Result<()> {
    if let Some(idle) = options.keepalive {
        socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
    }

    if let Some(size) = options.recv_buffer_size {
        socket.set_recv_buffer_size(size)?;
    }

    if let Some(size) = options.send_buffer_size {
        socket.set_send_buffer_size(size)?;
    }

    Ok(())
}

/// Options that are set on the connected stream.
pub fn configure_tcp_stream(stream: &TcpStream, options: &SocketOptions) -> io::Result<()> {
    stream.set_nodelay(options.tcp_nodelay)
}
