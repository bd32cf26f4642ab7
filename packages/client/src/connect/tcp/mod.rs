//! Blocking TCP plumbing for the SOCKS dial primitive
//!
//! DNS resolution of the proxy host, socket setup with options and source
//! address binding, and the SOCKS4/SOCKS5 client handshakes.

pub mod basic_connection;
pub mod dns_resolution;
pub mod socket_config;
pub mod socks_protocol;

pub use basic_connection::connect_to_address_list;
pub use dns_resolution::resolve_host_sync;
pub use socket_config::{configure_socket, configure_tcp_stream};
pub use socks_protocol::{socks4_handshake, socks5_handshake, socks_handshake};
