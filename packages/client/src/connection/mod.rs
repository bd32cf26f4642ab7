//! Connections whose transport is opened through a SOCKS proxy
//!
//! A connection owns its configured target and socket settings and delegates
//! the actual transport creation to an [`EstablishTransport`] implementation:
//! [`ProxiedEstablisher`] for plain `http`, and (with TLS support)
//! [`VerifiedEstablisher`] which verifies and wraps the proxied stream.

pub mod establish;
pub mod http_connection;
pub mod response;
#[cfg(feature = "__rustls")]
pub mod tls;

pub use establish::{EstablishTransport, ProxiedEstablisher};
pub use http_connection::HttpConnection;
#[cfg(feature = "__rustls")]
pub use tls::{TlsWrapper, VerifiedEstablisher};

/// How a connection's transport is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionKind {
    /// Raw proxied stream
    Plain,
    /// Proxied stream wrapped in a verified TLS session
    Verified,
}
