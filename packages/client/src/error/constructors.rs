use std::time::Duration;

use super::BoxError;
use super::types::{Error, Kind};
use crate::connect::ConnectionId;

/// Creates an `Error` for a builder error.
pub fn builder<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Builder).with(e.into())
}

/// Creates the configuration error raised when a proxy URL names no SOCKS version.
pub fn unknown_socks_version(proxy_url: &str) -> Error {
    builder(format!("Unable to determine SOCKS version from {proxy_url}"))
}

/// Creates an `Error` for a dial that ran past its connect timeout.
pub fn connect_timeout(connection: ConnectionId, timeout: Option<Duration>) -> Error {
    Error::new(Kind::ConnectTimeout { timeout }).with_connection(connection)
}

/// Creates an `Error` for a socket failure while dialing through the proxy.
pub fn new_connection<E: Into<BoxError>>(connection: ConnectionId, e: E) -> Error {
    Error::new(Kind::NewConnection)
        .with(e.into())
        .with_connection(connection)
}

/// Creates an `Error` for a non-socket failure reported by a dial primitive.
pub fn proxy<E: Into<BoxError>>(connection: ConnectionId, e: E) -> Error {
    Error::new(Kind::Proxy).with(e.into()).with_connection(connection)
}

/// Creates an `Error` for a TLS failure.
pub fn tls<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Tls).with(e.into())
}

pub fn location_value() -> Error {
    Error::new(Kind::LocationValue)
}

pub fn closed_pool() -> Error {
    Error::new(Kind::ClosedPool)
}

pub fn empty_pool() -> Error {
    Error::new(Kind::EmptyPool)
}

/// Creates an `Error` for a request error.
pub fn request<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Request).with(e.into())
}
