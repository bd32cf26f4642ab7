use std::error::Error as StdError;
use std::io;

use super::types::{Error, Kind};

impl Error {
    /// Returns true if the error came from configuring a manager or pool.
    #[must_use]
    pub fn is_builder(&self) -> bool {
        matches!(self.inner.kind, Kind::Builder)
    }

    /// Returns true if the dial through the proxy timed out.
    #[must_use]
    pub fn is_connect_timeout(&self) -> bool {
        matches!(self.inner.kind, Kind::ConnectTimeout { .. })
    }

    /// Returns true if the dial through the proxy failed at the socket level.
    #[must_use]
    pub fn is_new_connection(&self) -> bool {
        matches!(self.inner.kind, Kind::NewConnection)
    }

    /// Returns true for either of the two dial failure kinds.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        self.is_connect_timeout() || self.is_new_connection()
    }

    #[must_use]
    pub fn is_proxy(&self) -> bool {
        matches!(self.inner.kind, Kind::Proxy)
    }

    #[must_use]
    pub fn is_tls(&self) -> bool {
        matches!(self.inner.kind, Kind::Tls)
    }

    #[must_use]
    pub fn is_closed_pool(&self) -> bool {
        matches!(self.inner.kind, Kind::ClosedPool)
    }

    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self.inner.kind, Kind::Request)
    }

    /// Returns true if the error is related to a timeout anywhere in its chain.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        if self.is_connect_timeout() {
            return true;
        }

        let mut source = self.source();

        while let Some(err) = source {
            if let Some(io) = err.downcast_ref::<io::Error>()
                && matches!(io.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock)
            {
                return true;
            }
            source = err.source();
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::connect::ConnectionId;
    use crate::error;

    fn conn() -> ConnectionId {
        ConnectionId::new("http", "example.com", 80)
    }

    #[test]
    fn connect_timeout_message_names_host_and_timeout() {
        let err = error::connect_timeout(conn(), Some(Duration::from_secs(3)));
        assert!(err.is_connect_timeout());
        assert!(err.is_timeout());
        assert_eq!(
            err.to_string(),
            "Connection to example.com timed out. (connect timeout=3s)"
        );
    }

    #[test]
    fn connect_timeout_without_deadline_renders_none() {
        let err = error::connect_timeout(conn(), None);
        assert!(err.to_string().ends_with("(connect timeout=None)"));
    }

    #[test]
    fn new_connection_message_carries_underlying_text() {
        let io = io::Error::new(io::ErrorKind::ConnectionRefused, "refused");
        let err = error::new_connection(conn(), io);
        assert!(err.is_new_connection());
        assert!(!err.is_timeout());
        assert_eq!(err.to_string(), "Failed to establish a new connection: refused");
        assert_eq!(err.connection(), Some(&conn()));
    }

    #[test]
    fn unknown_socks_version_is_a_builder_error() {
        let err = error::unknown_socks_version("http://host:1080");
        assert!(err.is_builder());
        assert!(
            err.to_string()
                .contains("Unable to determine SOCKS version from http://host:1080")
        );
    }
}
