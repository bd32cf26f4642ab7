//! Connect and read timeouts
//!
//! `None` on either field means the operation may block indefinitely.

use std::time::Duration;

/// Connect/read timeout pair applied to every connection of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timeout {
    /// Deadline for reaching the proxy and completing the SOCKS and TLS handshakes
    pub connect: Option<Duration>,
    /// Socket read/write timeout once the transport is ready for requests
    pub read: Option<Duration>,
}

impl Timeout {
    /// Use the same duration for connect and read.
    #[must_use]
    pub fn new(total: Duration) -> Self {
        Self {
            connect: Some(total),
            read: Some(total),
        }
    }

    /// No deadline at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Set the connect timeout
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use socks_proxy_client::config::Timeout;
    ///
    /// let timeout = Timeout::none().with_connect(Duration::from_secs(5));
    /// assert_eq!(timeout.connect, Some(Duration::from_secs(5)));
    /// assert_eq!(timeout.read, None);
    /// ```
    #[must_use]
    pub fn with_connect(mut self, timeout: Duration) -> Self {
        self.connect = Some(timeout);
        self
    }

    /// Set the read timeout
    #[must_use]
    pub fn with_read(mut self, timeout: Duration) -> Self {
        self.read = Some(timeout);
        self
    }

    pub(crate) fn has_zero(&self) -> bool {
        self.connect.is_some_and(|d| d.is_zero()) || self.read.is_some_and(|d| d.is_zero())
    }
}
