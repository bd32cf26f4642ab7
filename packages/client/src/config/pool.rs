//! Per-pool construction parameters

use std::net::SocketAddr;

use super::{SocketOptions, Timeout, TlsConfig};
use crate::error::{self, Result};

/// Parameters shared by every pool a manager creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    pub timeout: Timeout,

    /// Number of idle connections kept for reuse
    pub maxsize: usize,

    /// Refuse to open more than `maxsize` live connections
    pub block: bool,

    /// Local address the proxy socket binds to
    pub source_address: Option<SocketAddr>,

    pub socket_options: SocketOptions,

    pub tls: TlsConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            timeout: Timeout::default(),
            maxsize: 1,
            block: false,
            source_address: None,
            socket_options: SocketOptions::default(),
            tls: TlsConfig::default(),
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_maxsize(mut self, maxsize: usize) -> Self {
        self.maxsize = maxsize;
        self
    }

    #[must_use]
    pub fn with_block(mut self, block: bool) -> Self {
        self.block = block;
        self
    }

    #[must_use]
    pub fn with_source_address(mut self, addr: SocketAddr) -> Self {
        self.source_address = Some(addr);
        self
    }

    #[must_use]
    pub fn with_socket_options(mut self, options: SocketOptions) -> Self {
        self.socket_options = options;
        self
    }

    #[must_use]
    pub fn with_tls(mut self, tls: TlsConfig) -> Self {
        self.tls = tls;
        self
    }

    /// Reject settings no pool can honour.
    pub fn validate(&self) -> Result<()> {
        if self.maxsize == 0 {
            return Err(error::builder("pool maxsize must be at least 1"));
        }
        if self.timeout.has_zero() {
            return Err(error::builder(
                "zero timeouts are not supported, use None for no timeout",
            ));
        }
        Ok(())
    }
}
