use std::fmt;

use crate::error::{self, Result};

/// Default port for a URL scheme, 80 for anything but `https`.
pub fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}

/// Identity of a pool: requests with equal keys share one pool.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PoolKey {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl PoolKey {
    /// Normalize scheme and host to lowercase and fill in the default port.
    ///
    /// IPv6 literals may be given with or without brackets.
    pub fn new(scheme: &str, host: &str, port: Option<u16>) -> Result<Self> {
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            return Err(error::location_value());
        }

        let scheme = scheme.to_ascii_lowercase();
        let port = port.unwrap_or_else(|| default_port(&scheme));
        Ok(Self {
            host: host.to_ascii_lowercase(),
            scheme,
            port,
        })
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}://[{}]:{}", self.scheme, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}
