//! Socks Proxy Client Prelude
//!
//! The types most callers need to build a manager and handle its errors.

// Entry point
pub use crate::client::{SocksProxyManager, SocksProxyManagerBuilder};

// Error types
pub use crate::error::{Error, Kind, Result};

// Configuration
pub use crate::config::{CertReqs, PoolConfig, SocketOptions, Timeout, TlsConfig};

// Proxy description and dial seam
pub use crate::connect::{
    ConnectionRequest, Dial, DialError, ProxyOptions, SocksDialer, SocksVersion, Transport,
};

// Pools
pub use crate::pool::{ConnectionPool, PoolClass, PoolClasses, TlsSupport};

// HTTP standard types from http crate
pub use ::http::{HeaderMap, HeaderName, HeaderValue, Method, Response, StatusCode};
