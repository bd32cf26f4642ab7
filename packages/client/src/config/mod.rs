//! Typed configuration for proxied connection pools
//!
//! Every pool created by a manager is constructed from one immutable
//! [`PoolConfig`]; the SOCKS proxy options travel next to it as their own
//! named parameter rather than inside a loose key/value bag.

pub mod network;
pub mod pool;
pub mod security;
pub mod timeout;

pub use network::SocketOptions;
pub use pool::PoolConfig;
pub use security::{CertReqs, TlsConfig};
pub use timeout::Timeout;
