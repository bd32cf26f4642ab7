//! The SOCKS proxy manager: the crate's entry point
//!
//! [`SocksProxyManager`] turns a proxy URL into shared proxy options and a
//! pool manager whose pools dial every connection through that proxy.

pub mod configuration;
pub mod core;

pub use configuration::SocksProxyManagerBuilder;
pub use core::SocksProxyManager;

/// Port used when the proxy URL does not name one
pub const DEFAULT_SOCKS_PORT: u16 = 1080;

/// Pools kept by a manager unless configured otherwise
pub const DEFAULT_NUM_POOLS: usize = 10;
