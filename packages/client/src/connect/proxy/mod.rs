//! SOCKS proxy configuration
//!
//! Version selection and the shared proxy options record.

mod socks;

pub use socks::{ProxyOptions, SocksAuth, SocksVersion};
