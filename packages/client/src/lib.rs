//! # SOCKS Proxy Client
//!
//! HTTP connection pools whose connections are opened through a SOCKS4 or
//! SOCKS5 proxy instead of a direct TCP connect.
//!
//! ## Features
//!
//! - **SOCKS4/4a and SOCKS5** handshakes, including RFC 1929 username/password
//! - **Per-origin connection pools** with least-recently-used eviction
//! - **Verified HTTPS** over the proxied stream using rustls, with optional
//!   extra CA bundles and certificate fingerprint pinning
//! - **Typed errors** that separate connect timeouts from other connection failures
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use socks_proxy_client::{Method, SocksProxyManager};
//!
//! let manager = SocksProxyManager::builder("socks5://127.0.0.1:1080")
//!     .timeout(Duration::from_secs(10))
//!     .build()?;
//!
//! let response = manager.request(Method::GET, "https://example.com/")?;
//! assert!(response.status().is_success());
//! # Ok::<(), socks_proxy_client::Error>(())
//! ```
//!
//! Without TLS support (the `__rustls` feature disabled) `https` URLs are
//! still served, but unverified; [`SocksProxyManager::verification_disabled`]
//! reports this and `require_verified_https(true)` turns it into a
//! construction error.

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod connect;
pub mod connection;
pub mod error;
pub mod pool;
#[cfg(feature = "__rustls")]
pub mod tls;

// Prelude with canonical types
pub mod prelude;

pub use crate::prelude::*;
