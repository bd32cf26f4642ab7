//! TLS support for verifying `https` connections
//!
//! Builds rustls client configurations from [`crate::config::TlsConfig`]
//! (bundled and native trust anchors, extra CA bundles, certificate pinning)
//! and reports whether TLS is usable in this process at all.

pub mod errors;
pub mod fingerprint;
pub mod tls_manager;
pub mod verifier;

pub use errors::TlsError;
pub use fingerprint::{Fingerprint, FingerprintAlgorithm};
pub use tls_manager::TlsManager;
pub use verifier::PinnedVerifier;
