//! TLS settings for `https` pools
//!
//! Only consulted when the crate is built with TLS support.

use std::path::PathBuf;

/// Whether the server certificate chain must validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertReqs {
    #[default]
    Required,
    /// Skip chain and hostname validation. A configured fingerprint is still enforced.
    None,
}

/// TLS configuration used by the verifying `https` connections
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsConfig {
    pub cert_reqs: CertReqs,

    /// PEM bundle with extra trust anchors
    pub ca_certs: Option<PathBuf>,

    /// Load the platform certificate store in addition to the bundled roots
    pub use_native_certs: bool,

    /// Name to verify the certificate against instead of the request host
    pub assert_hostname: Option<String>,

    /// Hex digest (SHA-256 or SHA-1) the leaf certificate must match, colons allowed
    pub assert_fingerprint: Option<String>,
}

impl TlsConfig {
    #[must_use]
    pub fn with_cert_reqs(mut self, cert_reqs: CertReqs) -> Self {
        self.cert_reqs = cert_reqs;
        self
    }

    #[must_use]
    pub fn with_ca_certs(mut self, path: impl Into<PathBuf>) -> Self {
        self.ca_certs = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_native_certs(mut self, enabled: bool) -> Self {
        self.use_native_certs = enabled;
        self
    }

    #[must_use]
    pub fn with_assert_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.assert_hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn with_assert_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.assert_fingerprint = Some(fingerprint.into());
        self
    }
}
