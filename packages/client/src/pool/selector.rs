//! Scheme to pool-class mapping
//!
//! The mapping is fixed for the life of the process once TLS availability is
//! known. When TLS cannot be used, `https` falls back to the plain proxied pool
//! and the resolved mapping says so through [`PoolClasses::verification_disabled`].

use std::sync::OnceLock;

/// Whether verified TLS connections can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TlsSupport {
    Available,
    Unavailable,
}

impl TlsSupport {
    /// Probe once per process and cache the result.
    pub fn detect() -> Self {
        static DETECTED: OnceLock<TlsSupport> = OnceLock::new();
        *DETECTED.get_or_init(probe)
    }

    pub fn is_available(self) -> bool {
        self == TlsSupport::Available
    }
}

#[cfg(feature = "__rustls")]
fn probe() -> TlsSupport {
    if crate::tls::TlsManager::probe() {
        TlsSupport::Available
    } else {
        TlsSupport::Unavailable
    }
}

#[cfg(not(feature = "__rustls"))]
fn probe() -> TlsSupport {
    TlsSupport::Unavailable
}

/// The concrete pool implementation a scheme is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolClass {
    /// Plain proxied connections
    SocksHttp,
    /// Proxied connections wrapped in verified TLS
    SocksHttps,
    /// `https` served without TLS verification because TLS is unavailable
    SocksHttpsUnverified,
}

impl PoolClass {
    pub fn is_verified(self) -> bool {
        self == PoolClass::SocksHttps
    }
}

/// Resolved scheme mapping, immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolClasses {
    http: PoolClass,
    https: PoolClass,
    tls_support: TlsSupport,
}

impl PoolClasses {
    pub fn resolve(tls_support: TlsSupport) -> Self {
        let https = match tls_support {
            TlsSupport::Available => PoolClass::SocksHttps,
            TlsSupport::Unavailable => {
                tracing::warn!(
                    "TLS support unavailable; https connections through the SOCKS proxy will not be verified"
                );
                PoolClass::SocksHttpsUnverified
            }
        };
        Self {
            http: PoolClass::SocksHttp,
            https,
            tls_support,
        }
    }

    /// Mapping for the TLS support detected in this process.
    pub fn detected() -> Self {
        Self::resolve(TlsSupport::detect())
    }

    /// Pool class for `scheme`; `None` for anything but `http` and `https`.
    pub fn for_scheme(&self, scheme: &str) -> Option<PoolClass> {
        if scheme.eq_ignore_ascii_case("http") {
            Some(self.http)
        } else if scheme.eq_ignore_ascii_case("https") {
            Some(self.https)
        } else {
            None
        }
    }

    /// True when `https` is served by the unverified fallback.
    pub fn verification_disabled(&self) -> bool {
        self.https == PoolClass::SocksHttpsUnverified
    }

    pub fn tls_support(&self) -> TlsSupport {
        self.tls_support
    }
}
