//! SOCKS proxy options
//!
//! This module contains the SOCKS version selection and the immutable proxy
//! options record shared by every connection created under one manager.

use std::fmt;

/// SOCKS protocol version enumeration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SocksVersion {
    V4,
    V5,
}

impl SocksVersion {
    /// Resolve the version from a proxy URL scheme token.
    ///
    /// Only `socks5` and `socks4` are recognised.
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "socks5" => Some(SocksVersion::V5),
            "socks4" => Some(SocksVersion::V4),
            _ => None,
        }
    }

    #[must_use]
    pub fn scheme(self) -> &'static str {
        match self {
            SocksVersion::V4 => "socks4",
            SocksVersion::V5 => "socks5",
        }
    }
}

/// Proxy authentication methods
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SocksAuth<'a> {
    None,
    UsernamePassword { username: &'a str, password: &'a str },
}

/// Resolved proxy endpoint and credentials.
///
/// Built once per manager and shared read-only, through an `Arc`, by every
/// pool and connection the manager creates.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProxyOptions {
    pub socks_version: SocksVersion,
    pub proxy_host: String,
    pub proxy_port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl ProxyOptions {
    /// Unauthenticated SOCKS5 proxy
    #[must_use]
    pub fn socks5(proxy_host: impl Into<String>, proxy_port: u16) -> Self {
        Self {
            socks_version: SocksVersion::V5,
            proxy_host: proxy_host.into(),
            proxy_port,
            username: None,
            password: None,
        }
    }

    /// SOCKS4 proxy; a username, if set later, is sent as the SOCKS4 user id
    #[must_use]
    pub fn socks4(proxy_host: impl Into<String>, proxy_port: u16) -> Self {
        Self {
            socks_version: SocksVersion::V4,
            ..Self::socks5(proxy_host, proxy_port)
        }
    }

    #[must_use]
    pub fn with_credentials(
        mut self,
        username: Option<String>,
        password: Option<String>,
    ) -> Self {
        self.username = username;
        self.password = password;
        self
    }

    /// Credentials usable for SOCKS5 username/password negotiation.
    ///
    /// Both halves must be present; a lone username only serves as a SOCKS4 user id.
    #[must_use]
    pub fn auth(&self) -> SocksAuth<'_> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => SocksAuth::UsernamePassword { username, password },
            _ => SocksAuth::None,
        }
    }

    /// `host:port` of the proxy endpoint, IPv6 hosts bracketed.
    #[must_use]
    pub fn authority(&self) -> String {
        if self.proxy_host.contains(':') {
            format!("[{}]:{}", self.proxy_host, self.proxy_port)
        } else {
            format!("{}:{}", self.proxy_host, self.proxy_port)
        }
    }
}

impl fmt::Debug for ProxyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyOptions")
            .field("socks_version", &self.socks_version)
            .field("proxy_host", &self.proxy_host)
            .field("proxy_port", &self.proxy_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}
