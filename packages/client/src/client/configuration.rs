//! Builder and proxy URL parsing for [`SocksProxyManager`]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::{HeaderName, HeaderValue};
use http::HeaderMap;
use url::{Host, Url};

use super::core::SocksProxyManager;
use super::{DEFAULT_NUM_POOLS, DEFAULT_SOCKS_PORT};
use crate::config::{PoolConfig, Timeout, TlsConfig};
use crate::connect::{Dial, ProxyOptions, SocksDialer, SocksVersion};
use crate::error::{self, Result};
use crate::pool::{PoolClasses, PoolManager, PoolManagerConfig, TlsSupport};

/// Configures and builds a [`SocksProxyManager`].
///
/// Construction either yields a fully usable manager or an error; nothing is
/// built when the proxy URL cannot be understood.
#[must_use]
pub struct SocksProxyManagerBuilder {
    proxy_url: String,
    username: Option<String>,
    password: Option<String>,
    num_pools: usize,
    headers: HeaderMap,
    pool_config: PoolConfig,
    dialer: Option<Arc<dyn Dial>>,
    tls_support: Option<TlsSupport>,
    require_verified_https: bool,
    error: Option<error::Error>,
}

impl SocksProxyManagerBuilder {
    pub fn new(proxy_url: impl Into<String>) -> Self {
        Self {
            proxy_url: proxy_url.into(),
            username: None,
            password: None,
            num_pools: DEFAULT_NUM_POOLS,
            headers: HeaderMap::new(),
            pool_config: PoolConfig::default(),
            dialer: None,
            tls_support: None,
            require_verified_https: false,
            error: None,
        }
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn num_pools(mut self, num_pools: usize) -> Self {
        self.num_pools = num_pools;
        self
    }

    /// Replace the default headers.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Add one default header; invalid names or values fail `build`.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            (Err(e), _) => self.error = Some(error::builder(e)),
            (_, Err(e)) => self.error = Some(error::builder(e)),
        }
        self
    }

    pub fn pool_config(mut self, pool_config: PoolConfig) -> Self {
        self.pool_config = pool_config;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.pool_config.timeout = Timeout::new(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config.timeout.connect = Some(timeout);
        self
    }

    pub fn tls(mut self, tls: TlsConfig) -> Self {
        self.pool_config.tls = tls;
        self
    }

    /// Use another dial primitive instead of [`SocksDialer`].
    pub fn dialer(mut self, dialer: Arc<dyn Dial>) -> Self {
        self.dialer = Some(dialer);
        self
    }

    /// Override TLS detection, mainly for exercising the unverified fallback.
    pub fn tls_support(mut self, tls_support: TlsSupport) -> Self {
        self.tls_support = Some(tls_support);
        self
    }

    /// Fail `build` instead of serving `https` without verification.
    pub fn require_verified_https(mut self, required: bool) -> Self {
        self.require_verified_https = required;
        self
    }

    pub fn build(self) -> Result<SocksProxyManager> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let parsed = ParsedProxyUrl::parse(&self.proxy_url)?;

        let (username, password) = if self.username.is_none() && self.password.is_none() {
            (parsed.username, parsed.password)
        } else {
            (self.username, self.password)
        };

        let proxy_options = Arc::new(ProxyOptions {
            socks_version: parsed.version,
            proxy_host: parsed.host,
            proxy_port: parsed.port,
            username,
            password,
        });

        let pool_classes = match self.tls_support {
            Some(tls_support) => PoolClasses::resolve(tls_support),
            None => PoolClasses::detected(),
        };
        if self.require_verified_https && pool_classes.verification_disabled() {
            return Err(error::builder(
                "TLS support is unavailable and verified https connections were required",
            ));
        }

        let dialer = self.dialer.unwrap_or_else(|| Arc::new(SocksDialer));
        let pools = PoolManager::new(
            PoolManagerConfig {
                num_pools: self.num_pools,
                headers: self.headers,
                pool: self.pool_config,
                socks_options: proxy_options.clone(),
                pool_classes,
            },
            dialer,
        )?;

        tracing::debug!(
            "SOCKS proxy manager using {} proxy at {}",
            proxy_options.socks_version.scheme(),
            proxy_options.authority()
        );

        Ok(SocksProxyManager::from_parts(
            self.proxy_url,
            proxy_options,
            pools,
        ))
    }
}

impl fmt::Debug for SocksProxyManagerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocksProxyManagerBuilder")
            .field("num_pools", &self.num_pools)
            .field("pool_config", &self.pool_config)
            .field("tls_support", &self.tls_support)
            .field("require_verified_https", &self.require_verified_https)
            .finish_non_exhaustive()
    }
}

/// Components of a `socks4://` or `socks5://` proxy URL.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedProxyUrl {
    version: SocksVersion,
    host: String,
    port: u16,
    username: Option<String>,
    password: Option<String>,
}

impl ParsedProxyUrl {
    fn parse(proxy_url: &str) -> Result<Self> {
        let url = Url::parse(proxy_url).map_err(|e| {
            error::builder(format!("Invalid proxy URL {proxy_url}: {e}"))
        })?;

        let version = SocksVersion::from_scheme(url.scheme())
            .ok_or_else(|| error::unknown_socks_version(proxy_url))?;

        let host = match url.host() {
            Some(Host::Domain(domain)) if !domain.is_empty() => domain.to_string(),
            Some(Host::Ipv4(addr)) => addr.to_string(),
            Some(Host::Ipv6(addr)) => addr.to_string(),
            _ => {
                return Err(error::builder(format!(
                    "Proxy URL {proxy_url} does not name a proxy host"
                )));
            }
        };

        let username = match url.username() {
            "" => None,
            raw => Some(decode_userinfo(raw)?),
        };
        let password = url.password().map(decode_userinfo).transpose()?;

        Ok(Self {
            version,
            host,
            port: url.port().unwrap_or(DEFAULT_SOCKS_PORT),
            username,
            password,
        })
    }
}

fn decode_userinfo(raw: &str) -> Result<String> {
    urlencoding::decode(raw)
        .map(|decoded| decoded.into_owned())
        .map_err(error::builder)
}
