//! Pool manager: one pool per origin, bounded by an LRU

use std::fmt;
use std::sync::Arc;

use http::{HeaderMap, Method, Response};
use url::{Host, Url};

use super::connection_pool::ConnectionPool;
use super::key::PoolKey;
use super::recently_used::RecentlyUsed;
use super::selector::PoolClasses;
use crate::config::PoolConfig;
use crate::connect::{Dial, ProxyOptions};
use crate::error::{self, Result};

/// Everything a [`PoolManager`] needs besides its dial primitive.
#[derive(Debug, Clone)]
pub struct PoolManagerConfig {
    /// Number of pools kept before the least recently used one is closed
    pub num_pools: usize,
    /// Headers sent with every request unless the request overrides them
    pub headers: HeaderMap,
    pub pool: PoolConfig,
    /// Proxy options shared by every pool and connection
    pub socks_options: Arc<ProxyOptions>,
    pub pool_classes: PoolClasses,
}

/// Hands out shared pools keyed by scheme, host and port.
pub struct PoolManager {
    pools: RecentlyUsed<PoolKey, Arc<ConnectionPool>>,
    pool_classes: PoolClasses,
    pool_config: Arc<PoolConfig>,
    socks_options: Arc<ProxyOptions>,
    headers: HeaderMap,
    dialer: Arc<dyn Dial>,
}

impl PoolManager {
    pub fn new(config: PoolManagerConfig, dialer: Arc<dyn Dial>) -> Result<Self> {
        if config.num_pools == 0 {
            return Err(error::builder("num_pools must be at least 1"));
        }
        config.pool.validate()?;

        let pools = RecentlyUsed::with_dispose(config.num_pools, |pool: Arc<ConnectionPool>| {
            pool.close();
        });

        Ok(Self {
            pools,
            pool_classes: config.pool_classes,
            pool_config: Arc::new(config.pool),
            socks_options: config.socks_options,
            headers: config.headers,
            dialer,
        })
    }

    pub fn pool_classes(&self) -> &PoolClasses {
        &self.pool_classes
    }

    pub fn pool_config(&self) -> &PoolConfig {
        &self.pool_config
    }

    pub fn socks_options(&self) -> &Arc<ProxyOptions> {
        &self.socks_options
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Number of live pools.
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// The pool serving `scheme://host:port`, created on first use.
    ///
    /// `port` defaults to the scheme's default port.
    pub fn connection_from_host(
        &self,
        host: &str,
        port: Option<u16>,
        scheme: &str,
    ) -> Result<Arc<ConnectionPool>> {
        let key = PoolKey::new(scheme, host, port)?;
        self.connection_from_pool_key(key)
    }

    /// The pool serving the origin of `url`.
    pub fn connection_from_url(&self, url: &str) -> Result<Arc<ConnectionPool>> {
        let parsed = parse_url(url)?;
        let key = key_for_url(&parsed)?;
        self.connection_from_pool_key(key)
    }

    pub fn connection_from_pool_key(&self, key: PoolKey) -> Result<Arc<ConnectionPool>> {
        let class = self.pool_classes.for_scheme(&key.scheme).ok_or_else(|| {
            error::builder(format!("unsupported scheme for a SOCKS pool: {}", key.scheme))
        })?;

        self.pools.get_or_try_insert_with(key.clone(), || {
            ConnectionPool::new(
                key,
                class,
                self.pool_config.clone(),
                self.socks_options.clone(),
                self.dialer.clone(),
            )
            .map(|pool| Arc::new(pool.with_headers(self.headers.clone())))
        })
    }

    /// Send a request to `url` through the pool for its origin.
    pub fn urlopen(
        &self,
        method: &Method,
        url: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Response<Vec<u8>>> {
        let parsed = parse_url(url)?;
        let pool = self.connection_from_pool_key(key_for_url(&parsed)?)?;

        let mut target = parsed.path().to_string();
        if let Some(query) = parsed.query() {
            target.push('?');
            target.push_str(query);
        }

        pool.urlopen(method, &target, headers, body)
            .map_err(|e| e.with_url(parsed))
    }

    /// Close and forget every pool.
    pub fn clear(&self) {
        self.pools.clear();
    }
}

impl fmt::Debug for PoolManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolManager")
            .field("pools", &self.pools.len())
            .field("pool_classes", &self.pool_classes)
            .field("socks_options", &self.socks_options)
            .finish_non_exhaustive()
    }
}

fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|e| match e {
        url::ParseError::EmptyHost => error::location_value(),
        other => error::builder(other),
    })
}

fn key_for_url(url: &Url) -> Result<PoolKey> {
    let host = match url.host() {
        Some(Host::Domain(domain)) => domain.to_string(),
        Some(Host::Ipv4(addr)) => addr.to_string(),
        Some(Host::Ipv6(addr)) => addr.to_string(),
        None => return Err(error::location_value().with_url(url.clone())),
    };
    PoolKey::new(url.scheme(), &host, url.port_or_known_default())
}
