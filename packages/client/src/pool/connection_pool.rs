//! A pool of connections to one (scheme, host, port)

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use http::{HeaderMap, Method, Response};

use super::key::PoolKey;
use super::selector::PoolClass;
use crate::config::PoolConfig;
use crate::connect::{ConnectionId, Dial, ProxyOptions};
use crate::connection::{
    ConnectionKind, EstablishTransport, HttpConnection, ProxiedEstablisher,
};
use crate::error::{self, Result};

/// Reuses connections to a single origin, all opened through the same proxy.
///
/// Idle connections are handed out most recently returned first. At most
/// `maxsize` idle connections are retained; with `block` set, no more than
/// `maxsize` connections are ever live at once.
pub struct ConnectionPool {
    key: PoolKey,
    class: PoolClass,
    config: Arc<PoolConfig>,
    socks_options: Arc<ProxyOptions>,
    establisher: Arc<dyn EstablishTransport>,
    headers: HeaderMap,
    /// `None` once the pool is closed
    idle: Mutex<Option<VecDeque<HttpConnection>>>,
    checked_out: AtomicUsize,
    num_connections: AtomicUsize,
    num_requests: AtomicUsize,
}

impl ConnectionPool {
    pub fn new(
        key: PoolKey,
        class: PoolClass,
        config: Arc<PoolConfig>,
        socks_options: Arc<ProxyOptions>,
        dialer: Arc<dyn Dial>,
    ) -> Result<Self> {
        let proxied = ProxiedEstablisher::new(key.scheme.clone(), dialer, socks_options.clone());
        let establisher: Arc<dyn EstablishTransport> = match class {
            PoolClass::SocksHttp | PoolClass::SocksHttpsUnverified => Arc::new(proxied),
            PoolClass::SocksHttps => verified_establisher(proxied, &config)?,
        };

        tracing::debug!("Starting new {:?} pool for {}", class, key);

        Ok(Self {
            key,
            class,
            config,
            socks_options,
            establisher,
            headers: HeaderMap::new(),
            idle: Mutex::new(Some(VecDeque::new())),
            checked_out: AtomicUsize::new(0),
            num_connections: AtomicUsize::new(0),
            num_requests: AtomicUsize::new(0),
        })
    }

    /// Default headers merged under every request's own headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn key(&self) -> &PoolKey {
        &self.key
    }

    pub fn class(&self) -> PoolClass {
        self.class
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn socks_options(&self) -> &Arc<ProxyOptions> {
        &self.socks_options
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn num_connections(&self) -> usize {
        self.num_connections.load(Ordering::Relaxed)
    }

    pub fn num_requests(&self) -> usize {
        self.num_requests.load(Ordering::Relaxed)
    }

    pub fn num_idle(&self) -> usize {
        self.lock_idle().as_ref().map_or(0, VecDeque::len)
    }

    pub fn is_closed(&self) -> bool {
        self.lock_idle().is_none()
    }

    fn lock_idle(&self) -> MutexGuard<'_, Option<VecDeque<HttpConnection>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a new, not yet connected, connection of this pool's class.
    pub fn new_conn(&self) -> HttpConnection {
        let count = self.num_connections.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!("Starting new connection ({}): {}", count, self.key);

        let kind = if self.class.is_verified() {
            ConnectionKind::Verified
        } else {
            ConnectionKind::Plain
        };
        HttpConnection::new(
            ConnectionId::new(self.key.scheme.clone(), self.key.host.clone(), self.key.port),
            kind,
            self.socks_options.clone(),
            self.establisher.clone(),
        )
        .with_timeout(self.config.timeout)
        .with_source_address(self.config.source_address)
        .with_socket_options(self.config.socket_options.clone())
    }

    /// Take an idle connection or make a new one.
    pub fn get_conn(&self) -> Result<HttpConnection> {
        let mut idle = self.lock_idle();
        let Some(queue) = idle.as_mut() else {
            return Err(error::closed_pool());
        };

        if let Some(conn) = queue.pop_back() {
            self.checked_out.fetch_add(1, Ordering::AcqRel);
            return Ok(conn);
        }

        if self.config.block && self.checked_out.load(Ordering::Acquire) >= self.config.maxsize {
            return Err(error::empty_pool());
        }
        self.checked_out.fetch_add(1, Ordering::AcqRel);
        drop(idle);

        Ok(self.new_conn())
    }

    /// Return a connection taken with [`get_conn`](Self::get_conn).
    ///
    /// It is closed instead of kept when the pool is full or closed.
    pub fn put_conn(&self, conn: HttpConnection) {
        let _ = self
            .checked_out
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        let rejected = {
            let mut idle = self.lock_idle();
            match idle.as_mut() {
                Some(queue) if queue.len() < self.config.maxsize => {
                    queue.push_back(conn);
                    None
                }
                Some(_) => Some((conn, true)),
                None => Some((conn, false)),
            }
        };

        if let Some((mut conn, full)) = rejected {
            if full {
                tracing::warn!(
                    "Connection pool is full, discarding connection: {}",
                    self.key.host
                );
            }
            conn.close();
        }
    }

    /// Send one request over a pooled connection.
    pub fn urlopen(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Response<Vec<u8>>> {
        let mut merged = self.headers.clone();
        for (name, value) in headers {
            merged.insert(name.clone(), value.clone());
        }

        let mut conn = self.get_conn()?;
        self.num_requests.fetch_add(1, Ordering::Relaxed);
        let result = conn.request(method, path, &merged, body);
        if result.is_err() {
            conn.close();
        }
        self.put_conn(conn);
        result
    }

    /// Close every idle connection; later `get_conn` calls fail.
    pub fn close(&self) {
        let drained = self.lock_idle().take();
        if let Some(queue) = drained {
            for mut conn in queue {
                conn.close();
            }
            tracing::debug!("Closed pool {}", self.key);
        }
    }
}

#[cfg(feature = "__rustls")]
fn verified_establisher(
    proxied: ProxiedEstablisher,
    config: &PoolConfig,
) -> Result<Arc<dyn EstablishTransport>> {
    use crate::connection::{TlsWrapper, VerifiedEstablisher};

    let wrapper = TlsWrapper::from_config(&config.tls).map_err(error::tls)?;
    Ok(Arc::new(VerifiedEstablisher::new(proxied, wrapper)))
}

#[cfg(not(feature = "__rustls"))]
fn verified_establisher(
    _proxied: ProxiedEstablisher,
    _config: &PoolConfig,
) -> Result<Arc<dyn EstablishTransport>> {
    Err(error::builder("verified https pools need the `__rustls` feature"))
}

impl fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("key", &self.key)
            .field("class", &self.class)
            .field("num_connections", &self.num_connections())
            .field("num_requests", &self.num_requests())
            .finish_non_exhaustive()
    }
}
