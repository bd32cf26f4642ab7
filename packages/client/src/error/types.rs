use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use crate::connect::ConnectionId;

/// A Result alias where the Err case is `socks_proxy_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while configuring a manager or establishing proxied connections.
pub struct Error {
    pub inner: Box<Inner>,
}

pub struct Inner {
    pub kind: Kind,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub url: Option<url::Url>,
    pub connection: Option<ConnectionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Invalid configuration, detected while building a manager or pool
    Builder,
    /// The dial through the proxy timed out
    ConnectTimeout { timeout: Option<Duration> },
    /// Any other socket-level failure while dialing through the proxy
    NewConnection,
    /// Non-socket failure reported by the dial primitive, passed through untouched
    Proxy,
    /// TLS setup, handshake or certificate verification failure
    Tls,
    /// The request target has no usable host
    LocationValue,
    /// The pool was closed before the connection was requested
    ClosedPool,
    /// A blocking pool has no connection left to hand out
    EmptyPool,
    /// Writing the request or reading the response failed
    Request,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                url: None,
                connection: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: url::Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    #[must_use]
    pub fn with_connection(mut self, connection: ConnectionId) -> Self {
        self.inner.connection = Some(connection);
        self
    }

    /// The category of this error.
    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.inner.kind
    }

    /// Get the URL associated with this error, if any
    #[must_use]
    pub fn url(&self) -> Option<&url::Url> {
        self.inner.url.as_ref()
    }

    /// Identity of the connection that failed, if the error came from a dial.
    #[must_use]
    pub fn connection(&self) -> Option<&ConnectionId> {
        self.inner.connection.as_ref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("socks_proxy_client::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", url);
        }

        if let Some(ref connection) = self.inner.connection {
            f.field("connection", connection);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = self.inner.source.as_ref();
        match &self.inner.kind {
            Kind::Builder => match source {
                Some(source) => write!(f, "builder error: {source}"),
                None => f.write_str("builder error"),
            },
            Kind::ConnectTimeout { timeout } => {
                let host = self
                    .inner
                    .connection
                    .as_ref()
                    .map_or("<unknown>", |c| c.host.as_str());
                write!(
                    f,
                    "Connection to {host} timed out. (connect timeout={})",
                    DisplayTimeout(*timeout)
                )
            }
            Kind::NewConnection => match source {
                Some(source) => write!(f, "Failed to establish a new connection: {source}"),
                None => f.write_str("Failed to establish a new connection"),
            },
            Kind::Proxy => match source {
                Some(source) => write!(f, "proxy dial error: {source}"),
                None => f.write_str("proxy dial error"),
            },
            Kind::Tls => match source {
                Some(source) => write!(f, "TLS error: {source}"),
                None => f.write_str("TLS error"),
            },
            Kind::LocationValue => f.write_str("No host specified."),
            Kind::ClosedPool => f.write_str("Pool is closed."),
            Kind::EmptyPool => {
                f.write_str("Pool reached maximum size and no more connections are allowed.")
            }
            Kind::Request => match source {
                Some(source) => write!(f, "error sending request: {source}"),
                None => f.write_str("error sending request"),
            },
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}

/// Renders an optional timeout, `None` meaning the dial had no deadline.
pub(crate) struct DisplayTimeout(pub Option<Duration>);

impl fmt::Display for DisplayTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(timeout) => write!(f, "{timeout:?}"),
            None => f.write_str("None"),
        }
    }
}
