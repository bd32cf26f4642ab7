//! A single pooled HTTP/1.1 connection

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use http::{HeaderMap, Method, Response};

use super::ConnectionKind;
use super::establish::EstablishTransport;
use super::response::{
    ReadResponse, is_no_response, no_response, read_response, validate_target, write_request,
};
use crate::config::{SocketOptions, Timeout};
use crate::connect::{ConnectionId, ConnectionRequest, ProxyOptions, Transport};
use crate::error::{self, Result};

/// Connection to one target whose transport comes from an establisher.
///
/// The transport is opened lazily by [`connect`](Self::connect) or the first
/// request, and dropped when the peer does not keep the connection alive or a
/// request fails. A reused transport that the peer closed while idle is
/// replaced once before the request is reported as failed.
pub struct HttpConnection {
    id: ConnectionId,
    kind: ConnectionKind,
    timeout: Timeout,
    source_address: Option<SocketAddr>,
    socket_options: SocketOptions,
    socks_options: Arc<ProxyOptions>,
    establisher: Arc<dyn EstablishTransport>,
    sock: Option<Transport>,
}

impl HttpConnection {
    pub fn new(
        id: ConnectionId,
        kind: ConnectionKind,
        socks_options: Arc<ProxyOptions>,
        establisher: Arc<dyn EstablishTransport>,
    ) -> Self {
        Self {
            id,
            kind,
            timeout: Timeout::default(),
            source_address: None,
            socket_options: SocketOptions::default(),
            socks_options,
            establisher,
            sock: None,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Timeout) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_source_address(mut self, addr: Option<SocketAddr>) -> Self {
        self.source_address = addr;
        self
    }

    #[must_use]
    pub fn with_socket_options(mut self, options: SocketOptions) -> Self {
        self.socket_options = options;
        self
    }

    pub fn id(&self) -> &ConnectionId {
        &self.id
    }

    pub fn host(&self) -> &str {
        &self.id.host
    }

    pub fn port(&self) -> u16 {
        self.id.port
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    pub fn timeout(&self) -> Timeout {
        self.timeout
    }

    /// The proxy options shared by every connection of the owning manager.
    pub fn socks_options(&self) -> &Arc<ProxyOptions> {
        &self.socks_options
    }

    pub fn is_connected(&self) -> bool {
        self.sock.is_some()
    }

    /// Dial parameters built from this connection's configured state.
    pub fn connection_request(&self) -> ConnectionRequest {
        ConnectionRequest::new(self.id.host.clone(), self.id.port)
            .with_timeout(self.timeout.connect)
            .with_source_address(self.source_address)
            .with_socket_options(self.socket_options.clone())
    }

    /// Open a fresh transport, replacing any existing one.
    ///
    /// Performs exactly one establishment attempt. The connect timeout covers
    /// the proxy handshake and any TLS handshake; the read timeout takes over
    /// once the transport is ready.
    pub fn connect(&mut self) -> Result<()> {
        self.sock = None;
        let request = self.connection_request();
        let sock = self.establisher.establish(&request)?;
        sock.set_io_timeout(self.timeout.read)
            .map_err(|e| error::new_connection(self.id.clone(), e))?;
        self.sock = Some(sock);
        Ok(())
    }

    /// Send one request and read its response.
    ///
    /// `path` is the request target, e.g. `/index.html?q=1`.
    pub fn request(
        &mut self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Result<Response<Vec<u8>>> {
        validate_target(path)
            .map_err(|e| error::request(e).with_connection(self.id.clone()))?;

        let reused = self.sock.is_some();
        if !reused {
            self.connect()?;
        }

        let mut outcome = self.exchange(method, path, headers, body);
        if reused && matches!(&outcome, Err(e) if is_no_response(e)) {
            tracing::debug!("Idle connection to {} was closed by peer, reconnecting", self.id);
            self.connect()?;
            outcome = self.exchange(method, path, headers, body);
        }

        match outcome {
            Ok(read) => {
                if !read.keep_alive {
                    self.close();
                }
                Ok(read.response)
            }
            Err(e) => {
                self.close();
                Err(error::request(e).with_connection(self.id.clone()))
            }
        }
    }

    fn exchange(
        &mut self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
        body: &[u8],
    ) -> io::Result<ReadResponse> {
        let authority = self.authority();
        let Some(sock) = self.sock.as_mut() else {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection has no transport",
            ));
        };
        write_request(sock, method, path, &authority, headers, body).map_err(no_response)?;
        read_response(sock, method)
    }

    pub fn close(&mut self) {
        if self.sock.take().is_some() {
            tracing::debug!("Closed connection to {}", self.id);
        }
    }

    fn authority(&self) -> String {
        let default_port = match self.id.scheme.as_str() {
            "https" => 443,
            _ => 80,
        };
        let host = if self.id.host.contains(':') {
            format!("[{}]", self.id.host)
        } else {
            self.id.host.clone()
        };
        if self.id.port == default_port {
            host
        } else {
            format!("{}:{}", host, self.id.port)
        }
    }
}

impl fmt::Debug for HttpConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpConnection")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("timeout", &self.timeout)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}
