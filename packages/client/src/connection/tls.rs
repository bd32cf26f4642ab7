//! Verified TLS on top of a proxied transport

use std::io;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, StreamOwned};

use super::establish::{EstablishTransport, ProxiedEstablisher};
use crate::config::TlsConfig;
use crate::connect::{ConnectionId, ConnectionRequest, Stream, Transport};
use crate::error::{self, Result};
use crate::tls::{TlsError, TlsManager};

/// Verifies the server over an already-open transport and wraps it.
///
/// The handshake completes before the wrapped stream is returned, so
/// certificate problems surface at connect time rather than on first write.
#[derive(Debug, Clone)]
pub struct TlsWrapper {
    config: Arc<ClientConfig>,
    assert_hostname: Option<String>,
}

impl TlsWrapper {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            config,
            assert_hostname: None,
        }
    }

    pub fn from_config(tls: &TlsConfig) -> std::result::Result<Self, TlsError> {
        Ok(Self {
            config: TlsManager::client_config(tls)?,
            assert_hostname: tls.assert_hostname.clone(),
        })
    }

    #[must_use]
    pub fn with_assert_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.assert_hostname = Some(hostname.into());
        self
    }

    pub fn verify_and_wrap(
        &self,
        mut raw: Transport,
        host: &str,
    ) -> std::result::Result<Transport, TlsError> {
        let name = self.assert_hostname.as_deref().unwrap_or(host);
        let server_name = ServerName::try_from(name.to_string())
            .map_err(|e| TlsError::InvalidServerName(format!("{name}: {e}")))?;

        let mut conn = ClientConnection::new(self.config.clone(), server_name)?;
        while conn.is_handshaking() {
            conn.complete_io(&mut raw).map_err(TlsError::Handshake)?;
        }

        tracing::debug!(
            "TLS session established with {} ({:?})",
            name,
            conn.protocol_version()
        );

        Ok(Box::new(StreamOwned::new(conn, raw)))
    }
}

impl Stream for StreamOwned<ClientConnection, Transport> {
    fn set_io_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.sock.set_io_timeout(timeout)
    }
}

/// Proxied establishment followed by TLS verification.
#[derive(Debug, Clone)]
pub struct VerifiedEstablisher {
    proxied: ProxiedEstablisher,
    wrapper: TlsWrapper,
}

impl VerifiedEstablisher {
    pub fn new(proxied: ProxiedEstablisher, wrapper: TlsWrapper) -> Self {
        Self { proxied, wrapper }
    }
}

impl EstablishTransport for VerifiedEstablisher {
    fn establish(&self, request: &ConnectionRequest) -> Result<Transport> {
        let raw = self.proxied.establish(request)?;
        self.wrapper.verify_and_wrap(raw, &request.host).map_err(|e| {
            error::tls(e).with_connection(ConnectionId::new(
                self.proxied.scheme(),
                request.host.clone(),
                request.port,
            ))
        })
    }
}
