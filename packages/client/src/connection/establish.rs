//! The transport-establishment seam shared by every connection kind

use std::sync::Arc;

use crate::connect::{
    ConnectionId, ConnectionRequest, Dial, ProxyOptions, Transport, translate_dial_error,
};
use crate::error::{self, Result};

/// Produces the transport for a single connection attempt.
pub trait EstablishTransport: Send + Sync {
    fn establish(&self, request: &ConnectionRequest) -> Result<Transport>;
}

/// Opens the transport by dialing through the configured SOCKS proxy.
///
/// Each call performs exactly one dial. Socket-level failures are reported as
/// `ConnectTimeout` or `NewConnection`, anything else as it was raised.
#[derive(Clone)]
pub struct ProxiedEstablisher {
    scheme: String,
    dialer: Arc<dyn Dial>,
    options: Arc<ProxyOptions>,
}

impl ProxiedEstablisher {
    pub fn new(
        scheme: impl Into<String>,
        dialer: Arc<dyn Dial>,
        options: Arc<ProxyOptions>,
    ) -> Self {
        Self {
            scheme: scheme.into(),
            dialer,
            options,
        }
    }

    pub fn options(&self) -> &Arc<ProxyOptions> {
        &self.options
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }
}

impl std::fmt::Debug for ProxiedEstablisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxiedEstablisher")
            .field("scheme", &self.scheme)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl EstablishTransport for ProxiedEstablisher {
    fn establish(&self, request: &ConnectionRequest) -> Result<Transport> {
        let connection = ConnectionId::new(self.scheme.clone(), request.host.clone(), request.port);

        if request.host.is_empty() || request.port == 0 {
            return Err(error::location_value().with_connection(connection));
        }

        tracing::debug!(
            "Dialing {} via {} {}",
            connection,
            self.options.socks_version.scheme(),
            self.options.authority()
        );

        self.dialer
            .dial(request, &self.options)
            .map_err(|e| translate_dial_error(e, connection, request.timeout))
    }
}
