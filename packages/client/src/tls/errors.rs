//! TLS-specific error types for detailed error handling

use std::io;
use std::path::PathBuf;

/// TLS-specific error types for detailed error handling
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("Invalid server name {0}")]
    InvalidServerName(String),
    #[error("Failed to load CA certificates from {}: {source}", path.display())]
    CaCerts {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Fingerprint is of invalid length: {0}")]
    InvalidFingerprint(String),
    #[error("TLS configuration failed: {0}")]
    Config(#[from] rustls::Error),
    #[error("Failed to create certificate verifier: {0}")]
    Verifier(#[from] rustls::client::VerifierBuilderError),
    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] io::Error),
}
