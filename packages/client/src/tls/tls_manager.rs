//! rustls client configuration for verifying `https` pools

use std::fs::File;
use std::io::BufReader;
use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::{ClientConfig, RootCertStore};

use super::errors::TlsError;
use super::fingerprint::Fingerprint;
use super::verifier::PinnedVerifier;
use crate::config::{CertReqs, TlsConfig};

/// Builds client configurations; stateless, every pool asks once at creation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TlsManager;

impl TlsManager {
    /// The crypto provider every configuration is built with.
    #[must_use]
    pub fn provider() -> Arc<CryptoProvider> {
        Arc::new(rustls::crypto::ring::default_provider())
    }

    /// Whether a client configuration can be built in this process.
    #[must_use]
    pub fn probe() -> bool {
        match ClientConfig::builder_with_provider(Self::provider())
            .with_safe_default_protocol_versions()
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("TLS provider unusable: {}", e);
                false
            }
        }
    }

    /// Trust anchors: bundled webpki roots, optionally the platform store,
    /// plus any PEM bundle named by `ca_certs`.
    pub fn root_store(config: &TlsConfig) -> Result<RootCertStore, TlsError> {
        let mut root_store = RootCertStore::empty();
        root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

        if config.use_native_certs {
            let cert_result = rustls_native_certs::load_native_certs();
            for cert in cert_result.certs {
                if let Err(e) = root_store.add(cert) {
                    tracing::warn!("Failed to add system certificate: {}", e);
                }
            }
            for err in &cert_result.errors {
                tracing::warn!("Certificate load error: {}", err);
            }
        }

        if let Some(path) = &config.ca_certs {
            let ca_error = |source| TlsError::CaCerts {
                path: path.clone(),
                source,
            };
            let file = File::open(path).map_err(ca_error)?;
            let mut reader = BufReader::new(file);
            for cert in rustls_pemfile::certs(&mut reader) {
                root_store.add(cert.map_err(ca_error)?)?;
            }
        }

        tracing::debug!("TLS root store holds {} trust anchors", root_store.len());
        Ok(root_store)
    }

    /// Client configuration honouring `cert_reqs` and `assert_fingerprint`.
    pub fn client_config(config: &TlsConfig) -> Result<Arc<ClientConfig>, TlsError> {
        let provider = Self::provider();
        let fingerprint = config
            .assert_fingerprint
            .as_deref()
            .map(Fingerprint::parse)
            .transpose()?;

        let builder = ClientConfig::builder_with_provider(provider.clone())
            .with_safe_default_protocol_versions()?;

        let client_config = match (config.cert_reqs, fingerprint) {
            (CertReqs::Required, None) => builder
                .with_root_certificates(Self::root_store(config)?)
                .with_no_client_auth(),
            (cert_reqs, fingerprint) => {
                let inner = match cert_reqs {
                    CertReqs::Required => Some(
                        WebPkiServerVerifier::builder_with_provider(
                            Arc::new(Self::root_store(config)?),
                            provider.clone(),
                        )
                        .build()?,
                    ),
                    CertReqs::None => {
                        tracing::warn!("Certificate chain verification disabled by configuration");
                        None
                    }
                };
                builder
                    .dangerous()
                    .with_custom_certificate_verifier(Arc::new(PinnedVerifier::new(
                        inner,
                        fingerprint,
                        provider,
                    )))
                    .with_no_client_auth()
            }
        };

        Ok(Arc::new(client_config))
    }
}
