//! Server certificate verifier with optional chain validation and pinning

use std::sync::Arc;

use rustls::client::WebPkiServerVerifier;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};

use super::fingerprint::Fingerprint;

/// Runs the standard webpki verification (when enabled) and then checks the
/// leaf certificate against a pinned fingerprint (when configured).
#[derive(Debug)]
pub struct PinnedVerifier {
    inner: Option<Arc<WebPkiServerVerifier>>,
    fingerprint: Option<Fingerprint>,
    provider: Arc<CryptoProvider>,
}

impl PinnedVerifier {
    pub fn new(
        inner: Option<Arc<WebPkiServerVerifier>>,
        fingerprint: Option<Fingerprint>,
        provider: Arc<CryptoProvider>,
    ) -> Self {
        Self {
            inner,
            fingerprint,
            provider,
        }
    }
}

impl ServerCertVerifier for PinnedVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if let Some(inner) = &self.inner {
            inner.verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)?;
        }

        if let Some(fingerprint) = &self.fingerprint
            && !fingerprint.matches(end_entity.as_ref())
        {
            return Err(rustls::Error::General(format!(
                "Fingerprints did not match. Expected \"{}\", got \"{}\".",
                fingerprint,
                hex::encode(fingerprint.digest_of(end_entity.as_ref()))
            )));
        }

        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
