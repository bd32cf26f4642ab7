//! Certificate fingerprint pinning
//!
//! Fingerprints are hex digests of the DER-encoded leaf certificate,
//! optionally separated by colons. The digest length selects the algorithm.

use std::fmt;

use ring::digest;

use super::errors::TlsError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerprintAlgorithm {
    Sha1,
    Sha256,
}

impl FingerprintAlgorithm {
    fn digest_algorithm(self) -> &'static digest::Algorithm {
        match self {
            FingerprintAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            FingerprintAlgorithm::Sha256 => &digest::SHA256,
        }
    }
}

/// Expected digest of the server's leaf certificate.
#[derive(Clone, PartialEq, Eq)]
pub struct Fingerprint {
    algorithm: FingerprintAlgorithm,
    digest: Vec<u8>,
}

impl Fingerprint {
    /// Parse a hex fingerprint such as `AB:CD:...` or `abcd...`.
    pub fn parse(fingerprint: &str) -> Result<Self, TlsError> {
        let cleaned: String = fingerprint
            .chars()
            .filter(|c| *c != ':')
            .collect::<String>()
            .to_ascii_lowercase();

        let digest = hex::decode(&cleaned)
            .map_err(|_| TlsError::InvalidFingerprint(fingerprint.to_string()))?;

        let algorithm = match digest.len() {
            20 => FingerprintAlgorithm::Sha1,
            32 => FingerprintAlgorithm::Sha256,
            _ => return Err(TlsError::InvalidFingerprint(fingerprint.to_string())),
        };

        Ok(Self { algorithm, digest })
    }

    #[must_use]
    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    /// Digest of `cert_der` with this fingerprint's algorithm.
    #[must_use]
    pub fn digest_of(&self, cert_der: &[u8]) -> Vec<u8> {
        digest::digest(self.algorithm.digest_algorithm(), cert_der)
            .as_ref()
            .to_vec()
    }

    #[must_use]
    pub fn matches(&self, cert_der: &[u8]) -> bool {
        self.digest_of(cert_der) == self.digest
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprint")
            .field("algorithm", &self.algorithm)
            .field("digest", &hex::encode(&self.digest))
            .finish()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERT: &[u8] = b"not really DER, but digests do not care";

    #[test]
    fn sha256_fingerprint_with_colons() {
        let hex = hex::encode(digest::digest(&digest::SHA256, CERT));
        let with_colons = hex
            .as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).expect("hex is ascii").to_ascii_uppercase())
            .collect::<Vec<_>>()
            .join(":");

        let fingerprint = Fingerprint::parse(&with_colons).expect("valid fingerprint");
        assert_eq!(fingerprint.algorithm(), FingerprintAlgorithm::Sha256);
        assert!(fingerprint.matches(CERT));
        assert!(!fingerprint.matches(b"another certificate"));
    }

    #[test]
    fn sha1_fingerprint() {
        let hex = hex::encode(digest::digest(&digest::SHA1_FOR_LEGACY_USE_ONLY, CERT));
        let fingerprint = Fingerprint::parse(&hex).expect("valid fingerprint");
        assert_eq!(fingerprint.algorithm(), FingerprintAlgorithm::Sha1);
        assert!(fingerprint.matches(CERT));
    }

    #[test]
    fn invalid_lengths_are_rejected() {
        // 16 bytes: an MD5-sized digest, not accepted
        assert!(Fingerprint::parse("00112233445566778899aabbccddeeff").is_err());
        assert!(Fingerprint::parse("abc").is_err());
        assert!(Fingerprint::parse("zz").is_err());
    }
}
