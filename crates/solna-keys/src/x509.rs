#![forbid(unsafe_code)]

//! Leaf certificate inspection.

use der::{Decode, Encode};
use rsa::RsaPublicKey;
use solna_core::Error;
use std::time::SystemTime;
use x509_cert::Certificate;

/// What is worth knowing about a signing certificate at load time.
#[derive(Debug, Clone)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub not_before: SystemTime,
    pub not_after: SystemTime,
}

impl CertificateSummary {
    pub fn is_valid_at(&self, when: SystemTime) -> bool {
        self.not_before <= when && when <= self.not_after
    }
}

fn parse(der: &[u8]) -> Result<Certificate, Error> {
    Certificate::from_der(der)
        .map_err(|e| Error::Certificate(format!("failed to parse X.509 certificate: {e}")))
}

/// Subject, issuer and validity window of a DER certificate.
pub fn summarize(der: &[u8]) -> Result<CertificateSummary, Error> {
    let cert = parse(der)?;
    let tbs = &cert.tbs_certificate;
    Ok(CertificateSummary {
        subject: tbs.subject.to_string(),
        issuer: tbs.issuer.to_string(),
        not_before: tbs.validity.not_before.to_system_time(),
        not_after: tbs.validity.not_after.to_system_time(),
    })
}

/// The RSA public key carried by a DER certificate.
pub fn rsa_public_key(der: &[u8]) -> Result<RsaPublicKey, Error> {
    use spki::DecodePublicKey;

    let cert = parse(der)?;
    let spki_der = cert
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| Error::Certificate(format!("failed to encode SPKI: {e}")))?;
    RsaPublicKey::from_public_key_der(&spki_der)
        .map_err(|e| Error::Certificate(format!("certificate key is not RSA: {e}")))
}
