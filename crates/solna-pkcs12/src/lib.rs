#![forbid(unsafe_code)]

//! PKCS#12 (.p12/.pfx) reader for merchant signing credentials.
//!
//! Reads the containers OpenSSL 3.x writes by default: PBES2 (PBKDF2 +
//! AES-CBC) for the certificate safe and the shrouded key bag, with an
//! HMAC-SHA256 integrity MAC.  Legacy containers (SHA-1 MAC, 3DES or RC2
//! encryption, `openssl pkcs12 -legacy`) are rejected as unsupported.
//! Input must be DER; indefinite-length BER is not accepted.

mod kdf;
mod parse;

use zeroize::Zeroizing;

/// Contents extracted from a PKCS#12 file.
pub struct Pkcs12Contents {
    /// PKCS#8 DER-encoded private keys.
    pub private_keys: Vec<Zeroizing<Vec<u8>>>,
    /// DER-encoded X.509 certificates, in container order.
    pub certificates: Vec<Vec<u8>>,
}

impl std::fmt::Debug for Pkcs12Contents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pkcs12Contents")
            .field("private_keys", &self.private_keys.len())
            .field("certificates", &self.certificates.len())
            .finish()
    }
}

/// Parse a PKCS#12 file, verifying its MAC and decrypting with `password`.
pub fn parse_pkcs12(data: &[u8], password: &str) -> Result<Pkcs12Contents, solna_core::Error> {
    parse::parse_pfx(data, password)
}

/// Whether `data` looks like a DER PKCS#12 PFX rather than PEM text.
pub fn looks_like_pkcs12(data: &[u8]) -> bool {
    data.first() == Some(&0x30) && data.get(1).is_some_and(|&len| len >= 0x80)
}
