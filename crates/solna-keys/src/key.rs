#![forbid(unsafe_code)]

//! Credential types.

use crate::x509;
use der::Decode;
use pem_rfc7468::LineEnding;
use pkcs8::DecodePrivateKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use solna_core::Error;
use zeroize::Zeroizing;

/// The decoded private key.
pub enum KeyData {
    Rsa {
        private: Option<RsaPrivateKey>,
        public: RsaPublicKey,
    },
    /// A key of an algorithm this crate does not sign with (named by OID or common name).
    Unsupported { algorithm: String },
}

impl std::fmt::Debug for KeyData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Rsa { private, .. } => {
                if private.is_some() {
                    write!(f, "RSA private+public key")
                } else {
                    write!(f, "RSA public key")
                }
            }
            Self::Unsupported { algorithm } => write!(f, "unsupported {algorithm} key"),
        }
    }
}

/// Private key plus certificate chain (DER, leaf first).
///
/// Immutable once built.  Share it between concurrent requests behind an
/// `Arc`.
pub struct Credential {
    private_key_der: Option<Zeroizing<Vec<u8>>>,
    key: Option<KeyData>,
    chain: Vec<Vec<u8>>,
}

impl Credential {
    /// Build a credential from PKCS#8 private key DER and a certificate chain.
    ///
    /// The leaf certificate must carry the public half of an RSA key.
    pub fn from_pkcs8_der(private_key_der: Zeroizing<Vec<u8>>, chain: Vec<Vec<u8>>) -> Result<Self, Error> {
        if chain.is_empty() {
            return Err(Error::Credential("no certificate found".into()));
        }
        let key = decode_pkcs8(&private_key_der)?;
        if let KeyData::Rsa { public, .. } = &key {
            let leaf_public = x509::rsa_public_key(&chain[0])
                .map_err(|e| Error::Credential(format!("leaf certificate: {e}")))?;
            if &leaf_public != public {
                return Err(Error::Credential(
                    "leaf certificate does not match the private key".into(),
                ));
            }
        }
        Ok(Self {
            private_key_der: Some(private_key_der),
            key: Some(key),
            chain,
        })
    }

    /// Build a credential from an in-memory RSA key.
    pub fn from_rsa(private: RsaPrivateKey, chain: Vec<Vec<u8>>) -> Result<Self, Error> {
        use pkcs8::EncodePrivateKey;
        let der = private
            .to_pkcs8_der()
            .map_err(|e| Error::Credential(format!("failed to encode private key: {e}")))?;
        Self::from_pkcs8_der(Zeroizing::new(der.as_bytes().to_vec()), chain)
    }

    /// A credential that holds certificates but no private key.
    pub fn certificate_only(chain: Vec<Vec<u8>>) -> Self {
        Self {
            private_key_der: None,
            key: None,
            chain,
        }
    }

    pub fn key(&self) -> Option<&KeyData> {
        self.key.as_ref()
    }

    /// The RSA private key used for XML signing.
    pub fn rsa_private_key(&self) -> Result<&RsaPrivateKey, Error> {
        match &self.key {
            Some(KeyData::Rsa {
                private: Some(private),
                ..
            }) => Ok(private),
            Some(KeyData::Rsa { private: None, .. }) | None => {
                Err(Error::Signing("credential holds no private key".into()))
            }
            Some(KeyData::Unsupported { algorithm }) => Err(Error::Signing(format!(
                "credential key is {algorithm}, RSA required"
            ))),
        }
    }

    /// Certificate chain as DER, leaf first.
    pub fn chain(&self) -> &[Vec<u8>] {
        &self.chain
    }

    /// The leaf certificate (DER).
    pub fn leaf_certificate(&self) -> Result<&[u8], Error> {
        self.chain
            .first()
            .map(Vec::as_slice)
            .ok_or_else(|| Error::Credential("no certificate found".into()))
    }

    /// Key and chain re-encoded as one PEM document (`PRIVATE KEY` then
    /// each `CERTIFICATE`), the form TLS client identities are built from.
    pub fn tls_identity_pem(&self) -> Result<Zeroizing<String>, Error> {
        let key_der = self
            .private_key_der
            .as_ref()
            .ok_or_else(|| Error::Credential("credential holds no private key".into()))?;
        let mut out = Zeroizing::new(
            pem_rfc7468::encode_string("PRIVATE KEY", LineEnding::LF, key_der)
                .map_err(|e| Error::Credential(format!("PEM encoding failed: {e}")))?,
        );
        for cert in &self.chain {
            let pem = pem_rfc7468::encode_string("CERTIFICATE", LineEnding::LF, cert)
                .map_err(|e| Error::Credential(format!("PEM encoding failed: {e}")))?;
            out.push_str(&pem);
        }
        Ok(out)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("key", &self.key)
            .field("certificates", &self.chain.len())
            .finish()
    }
}

fn decode_pkcs8(der: &[u8]) -> Result<KeyData, Error> {
    if let Ok(private) = RsaPrivateKey::from_pkcs8_der(der) {
        let public = private.to_public_key();
        return Ok(KeyData::Rsa {
            private: Some(private),
            public,
        });
    }
    let info = pkcs8::PrivateKeyInfo::from_der(der)
        .map_err(|e| Error::Credential(format!("unable to parse PKCS#8 private key: {e}")))?;
    let algorithm = match info.algorithm.oid.to_string().as_str() {
        "1.2.840.113549.1.1.1" => {
            return Err(Error::Credential("malformed RSA private key".into()));
        }
        "1.2.840.10045.2.1" => "EC".to_owned(),
        "1.3.101.112" => "Ed25519".to_owned(),
        "1.2.840.10040.4.1" => "DSA".to_owned(),
        oid => oid.to_owned(),
    };
    Ok(KeyData::Unsupported { algorithm })
}
