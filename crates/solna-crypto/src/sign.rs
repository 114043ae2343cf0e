#![forbid(unsafe_code)]

//! Signature algorithms.

use rsa::{RsaPrivateKey, RsaPublicKey};
use signature::SignatureEncoding;
use solna_core::{algorithm, Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMethod {
    /// RSA PKCS#1 v1.5 with SHA-256.
    RsaSha256,
}

impl SignatureMethod {
    pub fn from_uri(uri: &str) -> Result<Self, Error> {
        match uri {
            algorithm::RSA_SHA256 => Ok(Self::RsaSha256),
            _ => Err(Error::UnsupportedAlgorithm(format!("signature algorithm: {uri}"))),
        }
    }

    pub fn uri(self) -> &'static str {
        match self {
            Self::RsaSha256 => algorithm::RSA_SHA256,
        }
    }

    /// Sign `data` (hashing it first) with the private key.
    pub fn sign(self, key: &RsaPrivateKey, data: &[u8]) -> Result<Vec<u8>, Error> {
        use signature::Signer;
        match self {
            Self::RsaSha256 => {
                let sk = rsa::pkcs1v15::SigningKey::<sha2::Sha256>::new(key.clone());
                let sig = sk
                    .try_sign(data)
                    .map_err(|e| Error::Crypto(format!("RSA signing failed: {e}")))?;
                Ok(sig.to_vec())
            }
        }
    }

    /// Check `sig_bytes` over `data`.  A well-formed signature that does not
    /// match is `Ok(false)`.
    pub fn verify(self, key: &RsaPublicKey, data: &[u8], sig_bytes: &[u8]) -> Result<bool, Error> {
        use signature::Verifier;
        match self {
            Self::RsaSha256 => {
                let sig = rsa::pkcs1v15::Signature::try_from(sig_bytes)
                    .map_err(|e| Error::Crypto(format!("invalid RSA signature: {e}")))?;
                let vk = rsa::pkcs1v15::VerifyingKey::<sha2::Sha256>::new(key.clone());
                Ok(vk.verify(data, &sig).is_ok())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rsa::pkcs8::DecodePrivateKey;

    fn test_key() -> RsaPrivateKey {
        let pem = include_str!("../../../test-data/keys/rsa-2048-key.pem");
        RsaPrivateKey::from_pkcs8_pem(pem).unwrap()
    }

    #[test]
    fn test_rsa_sha256_sign_verify() {
        let key = test_key();
        let method = SignatureMethod::from_uri(algorithm::RSA_SHA256).unwrap();
        let sig = method.sign(&key, b"<ds:SignedInfo/>").unwrap();
        assert_eq!(sig.len(), 256);

        let public = key.to_public_key();
        assert!(method.verify(&public, b"<ds:SignedInfo/>", &sig).unwrap());
        assert!(!method.verify(&public, b"<ds:SignedInfo />", &sig).unwrap());
    }

    #[test]
    fn test_rsa_pkcs1v15_is_deterministic() {
        let key = test_key();
        let a = SignatureMethod::RsaSha256.sign(&key, b"data").unwrap();
        let b = SignatureMethod::RsaSha256.sign(&key, b"data").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unsupported_signature_uri() {
        let err = SignatureMethod::from_uri("http://www.w3.org/2000/09/xmldsig#rsa-sha1").unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(_)));
    }
}
